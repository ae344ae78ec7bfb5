//! CLI module graph.

pub mod check;
pub mod command;
pub mod configs;
pub mod dispatch;
pub mod generate;
pub mod insights;
pub mod output;
pub mod session;
