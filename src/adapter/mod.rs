//! Adapters connecting the application to the outside world.
//!
//! - [`inbound`] - The `sectiond` command line
//! - [`outbound`] - In-memory implementations of the collaborator ports

pub mod inbound;
pub mod outbound;
