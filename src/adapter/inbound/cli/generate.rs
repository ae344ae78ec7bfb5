//! `sectiond generate`: run the grouping pipeline once and print the result.

use rust_decimal::Decimal;
use tabled::Tabled;

use super::command::GenerateArgs;
use super::{output, session};
use crate::application::grouping::{GenerationOptions, GroupingResult};
use crate::domain::{EnhancedScreen, Section};
use crate::error::Result;

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Section")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Screens")]
    screens: usize,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl SectionRow {
    fn new(rank: usize, section: &Section) -> Self {
        Self {
            rank,
            id: section.id.to_string(),
            title: section.title.clone(),
            algorithm: section.metadata.algorithm.to_string(),
            screens: section.len(),
            confidence: format!("{:.2}", section.metadata.confidence),
        }
    }
}

#[derive(Tabled)]
struct ScreenRow {
    #[tabled(rename = "Screen")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Price")]
    price: Decimal,
    #[tabled(rename = "Category")]
    category: String,
}

impl From<&EnhancedScreen> for ScreenRow {
    fn from(screen: &EnhancedScreen) -> Self {
        Self {
            id: screen.id.to_string(),
            name: screen.name.clone(),
            location: screen.location.clone(),
            price: screen.price,
            category: screen.category.clone(),
        }
    }
}

pub async fn execute(args: &GenerateArgs, verbose: u8) -> Result<()> {
    let (_, components) = session::start(&args.request, verbose)?;
    let engine = components.engine;

    let options = GenerationOptions {
        user_id: session::user_id(&args.request),
        location: args.request.location.clone(),
        max_sections: args.max_sections,
        force_refresh: args.force_refresh,
    };
    let result = engine.generate_sections(options).await;
    engine.shutdown().await;
    let result = result?;

    if output::is_json() {
        return output::json(&result);
    }
    render(&result, args);
    Ok(())
}

fn render(result: &GroupingResult, args: &GenerateArgs) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Request");
    output::field(
        "User",
        args.request.user.as_deref().unwrap_or("anonymous"),
    );
    output::field(
        "Location",
        args.request.location.as_deref().unwrap_or("any"),
    );
    output::field("Request id", output::muted(result.analytics.request_id));

    output::section("Sections");
    if result.sections.is_empty() {
        output::warning("No sections could be generated");
    } else {
        output::table(
            result
                .sections
                .iter()
                .enumerate()
                .map(|(i, s)| SectionRow::new(i + 1, s)),
        );
    }

    if args.screens {
        for section in &result.sections {
            output::section(&format!("{} ({})", section.title, output::highlight(&section.id)));
            output::table(section.screens.iter().map(ScreenRow::from));
        }
    }

    let analytics = &result.analytics;
    output::section("Summary");
    output::field("Screens", result.total_screens());
    output::field("Duplicates", analytics.duplicates_removed);
    output::field("Reassigned", analytics.screens_reassigned);
    output::field("Backfilled", analytics.backfills_applied);
    output::field("Confidence", format!("{:.2}", analytics.average_confidence));
    output::field("Elapsed", format!("{} ms", result.processing_time_ms));
    output::field("Cache hit", result.cache_hit);

    if result.fallback_used {
        output::warning("Some sections were served from fallbacks");
    }
    for error in &result.errors {
        output::warning(error);
    }
}
