//! `sectiond insights`: summarize the market for a location.

use super::command::InsightsArgs;
use super::{output, session};
use crate::error::Result;

pub async fn execute(args: &InsightsArgs, verbose: u8) -> Result<()> {
    let (_, components) = session::start(&args.request, verbose)?;
    let location = args
        .request
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    let insights = components.engine.market_insights(location).await;

    if output::is_json() {
        return output::json(&insights);
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Market insights");
    output::field("Location", location.unwrap_or("all"));
    if insights.total_screens == 0 {
        output::warning("No market data for this location");
        return Ok(());
    }
    output::field("Screens", insights.total_screens);
    output::field("Average price", insights.average_price);
    output::field("Average rating", format!("{:.2}", insights.average_rating));
    output::field("Top categories", insights.top_categories.join(", "));
    Ok(())
}
