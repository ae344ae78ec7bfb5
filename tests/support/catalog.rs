use std::path::PathBuf;

use section_grouping::domain::Screen;
use section_grouping::testkit::domain::raw_screens;

/// A catalog large enough that backfill never runs dry: 80 Bogotá screens
/// and 40 in Medellín.
pub fn large_catalog() -> Vec<Screen> {
    let mut screens = raw_screens("bog-", "Bogotá", 80);
    screens.extend(raw_screens("med-", "Medellín", 40));
    screens
}

/// Path of the sample catalog shipped with the crate.
pub fn sample_catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/screens.json")
}
