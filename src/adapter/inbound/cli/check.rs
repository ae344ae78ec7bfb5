//! `sectiond check`: validate a configuration file.

use std::path::Path;

use serde::Serialize;

use super::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;

/// What a successful check found.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCheckReport {
    pub valid: bool,
    pub max_sections: usize,
    pub max_retries: u32,
    pub cache_items: usize,
    pub dynamic_sections: bool,
    pub catalog_path: Option<String>,
    pub catalog_screens: usize,
}

impl ConfigCheckReport {
    /// Validate `path` and load the catalog it names.
    pub fn build(path: &Path) -> Result<Self> {
        let config = Config::load(path)?;
        let catalog = bootstrap::load_catalog(&config)?;
        Ok(Self {
            valid: true,
            max_sections: config.grouping.max_sections,
            max_retries: config.recovery.max_retries,
            cache_items: config.cache.max_memory_items,
            dynamic_sections: config.grouping.dynamic_sections,
            catalog_path: config.catalog.path.map(|p| p.display().to_string()),
            catalog_screens: catalog.len(),
        })
    }
}

/// Validate configuration file without serving requests.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let report = ConfigCheckReport::build(path)?;

    if output::is_json() {
        return output::json(&report);
    }

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Max sections", report.max_sections);
    output::field("Max retries", report.max_retries);
    output::field("Cache items", report.cache_items);
    output::field("Dynamic rules", report.dynamic_sections);
    match &report.catalog_path {
        Some(catalog) => {
            output::field("Catalog", catalog);
            output::field("Screens", report.catalog_screens);
            if report.catalog_screens == 0 {
                output::warning("Catalog is empty; every section will be served from fallbacks");
            }
        }
        None => {
            output::warning("No catalog configured (set catalog.path or SECTIONS_CATALOG_PATH)");
        }
    }

    output::success("Configuration check complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_reflects_config_and_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("screens.json");
        let screens = r#"[{"id": "s1", "name": "Plaza", "location": "Cali", "price": 10,
            "category": "mall"}]"#;
        std::fs::write(&catalog, screens).unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[grouping]\nmax_sections = 4\n\n[catalog]\npath = {:?}\n",
                catalog.display().to_string()
            ),
        )
        .unwrap();

        let report = ConfigCheckReport::build(&config).unwrap();
        assert!(report.valid);
        assert_eq!(report.max_sections, 4);
        assert_eq!(report.catalog_screens, 1);
    }

    #[test]
    fn invalid_config_fails_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[grouping]\nmax_sections = 0\n").unwrap();
        assert!(ConfigCheckReport::build(&config).is_err());
    }
}
