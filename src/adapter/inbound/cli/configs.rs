//! `sectiond configs`: show the section configs a request resolves to.

use serde::Serialize;
use tabled::Tabled;

use super::command::ConfigsArgs;
use super::{output, session};
use crate::domain::{SectionConfig, UserProfile};
use crate::error::Result;

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Section")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Priority")]
    priority: i32,
    #[tabled(rename = "Screens")]
    bounds: String,
    #[tabled(rename = "Display")]
    display: String,
    #[tabled(rename = "Eligible")]
    eligible: &'static str,
}

impl ConfigRow {
    fn new(config: &SectionConfig, profile: &UserProfile) -> Self {
        Self {
            id: config.id.to_string(),
            name: config.name.clone(),
            algorithm: config.algorithm.to_string(),
            priority: config.priority,
            bounds: format!("{}-{}", config.min_screens, config.max_screens),
            display: format!("{:?}", config.display.display_type).to_lowercase(),
            eligible: if config.conditions.is_satisfied_by(profile) {
                "yes"
            } else {
                "no"
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedConfig<'a> {
    #[serde(flatten)]
    config: &'a SectionConfig,
    eligible: bool,
}

pub async fn execute(args: &ConfigsArgs, verbose: u8) -> Result<()> {
    let (_, components) = session::start(&args.request, verbose)?;
    let manager = components.engine.sections();

    let user_id = session::user_id(&args.request);
    let location = args.request.location.as_deref();
    let configs = manager.get_section_configs(user_id.as_ref(), location).await;
    let profile = manager.user_profile(user_id.as_ref()).await;

    if output::is_json() {
        let resolved: Vec<ResolvedConfig<'_>> = configs
            .iter()
            .map(|config| ResolvedConfig {
                config,
                eligible: config.conditions.is_satisfied_by(&profile),
            })
            .collect();
        return output::json(&resolved);
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Resolved section configs");
    if configs.is_empty() {
        output::warning("No enabled section configs");
        return Ok(());
    }
    output::table(configs.iter().map(|c| ConfigRow::new(c, &profile)));
    output::note("Ineligible sections are skipped for this user during generation.");
    Ok(())
}
