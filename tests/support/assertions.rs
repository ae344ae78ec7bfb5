use std::collections::HashSet;

use section_grouping::application::grouping::GroupingResult;
use section_grouping::domain::ScreenId;

/// Fail if any screen id appears in more than one place.
pub fn assert_no_duplicate_screens(result: &GroupingResult) {
    let mut seen: HashSet<&ScreenId> = HashSet::new();
    for section in &result.sections {
        for screen in &section.screens {
            assert!(
                seen.insert(&screen.id),
                "screen {} appears twice (second time in {})",
                screen.id,
                section.id
            );
        }
    }
}

/// Fail unless sections come back in non-increasing priority order.
pub fn assert_priority_order(result: &GroupingResult) {
    for pair in result.sections.windows(2) {
        assert!(
            pair[0].priority >= pair[1].priority,
            "{} (priority {}) listed before {} (priority {})",
            pair[0].id,
            pair[0].priority,
            pair[1].id,
            pair[1].priority
        );
    }
}

pub fn section_ids(result: &GroupingResult) -> Vec<String> {
    result.sections.iter().map(|s| s.id.to_string()).collect()
}
