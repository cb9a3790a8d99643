use std::collections::HashSet;

use vaultkit_common::category::{Category, CategoryKind};
use vaultkit_common::install::CollisionReport;
use vaultkit_common::template::TemplateSpec;
use vaultkit_common::workspace::WorkspaceState;

/// Template folders and labels already present in `state`, in template order.
///
/// Ordered categories are never reported: their entries are always new.
pub fn preview_collisions(state: &WorkspaceState, template: &TemplateSpec) -> CollisionReport {
    let mut report = CollisionReport::default();
    for category in Category::of_kind(CategoryKind::SetMembership) {
        let (Some(existing), Some(collisions)) = (state.keys(category), report.keys_mut(category))
        else {
            continue;
        };
        let mut seen = HashSet::new();
        collisions.extend(
            template
                .keys(category)
                .iter()
                .filter(|key| existing.contains(key.as_str()) && seen.insert(key.as_str()))
                .cloned(),
        );
    }
    report
}
