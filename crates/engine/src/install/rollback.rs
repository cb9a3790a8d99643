use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use vaultkit_common::category::{Category, CategoryKind};
use vaultkit_common::install::{AppendedEntry, CreatedItems, PartialFlags, RevertedCounts};
use vaultkit_common::types::ItemId;
use vaultkit_common::workspace::WorkspaceState;

/// What rollback does with ordered entries an install appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderedRollback {
    /// Remove each recorded entry by its id.
    #[default]
    Remove,
    /// Leave entries in place and flag the category as partially reverted.
    Retain,
}

/// Undo `created` against `state`.
///
/// Set-membership keys are removed exactly; hints are never touched.
pub fn revert(
    state: &mut WorkspaceState,
    created: &CreatedItems,
    policy: OrderedRollback,
) -> (RevertedCounts, PartialFlags) {
    let mut reverted = RevertedCounts::default();
    let mut partial = PartialFlags::default();

    for category in Category::ALL {
        match category.kind() {
            CategoryKind::SetMembership => {
                let removed = remove_keys(state, created, category);
                if let Some(slot) = reverted.slot_mut(category) {
                    *slot = removed;
                }
            }
            CategoryKind::OrderedAppend => {
                let recorded = created.appended(category);
                let removed = match policy {
                    OrderedRollback::Remove => remove_entries(state, category, recorded),
                    OrderedRollback::Retain => 0,
                };
                if let Some(slot) = reverted.slot_mut(category) {
                    *slot = removed;
                }
                if let Some(flag) = partial.flag_mut(category) {
                    *flag = removed < recorded.len();
                }
            }
            CategoryKind::HintMerge => {}
        }
    }

    (reverted, partial)
}

fn remove_keys(state: &mut WorkspaceState, created: &CreatedItems, category: Category) -> usize {
    let Some(present) = state.keys_mut(category) else {
        return 0;
    };
    created.keys(category).iter().filter(|key| present.remove(key.as_str())).count()
}

fn remove_entries(
    state: &mut WorkspaceState,
    category: Category,
    recorded: &[AppendedEntry],
) -> usize {
    let Some(entries) = state.entries_mut(category) else {
        return 0;
    };
    let ids: HashSet<ItemId> = recorded.iter().map(|entry| entry.id).collect();
    let before = entries.len();
    entries.retain(|entry| !ids.contains(&entry.id));
    before - entries.len()
}
