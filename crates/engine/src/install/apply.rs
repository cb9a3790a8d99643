use vaultkit_common::category::{Category, CategoryKind};
use vaultkit_common::install::{AppendedEntry, CreatedItems};
use vaultkit_common::template::TemplateSpec;
use vaultkit_common::types::ItemId;
use vaultkit_common::workspace::{OrderedEntry, WorkspaceState};

/// Merge `template` into `state` and return what was added.
///
/// The caller owns `state`; nothing is persisted here.
pub fn apply_template(state: &mut WorkspaceState, template: &TemplateSpec) -> CreatedItems {
    let mut created = CreatedItems::default();
    for category in Category::ALL {
        match category.kind() {
            CategoryKind::SetMembership => insert_missing(state, template, category, &mut created),
            CategoryKind::OrderedAppend => append_all(state, template, category, &mut created),
            CategoryKind::HintMerge => merge_hints(state, template, category),
        }
    }
    created
}

fn insert_missing(
    state: &mut WorkspaceState,
    template: &TemplateSpec,
    category: Category,
    created: &mut CreatedItems,
) {
    let (Some(present), Some(recorded)) = (state.keys_mut(category), created.keys_mut(category))
    else {
        return;
    };
    for key in template.keys(category) {
        if present.insert(key.clone()) {
            recorded.push(key.clone());
        }
    }
}

fn append_all(
    state: &mut WorkspaceState,
    template: &TemplateSpec,
    category: Category,
    created: &mut CreatedItems,
) {
    let (Some(entries), Some(recorded)) = (state.entries_mut(category), created.appended_mut(category))
    else {
        return;
    };
    for body in template.values(category) {
        let id = ItemId::new();
        entries.push(OrderedEntry { id, body: body.clone() });
        recorded.push(AppendedEntry { id, position: entries.len() - 1 });
    }
}

fn merge_hints(state: &mut WorkspaceState, template: &TemplateSpec, category: Category) {
    if let Some(hints) = state.keys_mut(category) {
        hints.extend(template.keys(category).iter().cloned());
    }
}
