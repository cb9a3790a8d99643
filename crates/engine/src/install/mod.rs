// Pure workspace transformations behind preview, install and rollback.
//
// Each function dispatches on `Category::kind()` with one handler per kind.
// None of them touch the store; the service commits their result.

pub mod apply;
pub mod collision;
pub mod rollback;

pub use apply::apply_template;
pub use collision::preview_collisions;
pub use rollback::{revert, OrderedRollback};
