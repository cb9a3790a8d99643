// Per-workspace mutual exclusion for mutating operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vaultkit_common::types::WorkspaceId;

/// Registry size above which idle entries are pruned on the next lookup.
const PRUNE_THRESHOLD: usize = 1024;

/// Hands out one mutex per workspace id.
#[derive(Debug, Default)]
pub struct WorkspaceLocks {
    locks: Mutex<HashMap<WorkspaceId, Arc<Mutex<()>>>>,
}

impl WorkspaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle for `workspace_id`; lock it with [`lock_workspace`].
    pub fn handle(&self, workspace_id: &WorkspaceId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(workspace_id.clone()).or_default())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquire a workspace guard.
///
/// The guarded data is `()`, so a panic in an earlier holder cannot leave
/// anything half-written behind the lock; poisoning is ignored.
pub fn lock_workspace(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    fn id(raw: &str) -> WorkspaceId {
        WorkspaceId::parse(raw).expect("valid id")
    }

    #[test]
    fn same_workspace_shares_one_mutex() {
        let locks = WorkspaceLocks::new();
        let a = locks.handle(&id("org-a"));
        let b = locks.handle(&id("org-a"));
        let c = locks.handle(&id("org-c"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn guard_serializes_critical_sections() {
        let locks = Arc::new(WorkspaceLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let handle = locks.handle(&id("org-shared"));
                        let _guard = lock_workspace(&handle);
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker thread");
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poisoned_guard_is_recovered() {
        let locks = Arc::new(WorkspaceLocks::new());
        let handle = locks.handle(&id("org-poison"));
        let poisoner = Arc::clone(&handle);
        let _ = thread::spawn(move || {
            let _guard = lock_workspace(&poisoner);
            panic!("holder panicked");
        })
        .join();

        assert!(handle.is_poisoned());
        let _guard = lock_workspace(&handle);
    }

    #[test]
    fn idle_entries_are_pruned_past_threshold() {
        let locks = WorkspaceLocks::new();
        let held = locks.handle(&id("org-held"));
        for index in 0..=PRUNE_THRESHOLD {
            drop(locks.handle(&id(&format!("org-{index}"))));
        }
        drop(locks.handle(&id("org-trigger")));
        assert!(locks.len() < PRUNE_THRESHOLD);
        assert!(Arc::ptr_eq(&held, &locks.handle(&id("org-held"))));
    }
}
