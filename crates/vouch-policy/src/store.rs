//! Atomically replaceable current policy.
//!
//! Reloading never mutates a policy in use: a new `Policy` is built in full
//! and swapped in, while callers holding the previous `Arc` finish with it.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::Policy;

/// Holder of the policy currently in force.
#[derive(Debug)]
pub struct PolicyStore {
    current: RwLock<Arc<Policy>>,
}

impl PolicyStore {
    /// Create a store with an initial policy.
    pub fn new(policy: Policy) -> Self {
        Self { current: RwLock::new(Arc::new(policy)) }
    }

    /// The policy in force right now.
    pub fn current(&self) -> Arc<Policy> {
        Arc::clone(&self.current.read())
    }

    /// Installs `policy`, returning the one it replaces.
    pub fn replace(&self, policy: Policy) -> Arc<Policy> {
        let policy = Arc::new(policy);
        info!(
            logs = policy.logs().len(),
            witnesses = policy.witnesses().len(),
            "installing new policy"
        );
        std::mem::replace(&mut *self.current.write(), policy)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn policy(text: &str) -> Policy {
        Policy::parse(text.as_bytes()).unwrap()
    }

    const LOG: &str = "log d04ab232742bb4ab3a1368bd4615e4e6d0224ab71a016baf8520a332c9778737\n";

    #[test]
    fn replace_swaps_and_returns_previous() {
        let store = PolicyStore::new(policy("quorum none\n"));
        let before = store.current();

        let previous = store.replace(policy(&format!("{LOG}quorum none\n")));

        assert!(Arc::ptr_eq(&before, &previous));
        assert!(before.logs().is_empty());
        assert_eq!(store.current().logs().len(), 1);
    }

    #[test]
    fn readers_see_a_whole_policy() {
        let store = Arc::new(PolicyStore::new(policy("quorum none\n")));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let current = store.current();
                        assert!(current.logs().len() <= 1);
                    }
                })
            })
            .collect();
        for _ in 0..10 {
            store.replace(policy(&format!("{LOG}quorum none\n")));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
