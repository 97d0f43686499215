use async_trait::async_trait;
use lru::LruCache;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::traits::RoleChecker;

/// Remembers role-check answers per required-role set.
/// Failed checks are never stored so the next mount asks again.
pub struct CachingRoleChecker<C> {
    inner: C,
    answers: Mutex<LruCache<BTreeSet<String>, bool>>,
}

impl<C: RoleChecker> CachingRoleChecker<C> {
    pub fn new(inner: C, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        CachingRoleChecker {
            inner,
            answers: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Forget every answer, e.g. after the user's roles change
    pub async fn invalidate(&self) {
        self.answers.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.answers.lock().await.len()
    }
}

#[async_trait]
impl<C: RoleChecker> RoleChecker for CachingRoleChecker<C> {
    async fn has_any_role(&self, roles: &BTreeSet<String>) -> AppResult<bool> {
        if let Some(answer) = self.answers.lock().await.get(roles) {
            debug!("Role cache hit for {:?}", roles);
            return Ok(*answer);
        }

        let answer = self.inner.has_any_role(roles).await?;
        self.answers.lock().await.put(roles.clone(), answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakyChecker {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RoleChecker for FlakyChecker {
        async fn has_any_role(&self, roles: &BTreeSet<String>) -> AppResult<bool> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if roles.contains("auditor") && call == 0 {
                return Err(AppError::Transport("unreachable".to_string()));
            }
            Ok(roles.contains("admin"))
        }
    }

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_answers_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let checker = CachingRoleChecker::new(FlakyChecker { calls: calls.clone() }, 8);

        assert!(checker.has_any_role(&roles(&["admin"])).await.unwrap());
        assert!(checker.has_any_role(&roles(&["admin"])).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        checker.invalidate().await;
        assert!(checker.has_any_role(&roles(&["admin"])).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let checker = CachingRoleChecker::new(FlakyChecker { calls: calls.clone() }, 8);

        assert!(checker.has_any_role(&roles(&["auditor"])).await.is_err());
        assert_eq!(checker.len().await, 0);
        assert!(!checker.has_any_role(&roles(&["auditor"])).await.unwrap());
        assert_eq!(checker.len().await, 1);
    }

    #[tokio::test]
    async fn test_role_names_with_commas_do_not_collide() {
        struct ExactChecker;

        #[async_trait]
        impl RoleChecker for ExactChecker {
            async fn has_any_role(&self, roles: &BTreeSet<String>) -> AppResult<bool> {
                Ok(roles.contains("a,b"))
            }
        }

        let checker = CachingRoleChecker::new(ExactChecker, 8);
        assert!(checker.has_any_role(&roles(&["a,b"])).await.unwrap());
        assert!(!checker.has_any_role(&roles(&["a", "b"])).await.unwrap());
        assert_eq!(checker.len().await, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_works() {
        let calls = Arc::new(AtomicUsize::new(0));
        let checker = CachingRoleChecker::new(FlakyChecker { calls }, 0);
        assert!(checker.has_any_role(&roles(&["admin"])).await.unwrap());
    }
}
