//! Memoized phone number to contact name resolution.

use callhistory_rs_protocol::ContactDirectory;
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Phone number to contact name. `None` records a number known to have no contact.
pub type ContactCacheMap = HashMap<String, Option<String>>;

/// Append-only cache of directory lookups shared between views.
///
/// Readers get an immutable snapshot; each merge builds a new map from the
/// latest snapshot and swaps it in, so entries are never overwritten or evicted.
#[derive(Debug, Default)]
pub struct ContactCache {
    map: RwLock<Arc<ContactCacheMap>>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn snapshot(&self) -> Arc<ContactCacheMap> {
        self.map.read().clone()
    }

    /// Cached name for `number`, if one was resolved.
    pub fn name_for(&self, number: &str) -> Option<String> {
        self.map.read().get(number).cloned().flatten()
    }

    /// Look up every number not cached yet, once each, and merge the results.
    ///
    /// Failed lookups are logged and left out so a later batch retries them.
    pub async fn resolve<I, S>(
        &self,
        numbers: I,
        directory: &dyn ContactDirectory,
    ) -> Arc<ContactCacheMap>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let current = self.snapshot();
        let mut seen = HashSet::new();
        let missing: Vec<String> = numbers
            .into_iter()
            .map(|number| number.as_ref().to_string())
            .filter(|number| !current.contains_key(number) && seen.insert(number.clone()))
            .collect();
        if missing.is_empty() {
            return current;
        }

        let mut resolved = Vec::with_capacity(missing.len());
        for number in missing {
            match directory.lookup_by_number(&number).await {
                Ok(found) => resolved.push((number, found.map(|contact| contact.name))),
                Err(err) => warn!("contact lookup failed (number={number}, error={err})"),
            }
        }
        debug!("contact names resolved (count={})", resolved.len());
        self.merge(resolved)
    }

    fn merge(&self, resolved: Vec<(String, Option<String>)>) -> Arc<ContactCacheMap> {
        let mut guard = self.map.write();
        let mut next = ContactCacheMap::clone(&guard);
        for (number, name) in resolved {
            next.entry(number).or_insert(name);
        }
        let next = Arc::new(next);
        *guard = next.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::ContactCache;
    use callhistory_rs_test_utils::{StubDirectory, contact};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn duplicates_in_a_batch_are_looked_up_once() {
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        let cache = ContactCache::new();

        let map = cache
            .resolve(["555-0100", "555-0100", "444-0100"], &directory)
            .await;

        assert_eq!(directory.lookups(), vec!["555-0100", "444-0100"]);
        assert_eq!(map.get("555-0100"), Some(&Some("Alice".to_string())));
        assert_eq!(map.get("444-0100"), Some(&None));
    }

    #[tokio::test]
    async fn cached_numbers_are_never_looked_up_again() {
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        let cache = ContactCache::new();
        cache.resolve(["555-0100", "444-0100"], &directory).await;
        cache.resolve(["555-0100", "444-0100"], &directory).await;
        assert_eq!(directory.lookups().len(), 2);
        assert_eq!(cache.name_for("555-0100"), Some("Alice".to_string()));
        assert_eq!(cache.name_for("444-0100"), None);
    }

    #[tokio::test]
    async fn existing_entries_are_not_overwritten() {
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        let cache = ContactCache::new();
        cache.resolve(["555-0100"], &directory).await;

        directory.set_contacts(vec![contact(1, "Alicia", "555-0100")]);
        let map = cache.resolve(["555-0100", "777"], &directory).await;
        assert_eq!(map.get("555-0100"), Some(&Some("Alice".to_string())));
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn failed_lookups_are_retried_later() {
        let directory = StubDirectory::new(vec![contact(1, "Alice", "555-0100")]);
        directory.fail_lookup("555-0100");
        let cache = ContactCache::new();

        let map = cache.resolve(["555-0100"], &directory).await;
        assert!(!map.contains_key("555-0100"));

        directory.clear_failures();
        let map = cache.resolve(["555-0100"], &directory).await;
        assert_eq!(map.get("555-0100"), Some(&Some("Alice".to_string())));
        assert_eq!(directory.lookups().len(), 2);
    }

    #[tokio::test]
    async fn snapshots_are_immutable() {
        let directory = StubDirectory::new(Vec::new());
        let cache = ContactCache::new();
        let before = cache.snapshot();
        cache.resolve(["1"], &directory).await;
        assert!(before.is_empty());
        assert_eq!(cache.snapshot().len(), 1);
    }
}
