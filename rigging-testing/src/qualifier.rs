// Unique qualifiers for multi-bindings

use rigging_core::Qualifier;
use std::sync::atomic::{AtomicU64, Ordering};

/// Group tag used when a multi-binding is declared without a name
pub const DEFAULT_GROUP: &str = "__all__";

/// Issues qualifiers that are never equal to one issued before
///
/// Every qualifier carries a group tag so all members of a multi-binding can
/// be found again, and a sequence number that keeps the keys distinct.
///
/// ```
/// use rigging_testing::{UniqueQualifiers, DEFAULT_GROUP};
///
/// let qualifiers = UniqueQualifiers::new();
/// let first = qualifiers.create(DEFAULT_GROUP);
/// let second = qualifiers.create(DEFAULT_GROUP);
///
/// assert_ne!(first, second);
/// assert_eq!(first.group(), Some(DEFAULT_GROUP));
/// ```
#[derive(Debug, Default)]
pub struct UniqueQualifiers {
    next: AtomicU64,
}

impl UniqueQualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh qualifier tagged with `group`
    pub fn create(&self, group: &str) -> Qualifier {
        let sequence = self.next.fetch_add(1, Ordering::Relaxed);
        Qualifier::Unique {
            group: group.to_string(),
            sequence,
        }
    }

    /// Number of qualifiers issued so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_qualifiers_never_repeat() {
        let qualifiers = UniqueQualifiers::new();
        let issued: HashSet<Qualifier> = (0..100)
            .map(|i| qualifiers.create(if i % 2 == 0 { "even" } else { DEFAULT_GROUP }))
            .collect();
        assert_eq!(issued.len(), 100);
        assert_eq!(qualifiers.issued(), 100);
    }

    #[test]
    fn test_same_group_still_distinct() {
        let qualifiers = UniqueQualifiers::new();
        let a = qualifiers.create("colors");
        let b = qualifiers.create("colors");
        assert_ne!(a, b);
        assert_eq!(a.group(), b.group());
    }

    #[test]
    fn test_group_is_preserved() {
        let qualifiers = UniqueQualifiers::new();
        assert_eq!(qualifiers.create("").group(), Some(""));
        assert_eq!(qualifiers.create("shapes").group(), Some("shapes"));
    }
}
