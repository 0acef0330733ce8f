//! Persistent set of category ids excluded from resolution.

use std::{fmt, iter, sync::Arc};

/// One link of the exclusion chain.
#[derive(Debug)]
struct Link {
    /// Excluded id.
    id: u64,
    /// Ids added before this one.
    next: Option<Arc<Link>>,
}

/// Immutable, append-only set of category ids.
///
/// Adding an id returns a new set sharing the existing links, so each recursive call owns its
/// own view and siblings never see each other's additions.
#[derive(Clone, Default)]
pub struct ExcludedCategories {
    /// Most recently added link.
    head: Option<Arc<Link>>,
    /// Number of links.
    len: usize,
}

impl ExcludedCategories {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a set containing `id` in addition to the current ids.
    #[must_use]
    pub fn with(&self, id: u64) -> Self {
        if self.contains(id) {
            return self.clone();
        }
        Self {
            head: Some(Arc::new(Link {
                id,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Returns true if `id` is excluded.
    pub fn contains(&self, id: u64) -> bool {
        self.iter().any(|excluded| excluded == id)
    }

    /// Returns the number of excluded ids.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the ids, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let mut link = self.head.as_deref();
        iter::from_fn(move || {
            let current = link?;
            link = current.next.as_deref();
            Some(current.id)
        })
    }

    /// Returns the ids in ascending order.
    pub fn sorted(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.iter().collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<u64> for ExcludedCategories {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |excluded, id| excluded.with(id))
    }
}

impl fmt::Debug for ExcludedCategories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
