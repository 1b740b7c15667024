//! Offset pagination for collection reads.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SKIP: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 1000;

/// `skip`/`limit` window over an insertion-ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageWindow {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: limit.min(MAX_LIMIT),
        }
    }

    pub fn from_query(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self::new(
            skip.unwrap_or(DEFAULT_SKIP),
            limit.unwrap_or(DEFAULT_LIMIT),
        )
    }

    /// Only the default window is cached; other windows always hit the store.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }

    pub fn offset_i64(&self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }

    pub fn limit_i64(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_collection_cache_window() {
        let window = PageWindow::from_query(None, None);
        assert_eq!(window, PageWindow::new(0, 100));
        assert!(window.is_default());
        assert!(!PageWindow::new(1, 100).is_default());
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(PageWindow::new(0, 50_000).limit, MAX_LIMIT);
    }

    #[test]
    fn apply_slices_in_order() {
        let window = PageWindow::new(1, 2);
        assert_eq!(window.apply([1, 2, 3, 4]), vec![2, 3]);
        assert!(PageWindow::new(10, 2).apply([1, 2]).is_empty());
    }
}
