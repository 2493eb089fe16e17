//! LIMIT/OFFSET derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pagination state in `{page, size, start, limit}` form.
///
/// A non-zero `page` wins over `start`/`limit`: `size` defaults to 1 and the
/// window becomes `LIMIT size OFFSET size*(page-1)`.
///
/// ```
/// use sqlchain::Paginator;
///
/// let p = Paginator { page: 2, size: 10, ..Paginator::default() };
/// assert_eq!(p.to_string(), "LIMIT 10 OFFSET 10");
/// assert_eq!(Paginator::default().to_string(), "");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paginator {
    pub size: u64,
    pub page: u64,
    pub start: u64,
    pub limit: u64,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any field is set.
    pub fn resolve(&self) -> bool {
        self.size != 0 || self.page != 0 || self.start != 0 || self.limit != 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Effective `(limit, start)` without mutating.
    pub fn window(&self) -> (u64, u64) {
        if self.page == 0 {
            return (self.limit, self.start);
        }
        let size = self.size.max(1);
        (size, size.saturating_mul(self.page - 1))
    }

    /// Write the page-derived window back into `start`/`limit`.
    pub fn normalize(&mut self) {
        if self.page != 0 {
            self.size = self.size.max(1);
            (self.limit, self.start) = self.window();
        }
    }
}

impl fmt::Display for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.resolve() {
            return Ok(());
        }
        let (limit, start) = self.window();
        match (limit, start) {
            (0, 0) => Ok(()),
            (0, start) => write!(f, "OFFSET {start}"),
            (limit, 0) => write!(f, "LIMIT {limit}"),
            (limit, start) => write!(f, "LIMIT {limit} OFFSET {start}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_overrides_start_and_limit() {
        let p = Paginator {
            page: 3,
            size: 20,
            start: 7,
            limit: 2,
        };
        assert_eq!(p.to_string(), "LIMIT 20 OFFSET 40");
    }

    #[test]
    fn first_page_has_no_offset() {
        let p = Paginator {
            page: 1,
            size: 10,
            ..Paginator::default()
        };
        assert_eq!(p.to_string(), "LIMIT 10");
    }

    #[test]
    fn page_without_size_uses_one() {
        let p = Paginator {
            page: 4,
            ..Paginator::default()
        };
        assert_eq!(p.to_string(), "LIMIT 1 OFFSET 3");
    }

    #[test]
    fn start_and_limit() {
        let p = Paginator {
            start: 5,
            limit: 10,
            ..Paginator::default()
        };
        assert_eq!(p.to_string(), "LIMIT 10 OFFSET 5");
        let only_offset = Paginator {
            start: 5,
            ..Paginator::default()
        };
        assert_eq!(only_offset.to_string(), "OFFSET 5");
    }

    #[test]
    fn size_alone_renders_nothing() {
        let p = Paginator {
            size: 10,
            ..Paginator::default()
        };
        assert!(p.resolve());
        assert_eq!(p.to_string(), "");
    }

    #[test]
    fn normalize_and_clear() {
        let mut p = Paginator {
            page: 2,
            ..Paginator::default()
        };
        p.normalize();
        assert_eq!((p.size, p.limit, p.start), (1, 1, 1));
        p.clear();
        assert!(!p.resolve());
    }
}
