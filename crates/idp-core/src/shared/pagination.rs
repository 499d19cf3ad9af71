//! Offset pagination for `find_all` style queries.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// A zero limit selects nothing; stores return only the total.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// Clamp the limit into `1..=max_limit`.
    pub fn clamped(self, max_limit: u64) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.clamp(1, max_limit.max(1)),
        }
    }
}

/// One page of results plus the total count of matching items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            offset: request.offset,
            limit: request.limit,
            total,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            total: self.total,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }
}
