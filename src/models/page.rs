use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// `skip`/`limit`/`all` query parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 0))]
    pub skip: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Ignores `limit` and returns everything after `skip`.
    pub all: Option<bool>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        let skip = self.skip.unwrap_or(0);
        if self.all.unwrap_or(false) {
            Page { skip, limit: None }
        } else {
            Page {
                skip,
                limit: Some(self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)),
            }
        }
    }
}

/// A resolved window over an id-ordered listing. `limit: None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: Option<i64>,
}

impl Page {
    pub fn all() -> Self {
        Page {
            skip: 0,
            limit: None,
        }
    }

    /// Cuts the window out of an already ordered sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.skip.max(0) as usize);
        match self.limit {
            Some(limit) => skipped.take(limit.max(0) as usize).collect(),
            None => skipped.collect(),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        PageQuery::default().page()
    }
}
