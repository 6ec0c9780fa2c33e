use crate::{
    config::PaginationConfig,
    db::connection::{ConnectionError, SortKey},
};

///
/// PaginationArgs
///
/// Relay-style arguments as received from a client.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaginationArgs {
    pub first: Option<u32>,
    pub after: Option<String>,
    pub last: Option<u32>,
    pub before: Option<String>,
    pub reverse: bool,
    pub sort_key: SortKey,
}

impl PaginationArgs {
    #[must_use]
    pub fn new(sort_key: impl Into<SortKey>) -> Self {
        Self {
            first: None,
            after: None,
            last: None,
            before: None,
            reverse: false,
            sort_key: sort_key.into(),
        }
    }

    #[must_use]
    pub const fn first(mut self, first: u32) -> Self {
        self.first = Some(first);
        self
    }

    #[must_use]
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    #[must_use]
    pub const fn last(mut self, last: u32) -> Self {
        self.last = Some(last);
        self
    }

    #[must_use]
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Validate the argument combination and resolve it into a page window.
    pub fn window(&self, limits: &PaginationConfig) -> Result<PageWindow, ConnectionError> {
        let (direction, limit, cursor) = match (self.first, self.last) {
            (Some(_), Some(_)) => return Err(ConnectionError::FirstAndLast),
            (_, Some(_)) if self.after.is_some() => return Err(ConnectionError::LastWithAfter),
            (Some(_), _) if self.before.is_some() => {
                return Err(ConnectionError::FirstWithBefore);
            }
            (None, Some(last)) => (PageDirection::Backward, last, self.before.clone()),
            (Some(first), None) => (PageDirection::Forward, first, self.after.clone()),
            (None, None) if self.before.is_some() => (
                PageDirection::Backward,
                limits.default_page_size,
                self.before.clone(),
            ),
            (None, None) => (
                PageDirection::Forward,
                limits.default_page_size,
                self.after.clone(),
            ),
        };

        if limit > limits.max_page_size {
            return Err(ConnectionError::PageSizeExceeded {
                requested: limit,
                max: limits.max_page_size,
            });
        }

        Ok(PageWindow {
            direction,
            limit,
            cursor,
            reverse: self.reverse,
        })
    }
}

///
/// PageDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageDirection {
    /// `first` / `after`.
    Forward,
    /// `last` / `before`.
    Backward,
}

///
/// PageWindow
///
/// Validated page request: direction, size, and the raw resume token.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageWindow {
    pub direction: PageDirection,
    pub limit: u32,
    pub cursor: Option<String>,
    pub reverse: bool,
}

impl PageWindow {
    #[must_use]
    pub const fn forward(limit: u32) -> Self {
        Self {
            direction: PageDirection::Forward,
            limit,
            cursor: None,
            reverse: false,
        }
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }
}
