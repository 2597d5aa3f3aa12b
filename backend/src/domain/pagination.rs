//! Offset pagination for list endpoints.

/// Page size applied when the caller supplies none.
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 1000;

/// Rejected pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange { max: u32 },
}

/// Validated `skip`/`limit` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    skip: u64,
    limit: u32,
}

impl PageRequest {
    /// Validate optional query parameters, applying defaults.
    pub fn new(skip: Option<u64>, limit: Option<u32>) -> Result<Self, PageRequestError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageRequestError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(Self {
            skip: skip.unwrap_or(0),
            limit,
        })
    }

    /// Rows to skip.
    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// Maximum rows to return.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}
