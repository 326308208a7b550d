use serde::Serialize;

use super::domain::LotteryEntry;

/// Normalized pagination parameters for a results query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Page numbers below 1 become 1; non-positive sizes fall back to the
    /// configured default.
    pub fn normalize(page: i64, page_size: i64, default_page_size: u32) -> Self {
        let page = if page < 1 {
            1
        } else {
            u32::try_from(page).unwrap_or(u32::MAX)
        };

        let page_size = if page_size < 1 {
            default_page_size
        } else {
            u32::try_from(page_size).unwrap_or(u32::MAX)
        };

        Self { page, page_size }
    }
}

/// One rank-ordered page of a persisted drawing. A lottery with zero
/// entries yields an empty page with `total = 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsPage {
    pub entries: Vec<LotteryEntry>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
