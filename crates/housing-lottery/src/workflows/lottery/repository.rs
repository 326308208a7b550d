use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, Listing, ListingId, Lottery, LotteryEntry, LotteryId};

/// Read-only access to the application collaborator.
pub trait ApplicationSource: Send + Sync {
    /// All submitted applications for the listing, withdrawn ones included;
    /// the service filters and orders the pool itself.
    fn submitted_for(&self, listing_id: &ListingId)
        -> Result<Vec<Application>, ApplicationSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationSourceError {
    #[error("application source unavailable: {0}")]
    Unavailable(String),
}

/// Access to the listing collaborator, including the single status
/// transition this engine performs.
pub trait ListingSource: Send + Sync {
    fn fetch(&self, listing_id: &ListingId) -> Result<Option<Listing>, ListingSourceError>;
    fn list(&self) -> Result<Vec<Listing>, ListingSourceError>;
    /// One-way transition to drawn once a drawing completes. Returns whether
    /// a listing row was actually updated.
    fn mark_drawn(&self, listing_id: &ListingId) -> Result<bool, ListingSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ListingSourceError {
    #[error("listing source unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for completed drawings.
pub trait LotteryStore: Send + Sync {
    /// Persist a lottery and all of its entries as one atomic write.
    /// `Ok(false)` is the store declining the write without raising; no
    /// partial state may remain in that case. `Err(Conflict)` signals the
    /// per-listing uniqueness constraint, which is what makes run-once hold
    /// across racing process instances.
    fn insert(&self, lottery: &Lottery, entries: &[LotteryEntry])
        -> Result<bool, LotteryStoreError>;

    fn find_by_listing(&self, listing_id: &ListingId)
        -> Result<Option<Lottery>, LotteryStoreError>;

    /// One page of entries ordered by ascending global rank, plus the total
    /// entry count for the lottery.
    fn page(
        &self,
        lottery_id: &LotteryId,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<LotteryEntry>, u64), LotteryStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LotteryStoreError {
    #[error("a completed lottery already exists for this listing")]
    Conflict,
    #[error("lottery store unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort record of a completed drawing for the audit collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawAuditRecord {
    pub listing_id: ListingId,
    pub lottery_id: LotteryId,
    pub actor: String,
    pub ran_at: DateTime<Utc>,
}

/// Outbound audit hook. Delivery failure never rolls back a drawing.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: DrawAuditRecord) -> Result<(), AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}
