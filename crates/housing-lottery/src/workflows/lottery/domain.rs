use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for published listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Identifier wrapper for completed lottery drawings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotteryId(pub String);

impl fmt::Display for LotteryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Preference tier code, e.g. `live` or `work`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TierCode(pub String);

impl TierCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for TierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Lifecycle of a published listing, owned by the listing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Open,
    Drawn,
    Closed,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Open => "open",
            ListingStatus::Drawn => "drawn",
            ListingStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Rental,
    Sale,
}

impl ListingType {
    pub const fn label(self) -> &'static str {
        match self {
            ListingType::Rental => "rental",
            ListingType::Sale => "sale",
        }
    }
}

/// A published housing opportunity as read from the listing collaborator.
/// This engine only reads it and, after a drawing, transitions its status to
/// drawn through the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub name: String,
    pub status: ListingStatus,
    pub listing_type: ListingType,
    pub application_open: DateTime<Utc>,
    pub application_close: DateTime<Utc>,
    /// Number of units available for immediate award; entries ranked past
    /// this count land on the waitlist.
    pub unit_count: u32,
}

/// One applicant's submitted entry for a listing; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub listing_id: ListingId,
    pub applicant_id: String,
    pub submitted_at: DateTime<Utc>,
    /// Tier codes the applicant claims; verification happens upstream of
    /// this engine.
    pub claimed_preferences: BTreeSet<TierCode>,
    pub withdrawn: bool,
}

/// A priority category that can elevate an applicant's rank. Lower priority
/// rank numbers win. Configuration data, not engine-owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceTier {
    pub code: TierCode,
    pub priority: u32,
    pub description: String,
}

/// Status of a persisted drawing. A lottery only ever exists completed; the
/// enum leaves room for the collaborator's storage encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotteryStatus {
    Completed,
}

impl LotteryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LotteryStatus::Completed => "completed",
        }
    }
}

/// One completed random-draw event for a listing. Created exactly once by
/// the lottery service and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lottery {
    pub id: LotteryId,
    pub listing_id: ListingId,
    pub ran_at: DateTime<Utc>,
    pub ran_by: String,
    /// Seed of the deterministic sequence that drove the drawing; recorded
    /// so the ranking can be reproduced for audit.
    pub seed: u64,
    pub status: LotteryStatus,
}

/// One applicant's result within a lottery. Created in bulk with its
/// lottery, immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryEntry {
    pub lottery_id: LotteryId,
    pub application_id: ApplicationId,
    pub tier: TierCode,
    pub rank_in_tier: u32,
    pub global_rank: u32,
    pub waitlisted: bool,
}
