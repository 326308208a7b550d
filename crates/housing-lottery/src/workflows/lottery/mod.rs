//! Lottery drawing and ranking workflow.
//!
//! Write path: eligibility resolution, applicant pool loading, preference
//! classification, the seeded random draw, and the run-once recorder.
//! Read path: rank-ordered, paginated results. Collaborators (listing and
//! application sources, lottery store, audit sink) are traits defined in
//! [`repository`].

pub(crate) mod classifier;
pub mod domain;
pub(crate) mod draw;
pub mod eligibility;
pub mod repository;
pub mod results;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use classifier::{PreferenceTable, PreferenceTableError, TierPool, GENERAL_TIER_CODE};
pub use domain::{
    Application, ApplicationId, Listing, ListingId, ListingStatus, ListingType, Lottery,
    LotteryEntry, LotteryId, LotteryStatus, PreferenceTier, TierCode,
};
pub use draw::{DrawEngine, DrawOutcome, RankedApplication};
pub use eligibility::ListingScope;
pub use repository::{
    ApplicationSource, ApplicationSourceError, AuditError, AuditSink, DrawAuditRecord,
    ListingSource, ListingSourceError, LotteryStore, LotteryStoreError,
};
pub use results::{PageRequest, ResultsPage};
pub use router::lottery_router;
pub use service::{LotteryRunError, LotteryService};
