use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::classifier::PreferenceTable;
use super::domain::{Listing, ListingId, Lottery, LotteryEntry, LotteryId, LotteryStatus};
use super::draw::DrawEngine;
use super::eligibility::{self, ListingScope};
use super::repository::{
    ApplicationSource, ApplicationSourceError, AuditSink, DrawAuditRecord, ListingSource,
    ListingSourceError, LotteryStore, LotteryStoreError,
};
use super::results::{PageRequest, ResultsPage};
use crate::config::LotterySettings;

/// Service composing the eligibility rules, preference table, draw engine,
/// and collaborator-backed persistence.
pub struct LotteryService<L, A, S, D> {
    listings: Arc<L>,
    applications: Arc<A>,
    store: Arc<S>,
    audit: Arc<D>,
    preferences: Arc<PreferenceTable>,
    settings: LotterySettings,
}

static LOTTERY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_lottery_id() -> LotteryId {
    let id = LOTTERY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LotteryId(format!("lot-{id:06}"))
}

impl<L, A, S, D> LotteryService<L, A, S, D>
where
    L: ListingSource + 'static,
    A: ApplicationSource + 'static,
    S: LotteryStore + 'static,
    D: AuditSink + 'static,
{
    pub fn new(
        listings: Arc<L>,
        applications: Arc<A>,
        store: Arc<S>,
        audit: Arc<D>,
        preferences: PreferenceTable,
        settings: LotterySettings,
    ) -> Self {
        Self {
            listings,
            applications,
            store,
            audit,
            preferences: Arc::new(preferences),
            settings,
        }
    }

    /// Listings currently open for a drawing, filtered by the caller's
    /// scope. Always a list, possibly empty; source faults propagate.
    pub fn eligible_listings(
        &self,
        scope: &ListingScope,
        now: DateTime<Utc>,
    ) -> Result<Vec<Listing>, ListingSourceError> {
        Ok(eligibility::eligible(self.listings.list()?, scope, now))
    }

    /// Run the drawing for one listing and persist it exactly once.
    ///
    /// Validation order is fixed: a missing, closed, already-transitioned,
    /// or out-of-window listing is `NotDrawable`; a listing with a completed
    /// lottery is `AlreadyDrawn`. A missing award cutoff resolves to the
    /// listing's unit count before the draw.
    pub fn run(
        &self,
        listing_id: &ListingId,
        actor: &str,
        award_cutoff: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<LotteryId, LotteryRunError> {
        let listing = self
            .listings
            .fetch(listing_id)?
            .filter(|listing| eligibility::is_drawable(listing, now))
            .ok_or_else(|| LotteryRunError::NotDrawable(listing_id.clone()))?;

        if self.store.find_by_listing(listing_id)?.is_some() {
            return Err(LotteryRunError::AlreadyDrawn(listing_id.clone()));
        }

        let mut pool = self.applications.submitted_for(listing_id)?;
        pool.retain(|application| !application.withdrawn);
        pool.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));

        let pools = self.preferences.partition(&pool);
        let cutoff = award_cutoff.unwrap_or(listing.unit_count);
        let outcome = DrawEngine::draw(&pools, cutoff);

        let lottery_id = next_lottery_id();
        let lottery = Lottery {
            id: lottery_id.clone(),
            listing_id: listing_id.clone(),
            ran_at: now,
            ran_by: actor.to_string(),
            seed: outcome.seed,
            status: LotteryStatus::Completed,
        };
        let entries: Vec<LotteryEntry> = outcome
            .ranking
            .into_iter()
            .map(|ranked| LotteryEntry {
                lottery_id: lottery_id.clone(),
                application_id: ranked.application_id,
                tier: ranked.tier,
                rank_in_tier: ranked.rank_in_tier,
                global_rank: ranked.global_rank,
                waitlisted: ranked.waitlisted,
            })
            .collect();

        match self.store.insert(&lottery, &entries) {
            Ok(true) => {}
            Ok(false) => return Err(LotteryRunError::SaveFailed),
            // A racing run on another instance hit the uniqueness
            // constraint first; surface it as the same conflict.
            Err(LotteryStoreError::Conflict) => {
                return Err(LotteryRunError::AlreadyDrawn(listing_id.clone()))
            }
            Err(fault) => return Err(fault.into()),
        }

        match self.listings.mark_drawn(listing_id) {
            Ok(true) => {}
            Ok(false) => {
                warn!(%listing_id, "listing status transition reported no update")
            }
            Err(err) => {
                // The persisted lottery is the run-once source of truth;
                // the listing flag is a denormalization.
                warn!(%listing_id, error = %err, "failed to mark listing drawn")
            }
        }

        let audit_record = DrawAuditRecord {
            listing_id: listing_id.clone(),
            lottery_id: lottery_id.clone(),
            actor: actor.to_string(),
            ran_at: now,
        };
        if let Err(err) = self.audit.record(audit_record) {
            warn!(%lottery_id, error = %err, "audit record was not delivered");
        }

        info!(
            %listing_id,
            %lottery_id,
            entries = entries.len(),
            cutoff,
            "lottery drawing completed"
        );

        Ok(lottery_id)
    }

    /// One rank-ordered page of a persisted drawing. Page and size are
    /// normalized before the store is consulted.
    pub fn results(
        &self,
        lottery_id: &LotteryId,
        page: i64,
        page_size: i64,
    ) -> Result<ResultsPage, LotteryStoreError> {
        let request = PageRequest::normalize(page, page_size, self.settings.default_page_size);
        let (entries, total) = self
            .store
            .page(lottery_id, request.page, request.page_size)?;

        Ok(ResultsPage {
            entries,
            total,
            page: request.page,
            page_size: request.page_size,
        })
    }
}

/// Error raised by the lottery service. The first three variants are the
/// coded business failures callers are expected to handle; the transparent
/// variants are infrastructure faults passed through unswallowed.
#[derive(Debug, thiserror::Error)]
pub enum LotteryRunError {
    #[error("listing '{0}' is not open for a drawing")]
    NotDrawable(ListingId),
    #[error("listing '{0}' already has a completed lottery")]
    AlreadyDrawn(ListingId),
    #[error("the lottery store declined to save the drawing")]
    SaveFailed,
    #[error(transparent)]
    Listings(#[from] ListingSourceError),
    #[error(transparent)]
    Applications(#[from] ApplicationSourceError),
    #[error(transparent)]
    Store(#[from] LotteryStoreError),
}
