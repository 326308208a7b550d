use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use housing_lottery::workflows::lottery::{
    Application, ApplicationSource, ApplicationSourceError, AuditError, AuditSink,
    DrawAuditRecord, Listing, ListingId, ListingSource, ListingSourceError, ListingStatus,
    Lottery, LotteryEntry, LotteryId, LotteryStore, LotteryStoreError,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Listing collaborator backed by process memory. Stands in for the real
/// listing service until that integration lands.
#[derive(Default)]
pub(crate) struct InMemoryListingSource {
    listings: Mutex<HashMap<ListingId, Listing>>,
}

impl InMemoryListingSource {
    pub(crate) fn with_listings(listings: Vec<Listing>) -> Self {
        let map = listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();
        Self {
            listings: Mutex::new(map),
        }
    }
}

impl ListingSource for InMemoryListingSource {
    fn fetch(&self, listing_id: &ListingId) -> Result<Option<Listing>, ListingSourceError> {
        let guard = self.listings.lock().expect("listing mutex poisoned");
        Ok(guard.get(listing_id).cloned())
    }

    fn list(&self) -> Result<Vec<Listing>, ListingSourceError> {
        let guard = self.listings.lock().expect("listing mutex poisoned");
        let mut listings: Vec<Listing> = guard.values().cloned().collect();
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listings)
    }

    fn mark_drawn(&self, listing_id: &ListingId) -> Result<bool, ListingSourceError> {
        let mut guard = self.listings.lock().expect("listing mutex poisoned");
        match guard.get_mut(listing_id) {
            Some(listing) if listing.status == ListingStatus::Open => {
                listing.status = ListingStatus::Drawn;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Application collaborator backed by process memory.
#[derive(Default)]
pub(crate) struct InMemoryApplicationSource {
    by_listing: Mutex<HashMap<ListingId, Vec<Application>>>,
}

impl InMemoryApplicationSource {
    pub(crate) fn with_applications(applications: Vec<Application>) -> Self {
        let mut map: HashMap<ListingId, Vec<Application>> = HashMap::new();
        for application in applications {
            map.entry(application.listing_id.clone())
                .or_default()
                .push(application);
        }
        Self {
            by_listing: Mutex::new(map),
        }
    }
}

impl ApplicationSource for InMemoryApplicationSource {
    fn submitted_for(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<Application>, ApplicationSourceError> {
        let guard = self.by_listing.lock().expect("application mutex poisoned");
        Ok(guard.get(listing_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct StoreInner {
    lotteries: HashMap<LotteryId, Lottery>,
    entries: HashMap<LotteryId, Vec<LotteryEntry>>,
    by_listing: HashMap<ListingId, LotteryId>,
}

/// Lottery store backed by process memory, with the per-listing uniqueness
/// constraint a relational store would carry as a unique index.
#[derive(Default)]
pub(crate) struct InMemoryLotteryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryLotteryStore {
    pub(crate) fn lottery(&self, id: &LotteryId) -> Option<Lottery> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        guard.lotteries.get(id).cloned()
    }
}

impl LotteryStore for InMemoryLotteryStore {
    fn insert(
        &self,
        lottery: &Lottery,
        entries: &[LotteryEntry],
    ) -> Result<bool, LotteryStoreError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        if guard.by_listing.contains_key(&lottery.listing_id) {
            return Err(LotteryStoreError::Conflict);
        }
        guard
            .by_listing
            .insert(lottery.listing_id.clone(), lottery.id.clone());
        guard.lotteries.insert(lottery.id.clone(), lottery.clone());
        guard.entries.insert(lottery.id.clone(), entries.to_vec());
        Ok(true)
    }

    fn find_by_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<Lottery>, LotteryStoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard
            .by_listing
            .get(listing_id)
            .and_then(|id| guard.lotteries.get(id))
            .cloned())
    }

    fn page(
        &self,
        lottery_id: &LotteryId,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<LotteryEntry>, u64), LotteryStoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut entries = guard.entries.get(lottery_id).cloned().unwrap_or_default();
        entries.sort_by_key(|entry| entry.global_rank);
        let total = entries.len() as u64;

        let offset = (page as usize - 1).saturating_mul(page_size as usize);
        let page_entries = entries
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        Ok((page_entries, total))
    }
}

/// Audit sink that lands records on the service log until the audit
/// pipeline integration is wired up.
#[derive(Default)]
pub(crate) struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, record: DrawAuditRecord) -> Result<(), AuditError> {
        info!(
            listing_id = %record.listing_id,
            lottery_id = %record.lottery_id,
            actor = %record.actor,
            ran_at = %record.ran_at,
            "lottery drawing audited"
        );
        Ok(())
    }
}
