use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::LotterySettings;
use crate::workflows::lottery::classifier::PreferenceTable;
use crate::workflows::lottery::domain::{
    Application, ApplicationId, Listing, ListingId, ListingStatus, ListingType, Lottery,
    LotteryEntry, LotteryId, PreferenceTier, TierCode,
};
use crate::workflows::lottery::repository::{
    ApplicationSource, ApplicationSourceError, AuditError, AuditSink, DrawAuditRecord,
    ListingSource, ListingSourceError, LotteryStore, LotteryStoreError,
};
use crate::workflows::lottery::router::lottery_router;
use crate::workflows::lottery::service::LotteryService;

/// Fixed evaluation instant so window checks are deterministic.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn tier(code: &str, priority: u32, description: &str) -> PreferenceTier {
    PreferenceTier {
        code: TierCode::new(code),
        priority,
        description: description.to_string(),
    }
}

pub(super) fn open_listing(id: &str) -> Listing {
    Listing {
        id: ListingId(id.to_string()),
        name: format!("{id} Apartments"),
        status: ListingStatus::Open,
        listing_type: ListingType::Rental,
        application_open: now() - Duration::days(30),
        application_close: now() + Duration::days(30),
        unit_count: 2,
    }
}

pub(super) fn application(id: &str, listing: &str, preferences: &[&str]) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        listing_id: ListingId(listing.to_string()),
        applicant_id: format!("applicant-{id}"),
        submitted_at: now() - Duration::days(7),
        claimed_preferences: preferences
            .iter()
            .map(|code| TierCode::new(*code))
            .collect::<BTreeSet<_>>(),
        withdrawn: false,
    }
}

#[derive(Default)]
pub(super) struct MemoryListings {
    listings: Mutex<HashMap<ListingId, Listing>>,
}

impl MemoryListings {
    pub(super) fn with_listings(listings: Vec<Listing>) -> Self {
        let map = listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();
        Self {
            listings: Mutex::new(map),
        }
    }

    pub(super) fn status_of(&self, id: &ListingId) -> Option<ListingStatus> {
        let guard = self.listings.lock().expect("listing mutex poisoned");
        guard.get(id).map(|listing| listing.status)
    }
}

impl ListingSource for MemoryListings {
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

#[derive(Default)]
pub(super) struct MemoryApplications {
    by_listing: Mutex<HashMap<ListingId, Vec<Application>>>,
}

impl MemoryApplications {
    pub(super) fn with_applications(applications: Vec<Application>) -> Self {
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

impl ApplicationSource for MemoryApplications {
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

#[derive(Default)]
pub(super) struct MemoryLotteryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryLotteryStore {
    pub(super) fn lottery(&self, id: &LotteryId) -> Option<Lottery> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        guard.lotteries.get(id).cloned()
    }

    pub(super) fn entries(&self, id: &LotteryId) -> Vec<LotteryEntry> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        guard.entries.get(id).cloned().unwrap_or_default()
    }
}

impl LotteryStore for MemoryLotteryStore {
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

/// Store that declines every write without raising, the soft "not saved"
/// outcome.
pub(super) struct RejectingStore;

impl LotteryStore for RejectingStore {
    fn insert(&self, _: &Lottery, _: &[LotteryEntry]) -> Result<bool, LotteryStoreError> {
        Ok(false)
    }

    fn find_by_listing(&self, _: &ListingId) -> Result<Option<Lottery>, LotteryStoreError> {
        Ok(None)
    }

    fn page(
        &self,
        _: &LotteryId,
        _: u32,
        _: u32,
    ) -> Result<(Vec<LotteryEntry>, u64), LotteryStoreError> {
        Ok((Vec::new(), 0))
    }
}

/// Store whose precheck misses but whose uniqueness constraint fires on
/// insert, simulating a lost race with another process instance.
pub(super) struct RacingStore;

impl LotteryStore for RacingStore {
    fn insert(&self, _: &Lottery, _: &[LotteryEntry]) -> Result<bool, LotteryStoreError> {
        Err(LotteryStoreError::Conflict)
    }

    fn find_by_listing(&self, _: &ListingId) -> Result<Option<Lottery>, LotteryStoreError> {
        Ok(None)
    }

    fn page(
        &self,
        _: &LotteryId,
        _: u32,
        _: u32,
    ) -> Result<(Vec<LotteryEntry>, u64), LotteryStoreError> {
        Ok((Vec::new(), 0))
    }
}

pub(super) struct UnavailableStore;

impl LotteryStore for UnavailableStore {
    fn insert(&self, _: &Lottery, _: &[LotteryEntry]) -> Result<bool, LotteryStoreError> {
        Err(LotteryStoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_listing(&self, _: &ListingId) -> Result<Option<Lottery>, LotteryStoreError> {
        Err(LotteryStoreError::Unavailable("database offline".to_string()))
    }

    fn page(
        &self,
        _: &LotteryId,
        _: u32,
        _: u32,
    ) -> Result<(Vec<LotteryEntry>, u64), LotteryStoreError> {
        Err(LotteryStoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    records: Mutex<Vec<DrawAuditRecord>>,
}

impl MemoryAudit {
    pub(super) fn records(&self) -> Vec<DrawAuditRecord> {
        self.records.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, record: DrawAuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .expect("audit mutex poisoned")
            .push(record);
        Ok(())
    }
}

pub(super) struct FailingAudit;

impl AuditSink for FailingAudit {
    fn record(&self, _: DrawAuditRecord) -> Result<(), AuditError> {
        Err(AuditError::Transport("audit queue offline".to_string()))
    }
}

pub(super) type MemoryService =
    LotteryService<MemoryListings, MemoryApplications, MemoryLotteryStore, MemoryAudit>;

pub(super) fn build_service(
    listings: Vec<Listing>,
    applications: Vec<Application>,
) -> (
    MemoryService,
    Arc<MemoryListings>,
    Arc<MemoryLotteryStore>,
    Arc<MemoryAudit>,
) {
    let listings = Arc::new(MemoryListings::with_listings(listings));
    let applications = Arc::new(MemoryApplications::with_applications(applications));
    let store = Arc::new(MemoryLotteryStore::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = LotteryService::new(
        listings.clone(),
        applications,
        store.clone(),
        audit.clone(),
        PreferenceTable::standard(),
        LotterySettings::default(),
    );
    (service, listings, store, audit)
}

pub(super) fn lottery_router_with_service(service: MemoryService) -> axum::Router {
    lottery_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
