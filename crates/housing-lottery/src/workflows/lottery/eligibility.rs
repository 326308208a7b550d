use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingStatus, ListingType};

/// Scope filters narrowing which listings a caller sees as drawable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingScope {
    pub listing_type: Option<ListingType>,
}

impl ListingScope {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self.listing_type {
            Some(listing_type) => listing.listing_type == listing_type,
            None => true,
        }
    }
}

/// Both window bounds are inclusive; a drawing on the closing instant is
/// still in-window.
pub fn window_contains(listing: &Listing, at: DateTime<Utc>) -> bool {
    listing.application_open <= at && at <= listing.application_close
}

/// A listing qualifies for a drawing while it is open and inside its
/// application window at the evaluation instant.
pub fn is_drawable(listing: &Listing, at: DateTime<Utc>) -> bool {
    listing.status == ListingStatus::Open && window_contains(listing, at)
}

/// Filter a listing set down to the drawable ones matching the scope.
/// Always returns a list, possibly empty.
pub fn eligible(listings: Vec<Listing>, scope: &ListingScope, at: DateTime<Utc>) -> Vec<Listing> {
    listings
        .into_iter()
        .filter(|listing| is_drawable(listing, at) && scope.matches(listing))
        .collect()
}
