use crate::infra::{InMemoryApplicationSource, InMemoryListingSource, InMemoryLotteryStore, LogAuditSink};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::collections::BTreeSet;
use std::sync::Arc;

use housing_lottery::config::LotterySettings;
use housing_lottery::error::AppError;
use housing_lottery::workflows::lottery::{
    Application, ApplicationId, DrawEngine, Listing, ListingId, ListingScope, ListingStatus,
    ListingType, Lottery, LotteryRunError, LotteryService, PreferenceTable, ResultsPage, TierCode,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of applicants generated per listing
    #[arg(long, default_value_t = 10)]
    pub(crate) applicants: usize,
    /// Override the award cutoff; defaults to each listing's unit count
    #[arg(long)]
    pub(crate) award_cutoff: Option<u32>,
}

/// Seeded in-memory collaborators for the server's default wiring.
pub(crate) fn demo_fixtures() -> (InMemoryListingSource, InMemoryApplicationSource) {
    let listings = demo_listings();
    let applications = demo_applications(&listings, 10);
    (
        InMemoryListingSource::with_listings(listings),
        InMemoryApplicationSource::with_applications(applications),
    )
}

fn demo_listings() -> Vec<Listing> {
    let now = Utc::now();
    vec![
        Listing {
            id: ListingId("riverbend-commons".to_string()),
            name: "Riverbend Commons".to_string(),
            status: ListingStatus::Open,
            listing_type: ListingType::Rental,
            application_open: now - Duration::days(45),
            application_close: now + Duration::days(15),
            unit_count: 3,
        },
        Listing {
            id: ListingId("cedar-row".to_string()),
            name: "Cedar Row Townhomes".to_string(),
            status: ListingStatus::Open,
            listing_type: ListingType::Sale,
            application_open: now - Duration::days(30),
            application_close: now + Duration::days(30),
            unit_count: 2,
        },
    ]
}

fn demo_applications(listings: &[Listing], per_listing: usize) -> Vec<Application> {
    let mut applications = Vec::new();

    for listing in listings {
        for index in 0..per_listing {
            let mut claimed = BTreeSet::new();
            if index % 3 == 0 {
                claimed.insert(TierCode::new("live"));
            }
            if index % 4 == 0 {
                claimed.insert(TierCode::new("work"));
            }

            applications.push(Application {
                id: ApplicationId(format!("{}-app-{:02}", listing.id, index + 1)),
                listing_id: listing.id.clone(),
                applicant_id: format!("{}-applicant-{:02}", listing.id, index + 1),
                submitted_at: listing.application_open + Duration::minutes(index as i64),
                claimed_preferences: claimed,
                withdrawn: false,
            });
        }
    }

    applications
}

struct DemoDrawing {
    listing: Listing,
    lottery: Lottery,
    results: ResultsPage,
    reproduced: bool,
}

fn execute_demo(args: &DemoArgs, now: DateTime<Utc>) -> Result<Vec<DemoDrawing>, LotteryRunError> {
    let listings = demo_listings();
    let applications = demo_applications(&listings, args.applicants.max(1));

    let store = Arc::new(InMemoryLotteryStore::default());
    let table = PreferenceTable::standard();
    let service = LotteryService::new(
        Arc::new(InMemoryListingSource::with_listings(listings)),
        Arc::new(InMemoryApplicationSource::with_applications(
            applications.clone(),
        )),
        store.clone(),
        Arc::new(LogAuditSink),
        table.clone(),
        LotterySettings::default(),
    );

    let open = service.eligible_listings(&ListingScope::default(), now)?;

    let mut drawings = Vec::new();
    for listing in open {
        let lottery_id = service.run(&listing.id, "demo-operator", args.award_cutoff, now)?;
        let results = service.results(&lottery_id, 1, args.applicants.max(1) as i64)?;
        let lottery = store
            .lottery(&lottery_id)
            .expect("drawing persisted moments ago");

        // Replay the recorded seed over the same pool to demonstrate that
        // the persisted ranking is reproducible.
        let mut pool: Vec<Application> = applications
            .iter()
            .filter(|application| application.listing_id == listing.id && !application.withdrawn)
            .cloned()
            .collect();
        pool.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        let cutoff = args.award_cutoff.unwrap_or(listing.unit_count);
        let replay = DrawEngine::draw_with_seed(lottery.seed, &table.partition(&pool), cutoff);

        let reproduced = replay
            .ranking
            .iter()
            .zip(results.entries.iter())
            .all(|(ranked, entry)| {
                ranked.application_id == entry.application_id
                    && ranked.global_rank == entry.global_rank
            })
            && replay.ranking.len() as u64 == results.total;

        drawings.push(DemoDrawing {
            listing,
            lottery,
            results,
            reproduced,
        });
    }

    Ok(drawings)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = Utc::now();
    let drawings = execute_demo(&args, now)?;

    println!("Housing lottery demo");
    println!("Evaluated at {now}");

    for drawing in &drawings {
        println!(
            "\nListing {} ({}, {} units) -> {} (seed {})",
            drawing.listing.name,
            drawing.listing.listing_type.label(),
            drawing.listing.unit_count,
            drawing.lottery.id,
            drawing.lottery.seed
        );

        for entry in &drawing.results.entries {
            let status = if entry.waitlisted { "waitlist" } else { "award" };
            println!(
                "- rank {:>3} | tier {:<8} | within-tier {:>3} | {:<8} | {}",
                entry.global_rank, entry.tier, entry.rank_in_tier, status, entry.application_id
            );
        }

        println!(
            "Replaying seed {} reproduces the ranking: {}",
            drawing.lottery.seed,
            if drawing.reproduced { "yes" } else { "NO" }
        );
    }

    Ok(())
}
