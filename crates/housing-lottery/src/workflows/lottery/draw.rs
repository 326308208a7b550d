use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::classifier::TierPool;
use super::domain::{ApplicationId, TierCode};

/// One ranked applicant produced by a drawing, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedApplication {
    pub application_id: ApplicationId,
    pub tier: TierCode,
    pub rank_in_tier: u32,
    pub global_rank: u32,
    pub waitlisted: bool,
}

/// Output of one drawing: the recorded seed and the full ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub seed: u64,
    pub ranking: Vec<RankedApplication>,
}

/// Stateless engine producing tier-dominant, randomly tie-broken rankings.
///
/// Randomness only breaks ties inside a tier; tiers themselves are
/// concatenated in ascending priority-rank order, so a higher-priority tier
/// always outranks a lower one regardless of the seed.
pub struct DrawEngine;

impl DrawEngine {
    /// Run a drawing under a fresh cryptographically strong seed.
    pub fn draw(pools: &[TierPool], award_cutoff: u32) -> DrawOutcome {
        Self::draw_with_seed(OsRng.next_u64(), pools, award_cutoff)
    }

    /// Re-run a drawing from a recorded seed. Identical pools and seed
    /// reproduce the identical ranking, which is what makes a persisted
    /// drawing auditable.
    pub fn draw_with_seed(seed: u64, pools: &[TierPool], award_cutoff: u32) -> DrawOutcome {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut ordered: Vec<&TierPool> = pools.iter().collect();
        ordered.sort_by_key(|pool| pool.tier.priority);

        let mut ranking = Vec::new();
        let mut global_rank = 0u32;

        for pool in ordered {
            // Fisher-Yates over this tier's applicants; a shuffle is a
            // strict permutation, so no secondary tie-break is needed.
            let mut shuffled = pool.applications.clone();
            shuffled.shuffle(&mut rng);

            for (index, application_id) in shuffled.into_iter().enumerate() {
                global_rank += 1;
                ranking.push(RankedApplication {
                    application_id,
                    tier: pool.tier.code.clone(),
                    rank_in_tier: index as u32 + 1,
                    // The cutoff only flags; it never reorders.
                    waitlisted: global_rank > award_cutoff,
                    global_rank,
                });
            }
        }

        DrawOutcome { seed, ranking }
    }
}
