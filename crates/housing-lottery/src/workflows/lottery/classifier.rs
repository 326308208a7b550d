use super::domain::{Application, ApplicationId, PreferenceTier, TierCode};

/// Code of the built-in fallback tier for applications that qualify for no
/// configured preference.
pub const GENERAL_TIER_CODE: &str = "general";

/// Errors raised while building a preference table from configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PreferenceTableError {
    #[error("duplicate tier code '{0}'")]
    DuplicateCode(TierCode),
    #[error("tiers '{first}' and '{second}' share priority rank {priority}")]
    DuplicatePriority {
        first: TierCode,
        second: TierCode,
        priority: u32,
    },
    #[error("tier code '{0}' is reserved for the built-in general tier")]
    ReservedCode(TierCode),
}

/// Configured preference tiers plus the built-in general fallback.
///
/// Classification assigns every application to exactly one tier: the
/// claimed tier with the lowest priority-rank number ("most specific
/// preference wins"), or the general tier when nothing matches. The table
/// is deployment configuration; nothing in here is hard-coded policy.
#[derive(Debug, Clone)]
pub struct PreferenceTable {
    /// Sorted ascending by priority so classification is a first-match scan.
    tiers: Vec<PreferenceTier>,
    general: PreferenceTier,
}

impl PreferenceTable {
    pub fn new(mut tiers: Vec<PreferenceTier>) -> Result<Self, PreferenceTableError> {
        for (index, tier) in tiers.iter().enumerate() {
            if tier.code.0 == GENERAL_TIER_CODE {
                return Err(PreferenceTableError::ReservedCode(tier.code.clone()));
            }
            for other in &tiers[index + 1..] {
                if tier.code == other.code {
                    return Err(PreferenceTableError::DuplicateCode(tier.code.clone()));
                }
                if tier.priority == other.priority {
                    return Err(PreferenceTableError::DuplicatePriority {
                        first: tier.code.clone(),
                        second: other.code.clone(),
                        priority: tier.priority,
                    });
                }
            }
        }

        tiers.sort_by_key(|tier| tier.priority);

        Ok(Self {
            tiers,
            general: PreferenceTier {
                code: TierCode::new(GENERAL_TIER_CODE),
                priority: u32::MAX,
                description: "No qualifying preference".to_string(),
            },
        })
    }

    /// Live/work preference pair used by demos and tests. Production
    /// deployments supply their own jurisdiction's table.
    pub fn standard() -> Self {
        Self::new(vec![
            PreferenceTier {
                code: TierCode::new("live"),
                priority: 1,
                description: "Lives in the jurisdiction".to_string(),
            },
            PreferenceTier {
                code: TierCode::new("work"),
                priority: 2,
                description: "Works in the jurisdiction".to_string(),
            },
        ])
        .expect("standard preference table is valid")
    }

    pub fn tiers(&self) -> &[PreferenceTier] {
        &self.tiers
    }

    pub fn general(&self) -> &PreferenceTier {
        &self.general
    }

    /// Assign an application to exactly one tier, never zero or multiple.
    pub fn classify(&self, application: &Application) -> &PreferenceTier {
        self.tiers
            .iter()
            .find(|tier| application.claimed_preferences.contains(&tier.code))
            .unwrap_or(&self.general)
    }

    /// Split a pool into per-tier sub-pools in ascending priority order,
    /// preserving the given submission order within each tier. Tiers with
    /// no applicants are omitted.
    pub fn partition(&self, applications: &[Application]) -> Vec<TierPool> {
        let mut pools = Vec::new();

        for tier in self.tiers.iter().chain(std::iter::once(&self.general)) {
            let members: Vec<ApplicationId> = applications
                .iter()
                .filter(|application| self.classify(application).code == tier.code)
                .map(|application| application.id.clone())
                .collect();

            if !members.is_empty() {
                pools.push(TierPool {
                    tier: tier.clone(),
                    applications: members,
                });
            }
        }

        pools
    }
}

/// One tier's slice of the applicant pool, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPool {
    pub tier: PreferenceTier,
    pub applications: Vec<ApplicationId>,
}
