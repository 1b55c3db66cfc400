//! Growth rates of two-species communities and interaction classification.
//!
//! Each species grows from the metabolites it takes up: uptake flux times
//! biomass yield, summed over metabolites. Alone, a species gets the medium
//! flux up to its uptake limit. Together, medium flux is shared in proportion
//! to demand when demand exceeds supply, and each member also takes up what
//! its partner secretes. The joint growth rates are found by fixed-point
//! iteration starting from zero growth.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::model::{CommunityModel, Medium, SpeciesModel};
use crate::core::{InteractionError, JobContext};

/// Relative change beyond which a member counts as helped or harmed.
pub const CHANGE_THRESHOLD: f64 = 0.1;

const CONVERGENCE_TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 10_000;
const ZERO_GROWTH: f64 = 1e-12;

/// Ecological interaction between the two members of a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    /// Both members grow better together.
    Mutualism,
    /// One member gains at the other's expense.
    Parasitism,
    /// One member gains, the other is unaffected.
    Commensalism,
    /// Both members grow worse together.
    Competition,
    /// One member is harmed, the other is unaffected.
    Amensalism,
    /// Neither member is affected.
    Neutralism,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Effect {
    Helped,
    Harmed,
    Unaffected,
}

impl Effect {
    fn of(change: f64) -> Self {
        if change > CHANGE_THRESHOLD {
            Self::Helped
        } else if change < -CHANGE_THRESHOLD {
            Self::Harmed
        } else {
            Self::Unaffected
        }
    }
}

impl InteractionType {
    /// Classify from the relative growth changes of both members.
    #[must_use]
    pub fn classify(a_change: f64, b_change: f64) -> Self {
        use Effect::{Harmed, Helped, Unaffected};

        match (Effect::of(a_change), Effect::of(b_change)) {
            (Helped, Helped) => Self::Mutualism,
            (Helped, Harmed) | (Harmed, Helped) => Self::Parasitism,
            (Helped, Unaffected) | (Unaffected, Helped) => Self::Commensalism,
            (Harmed, Harmed) => Self::Competition,
            (Harmed, Unaffected) | (Unaffected, Harmed) => Self::Amensalism,
            (Unaffected, Unaffected) => Self::Neutralism,
        }
    }

    /// Name as it appears in result tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mutualism => "Mutualism",
            Self::Parasitism => "Parasitism",
            Self::Commensalism => "Commensalism",
            Self::Competition => "Competition",
            Self::Amensalism => "Amensalism",
            Self::Neutralism => "Neutralism",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth metrics for one two-species community. Serialized field names
/// match the result table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GrowthRateRecord {
    /// Id of member A.
    pub a_id: String,
    /// Id of member B.
    pub b_id: String,
    /// Interaction classification.
    #[serde(rename = "TYPE")]
    pub interaction: InteractionType,
    /// Combined growth rate of the community.
    pub together: f64,
    /// Growth rate of A in the community.
    pub a_together: f64,
    /// Growth rate of B in the community.
    pub b_together: f64,
    /// Growth rate of A alone in the medium.
    pub a_alone: f64,
    /// Growth rate of B alone in the medium.
    pub b_alone: f64,
    /// Relative change of A's growth rate.
    #[serde(with = "crate::util::serde::non_finite_f64")]
    pub a_change: f64,
    /// Relative change of B's growth rate.
    #[serde(with = "crate::util::serde::non_finite_f64")]
    pub b_change: f64,
}

impl GrowthRateRecord {
    /// Compute every metric for `community` in `medium`.
    ///
    /// # Errors
    ///
    /// Returns `InteractionError::Cancelled` if `ctx` is cancelled while
    /// iterating.
    pub fn compute(
        community: &CommunityModel,
        medium: &Medium,
        ctx: &JobContext,
    ) -> Result<Self, InteractionError> {
        let (a, b) = (community.a(), community.b());
        let a_alone = growth_alone(a, medium);
        let b_alone = growth_alone(b, medium);
        let (a_together, b_together) = growth_together(community, medium, ctx)?;

        let a_change = relative_change(a_together, a_alone);
        let b_change = relative_change(b_together, b_alone);

        Ok(Self {
            a_id: a.id.clone(),
            b_id: b.id.clone(),
            interaction: InteractionType::classify(a_change, b_change),
            together: a_together + b_together,
            a_together,
            b_together,
            a_alone,
            b_alone,
            a_change,
            b_change,
        })
    }
}

/// Growth rate of `species` alone in `medium`.
#[must_use]
pub fn growth_alone(species: &SpeciesModel, medium: &Medium) -> f64 {
    species
        .uptake
        .iter()
        .map(|(metabolite, uptake)| {
            medium.available(metabolite).min(uptake.max_uptake) * uptake.biomass_yield
        })
        .sum()
}

/// Growth rates of both members growing together in `medium`, A first.
///
/// # Errors
///
/// Returns `InteractionError::Cancelled` if `ctx` is cancelled while
/// iterating.
pub fn growth_together(
    community: &CommunityModel,
    medium: &Medium,
    ctx: &JobContext,
) -> Result<(f64, f64), InteractionError> {
    let (a, b) = (community.a(), community.b());
    let mut rates = (0.0, 0.0);

    for iteration in 0..MAX_ITERATIONS {
        ctx.check_cancelled()?;

        let next = (
            growth_with_partner(a, b, rates.1, medium),
            growth_with_partner(b, a, rates.0, medium),
        );
        let delta = (next.0 - rates.0).abs().max((next.1 - rates.1).abs());
        rates = next;

        if delta < CONVERGENCE_TOLERANCE {
            trace!(community = %community.id, iterations = iteration + 1, "Growth converged");
            break;
        }
    }

    Ok(rates)
}

/// Relative change from growing alone to growing together.
///
/// Zero when both rates are zero; positive infinity when a species that
/// cannot grow alone grows in the community.
#[must_use]
pub fn relative_change(together: f64, alone: f64) -> f64 {
    if alone.abs() < ZERO_GROWTH {
        if together > ZERO_GROWTH {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        (together - alone) / alone
    }
}

fn growth_with_partner(
    species: &SpeciesModel,
    partner: &SpeciesModel,
    partner_growth: f64,
    medium: &Medium,
) -> f64 {
    species
        .uptake
        .iter()
        .map(|(metabolite, uptake)| {
            let partner_demand = partner.uptake_of(metabolite).map_or(0.0, |u| u.max_uptake);
            let from_medium =
                medium_share(medium.available(metabolite), uptake.max_uptake, partner_demand);
            let cross_fed = partner.secretion_of(metabolite) * partner_growth;
            (from_medium + cross_fed).min(uptake.max_uptake) * uptake.biomass_yield
        })
        .sum()
}

fn medium_share(supply: f64, demand: f64, partner_demand: f64) -> f64 {
    let total = demand + partner_demand;
    if total <= supply {
        demand
    } else {
        supply * demand / total
    }
}
