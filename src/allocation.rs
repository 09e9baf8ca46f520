//! Allocation Engine
//!
//! Splits a material budget across the sizes of a [`MaterialProfile`].
//!
//! Three strategies are available and chosen from the shape of the request:
//!
//! - [`Strategy::Manual`]: a positive manual percentage is supplied. Each size gets its
//!   own slice of the budget and produces as many whole units as fit in it.
//! - [`Strategy::Greedy`]: the default. Sizes are ranked by net margin per metre and
//!   filled one after another in a single pass.
//! - [`Strategy::ExhaustiveSearch`]: requested with `minimize_leftover`. Every whole-unit
//!   combination is enumerated and the one with the least leftover (then the highest
//!   profit) wins.

use std::fmt;

use decimal_percentage::Percentage;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    allocation::{
        greedy::GreedyAllocator,
        observer::{NoopObserver, SearchObserver},
        ranking::Ranking,
        search::ExhaustiveAllocator,
    },
    percentages::{FULL_SHARE, ManualPercentages},
    profiles::{MaterialProfile, Size},
};

pub mod greedy;
pub mod manual;
pub mod observer;
pub mod ranking;
pub mod search;

/// Relative tolerance used when checking the budget invariant.
const BUDGET_TOLERANCE: f64 = 1e-9;

/// Unexpected faults raised while computing an allocation.
#[derive(Debug, Error, PartialEq)]
pub enum ComputationError {
    /// A unit count does not fit in a `u32`.
    #[error("unit count for size {size} does not fit: {length} / {consumption}")]
    UnitCountOverflow {
        /// Size identifier
        size: String,

        /// Length being divided
        length: f64,

        /// Consumption per unit
        consumption: f64,
    },

    /// Internal invariant was violated (this is a bug).
    #[error("allocation invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Allocation Errors
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    /// No material profile is registered under this name.
    #[error("unknown material type: {0}")]
    InvalidMaterialType(String),

    /// None of the requested sizes exist in the profile.
    #[error("none of the requested sizes exist in material {0}")]
    InvalidEligibilitySet(String),

    /// Manual percentages over the eligible sizes exceed 100.
    #[error("manual percentages total {total}%, which exceeds 100%")]
    PercentageOverflow {
        /// Sum of the eligible sizes' percentages
        total: Decimal,
    },

    /// The material budget must be positive.
    #[error("material budget must be greater than zero, got {0}")]
    NonPositiveBudget(f64),

    /// Wrapped computation failure.
    #[error("allocation failed: {0}")]
    Computation(#[from] ComputationError),
}

/// The strategy that produced an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Manual percentage shares
    Manual,

    /// Single pass in ranked order
    Greedy,

    /// Leftover-minimising exhaustive search
    ExhaustiveSearch,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Manual => f.write_str("manual percentages"),
            Strategy::Greedy => f.write_str("greedy"),
            Strategy::ExhaustiveSearch => f.write_str("exhaustive search"),
        }
    }
}

/// Units produced for one size.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeAllocation {
    /// Size identifier
    pub size: String,

    /// Whole units produced
    pub units: u32,

    /// Material length consumed per unit
    pub consumption: f64,

    /// Profit per unit
    pub unit_profit: f64,
}

impl SizeAllocation {
    /// Total material length consumed by this size.
    pub fn length(&self) -> f64 {
        f64::from(self.units) * self.consumption
    }

    /// Total profit earned by this size.
    pub fn profit(&self) -> f64 {
        f64::from(self.units) * self.unit_profit
    }
}

/// Share of the budget taken by one size, or by the leftover when `size` is `None`.
#[derive(Debug, Clone)]
pub struct UsageShare {
    /// Size identifier, `None` for the leftover
    pub size: Option<String>,

    /// Material length
    pub length: f64,

    /// Fraction of the budget
    pub share: Percentage,
}

/// Outcome of an allocation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    strategy: Strategy,
    budget: f64,
    allocations: SmallVec<[SizeAllocation; 8]>,
    profit: f64,
    leftover: f64,
}

impl AllocationResult {
    /// Create an empty allocation: nothing produced, the whole budget left over.
    pub(crate) fn empty(strategy: Strategy, budget: f64) -> Self {
        Self {
            strategy,
            budget,
            allocations: SmallVec::new(),
            profit: 0.0,
            leftover: budget,
        }
    }

    /// Assemble a result from already computed parts.
    pub(crate) fn from_parts(
        strategy: Strategy,
        budget: f64,
        allocations: SmallVec<[SizeAllocation; 8]>,
        profit: f64,
        leftover: f64,
    ) -> Self {
        Self {
            strategy,
            budget,
            allocations,
            profit,
            leftover,
        }
    }

    /// Strategy that produced this result
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Material budget the result was computed for
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Sizes with non-zero production, in commit order
    pub fn allocations(&self) -> &[SizeAllocation] {
        &self.allocations
    }

    /// Units produced for a size, zero if it produced nothing.
    pub fn units(&self, size: &str) -> u32 {
        self.allocations
            .iter()
            .find(|allocation| allocation.size == size)
            .map_or(0, |allocation| allocation.units)
    }

    /// Total units produced across all sizes
    pub fn total_units(&self) -> u64 {
        self.allocations
            .iter()
            .map(|allocation| u64::from(allocation.units))
            .sum()
    }

    /// Total profit
    pub fn profit(&self) -> f64 {
        self.profit
    }

    /// Unused material length
    pub fn leftover(&self) -> f64 {
        self.leftover
    }

    /// Material length consumed by production
    pub fn consumed(&self) -> f64 {
        self.budget - self.leftover
    }

    /// Returns true if nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Fraction of the budget turned into product.
    pub fn efficiency(&self) -> Percentage {
        Percentage::from(self.consumed() / self.budget)
    }

    /// Per-size material usage followed by the leftover, as fractions of the budget.
    pub fn usage(&self) -> SmallVec<[UsageShare; 9]> {
        let mut usage: SmallVec<[UsageShare; 9]> = self
            .allocations
            .iter()
            .map(|allocation| UsageShare {
                size: Some(allocation.size.clone()),
                length: allocation.length(),
                share: Percentage::from(allocation.length() / self.budget),
            })
            .collect();

        usage.push(UsageShare {
            size: None,
            length: self.leftover,
            share: Percentage::from(self.leftover / self.budget),
        });

        usage
    }
}

/// Strategy that fills a budget from a ranking of sizes.
pub trait Allocator {
    /// Allocate the budget across the ranked sizes.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationError`] if a unit count cannot be represented.
    fn allocate(ranking: &Ranking<'_>, budget: f64) -> Result<AllocationResult, AllocationError>;
}

/// Inputs for one allocation.
#[derive(Debug, Clone)]
pub struct AllocationRequest<'a> {
    budget: f64,
    profile: &'a MaterialProfile,
    eligible: Option<FxHashSet<String>>,
    minimize_leftover: bool,
    percentages: Option<&'a ManualPercentages>,
}

impl<'a> AllocationRequest<'a> {
    /// Request a greedy allocation of `budget` over every size of `profile`.
    pub fn new(budget: f64, profile: &'a MaterialProfile) -> Self {
        Self {
            budget,
            profile,
            eligible: None,
            minimize_leftover: false,
            percentages: None,
        }
    }

    /// Restrict the allocation to the given sizes. An empty list means every size.
    #[must_use]
    pub fn with_eligible<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sizes: FxHashSet<String> = sizes.into_iter().map(Into::into).collect();

        self.eligible = (!sizes.is_empty()).then_some(sizes);
        self
    }

    /// Search for the least leftover instead of filling greedily.
    #[must_use]
    pub fn minimize_leftover(mut self, minimize: bool) -> Self {
        self.minimize_leftover = minimize;
        self
    }

    /// Use manual percentage shares. Only takes effect if a share is positive.
    #[must_use]
    pub fn with_percentages(mut self, percentages: &'a ManualPercentages) -> Self {
        self.percentages = Some(percentages);
        self
    }

    /// Material budget
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Material profile being allocated
    pub fn profile(&self) -> &'a MaterialProfile {
        self.profile
    }

    /// Strategy this request will run with.
    pub fn strategy(&self) -> Strategy {
        match self.percentages {
            Some(percentages) if percentages.is_active() => Strategy::Manual,
            _ if self.minimize_leftover => Strategy::ExhaustiveSearch,
            _ => Strategy::Greedy,
        }
    }

    /// Eligible sizes in profile order.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidEligibilitySet`] if a size filter was given and
    /// none of its sizes exist in the profile.
    pub fn eligible_sizes(&self) -> Result<SmallVec<[&'a Size; 8]>, AllocationError> {
        let Some(eligible) = &self.eligible else {
            return Ok(self.profile.sizes().iter().collect());
        };

        let sizes: SmallVec<[&'a Size; 8]> = self
            .profile
            .sizes()
            .iter()
            .filter(|size| eligible.contains(size.id()))
            .collect();

        if sizes.is_empty() {
            return Err(AllocationError::InvalidEligibilitySet(
                self.profile.name().to_string(),
            ));
        }

        Ok(sizes)
    }
}

/// Run an allocation request.
///
/// # Errors
///
/// - [`AllocationError::NonPositiveBudget`]: the budget is zero, negative or NaN.
/// - [`AllocationError::InvalidEligibilitySet`]: no requested size exists in the profile.
/// - [`AllocationError::PercentageOverflow`]: manual shares of the eligible sizes exceed 100.
/// - [`AllocationError::Computation`]: a unit count overflowed or an invariant broke.
pub fn allocate(request: &AllocationRequest<'_>) -> Result<AllocationResult, AllocationError> {
    allocate_with_observer(request, &mut NoopObserver)
}

/// Run an allocation request, reporting exhaustive search progress to `observer`.
///
/// # Errors
///
/// See [`allocate`].
#[tracing::instrument(
    name = "allocate",
    skip_all,
    fields(material = %request.profile().name(), budget = request.budget())
)]
pub fn allocate_with_observer<O: SearchObserver>(
    request: &AllocationRequest<'_>,
    observer: &mut O,
) -> Result<AllocationResult, AllocationError> {
    let budget = request.budget;

    if budget.is_nan() || budget <= 0.0 {
        return Err(AllocationError::NonPositiveBudget(budget));
    }

    let sizes = request.eligible_sizes()?;
    let strategy = request.strategy();

    debug!(%strategy, eligible = sizes.len(), "allocating");

    let result = match (strategy, request.percentages) {
        (Strategy::Manual, Some(percentages)) => {
            let total = percentages.total_for(sizes.iter().map(|size| size.id()));

            if total > FULL_SHARE {
                return Err(AllocationError::PercentageOverflow { total });
            }

            manual::allocate(&sizes, percentages, budget)?
        }
        (Strategy::Manual, None) => {
            return Err(ComputationError::InvariantViolation {
                message: "manual strategy selected without percentages",
            }
            .into());
        }
        (Strategy::Greedy, _) => {
            let ranking = Ranking::new(&sizes, request.profile.cost_per_metre());

            GreedyAllocator::allocate(&ranking, budget)?
        }
        (Strategy::ExhaustiveSearch, _) => {
            let ranking = Ranking::new(&sizes, request.profile.cost_per_metre());

            ExhaustiveAllocator::allocate_with_observer(&ranking, budget, observer)?
        }
    };

    let result = check_budget(result)?;

    debug!(
        units = result.total_units(),
        profit = result.profit(),
        leftover = result.leftover(),
        "allocation complete"
    );

    Ok(result)
}

/// Verify that production fits the budget, absorbing rounding noise in the leftover.
fn check_budget(mut result: AllocationResult) -> Result<AllocationResult, ComputationError> {
    let tolerance = BUDGET_TOLERANCE * result.budget.max(1.0);
    let consumed: f64 = result.allocations.iter().map(SizeAllocation::length).sum();

    if result.leftover < -tolerance || consumed > result.budget + tolerance {
        return Err(ComputationError::InvariantViolation {
            message: "allocation consumes more material than the budget",
        });
    }

    result.leftover = result.leftover.max(0.0);

    Ok(result)
}

/// Whole units of `consumption` that fit in `length`.
///
/// This is an exact floor of the true quotient, derived from the floating remainder, so
/// `1.0` metre of a `0.1` metre unit yields 9 units rather than the 10 that
/// `(1.0 / 0.1).floor()` gives.
pub(crate) fn whole_units(
    size: &str,
    length: f64,
    consumption: f64,
) -> Result<u32, ComputationError> {
    if length <= 0.0 {
        return Ok(0);
    }

    let remainder = length % consumption;
    let quotient = (length - remainder) / consumption;
    let mut floored = quotient.floor();

    if quotient - floored > 0.5 {
        floored += 1.0;
    }

    floored
        .to_u32()
        .ok_or_else(|| ComputationError::UnitCountOverflow {
            size: size.to_string(),
            length,
            consumption,
        })
}
