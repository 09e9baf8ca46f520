//! Exhaustive Leftover Search
//!
//! Depth-first enumeration of every whole-unit assignment over the ranked sizes. At
//! each size the search tries unit counts from the most that fit the remaining budget
//! down to zero. Complete assignments are compared by leftover, then by profit.
//!
//! The search space grows with `budget / consumption` at every level, so it is only
//! practical for the handful of sizes a garment profile carries. It is deliberately not
//! pruned: the returned leftover is the true minimum over all non-empty assignments.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::allocation::{
    AllocationError, AllocationResult, Allocator, SizeAllocation, Strategy,
    observer::{NoopObserver, SearchObserver},
    ranking::Ranking,
    whole_units,
};

type UnitCounts = SmallVec<[u32; 8]>;

/// Finds the assignment with the least leftover, breaking ties by profit.
#[derive(Debug)]
pub struct ExhaustiveAllocator;

impl Allocator for ExhaustiveAllocator {
    fn allocate(ranking: &Ranking<'_>, budget: f64) -> Result<AllocationResult, AllocationError> {
        Self::allocate_with_observer(ranking, budget, &mut NoopObserver)
    }
}

impl ExhaustiveAllocator {
    /// Run the search, reporting evaluated leaves and improvements to `observer`.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationError`] if a unit count cannot be represented.
    pub fn allocate_with_observer<O: SearchObserver>(
        ranking: &Ranking<'_>,
        budget: f64,
        observer: &mut O,
    ) -> Result<AllocationResult, AllocationError> {
        let mut state = SearchState::new(budget, ranking.len());
        let mut best = BestAssignment::default();

        explore(ranking, &mut state, &mut best, observer)?;

        let Some(candidate) = best.into_candidate() else {
            return Ok(AllocationResult::empty(Strategy::ExhaustiveSearch, budget));
        };

        let allocations: SmallVec<[SizeAllocation; 8]> = ranking
            .iter()
            .zip(candidate.units.iter())
            .filter(|&(_, &units)| units > 0)
            .map(|(ranked, &units)| SizeAllocation {
                size: ranked.size.id().to_string(),
                units,
                consumption: ranked.size.consumption(),
                unit_profit: ranked.size.profit(),
            })
            .collect();

        Ok(AllocationResult::from_parts(
            Strategy::ExhaustiveSearch,
            budget,
            allocations,
            candidate.profit,
            candidate.leftover,
        ))
    }
}

/// Partial assignment carried down the search.
#[derive(Debug)]
struct SearchState {
    /// Ranked position of the next size to decide
    index: usize,

    /// Material not yet assigned
    remaining: f64,

    /// Units decided so far, one entry per decided size
    units: UnitCounts,

    /// Profit of the units decided so far
    profit: f64,
}

impl SearchState {
    fn new(budget: f64, sizes: usize) -> Self {
        Self {
            index: 0,
            remaining: budget,
            units: SmallVec::with_capacity(sizes),
            profit: 0.0,
        }
    }

    fn has_production(&self) -> bool {
        self.units.iter().any(|&units| units > 0)
    }
}

/// A complete assignment.
#[derive(Debug, Clone)]
struct Candidate {
    units: UnitCounts,
    leftover: f64,
    profit: f64,
}

/// Best complete assignment seen so far.
#[derive(Debug, Default)]
struct BestAssignment {
    candidate: Option<Candidate>,
}

impl BestAssignment {
    /// Offer a complete assignment. Returns true if it became the new best.
    ///
    /// A candidate wins with strictly less leftover, or equal leftover and strictly
    /// more profit. Otherwise the earlier assignment is kept.
    fn offer(&mut self, state: &SearchState) -> bool {
        let improves = self.candidate.as_ref().is_none_or(|best| {
            match state.remaining.total_cmp(&best.leftover) {
                Ordering::Less => true,
                Ordering::Equal => state.profit > best.profit,
                Ordering::Greater => false,
            }
        });

        if improves {
            self.candidate = Some(Candidate {
                units: state.units.clone(),
                leftover: state.remaining,
                profit: state.profit,
            });
        }

        improves
    }

    fn into_candidate(self) -> Option<Candidate> {
        self.candidate
    }
}

fn explore<O: SearchObserver>(
    ranking: &Ranking<'_>,
    state: &mut SearchState,
    best: &mut BestAssignment,
    observer: &mut O,
) -> Result<(), AllocationError> {
    let Some(ranked) = ranking.get(state.index) else {
        // The empty assignment is never a candidate.
        if state.has_production() {
            observer.on_leaf(&state.units, state.remaining, state.profit);

            if best.offer(state) {
                observer.on_improvement(&state.units, state.remaining, state.profit);
            }
        }

        return Ok(());
    };

    let size = ranked.size;
    let consumption = size.consumption();
    let max_units = whole_units(size.id(), state.remaining, consumption)?;

    let (remaining, profit) = (state.remaining, state.profit);

    state.index += 1;

    for units in (0..=max_units).rev() {
        state.remaining = (remaining - f64::from(units) * consumption).max(0.0);
        state.profit = profit + f64::from(units) * size.profit();
        state.units.push(units);

        explore(ranking, state, best, observer)?;

        state.units.pop();
    }

    state.index -= 1;
    state.remaining = remaining;
    state.profit = profit;

    Ok(())
}
