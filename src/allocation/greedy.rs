//! Greedy Allocator

use smallvec::SmallVec;
use tracing::trace;

use crate::allocation::{
    AllocationError, AllocationResult, Allocator, SizeAllocation, Strategy, ranking::Ranking,
    whole_units,
};

/// Fills the budget in a single pass over the ranking, best size first.
#[derive(Debug)]
pub struct GreedyAllocator;

impl Allocator for GreedyAllocator {
    fn allocate(ranking: &Ranking<'_>, budget: f64) -> Result<AllocationResult, AllocationError> {
        let mut allocations: SmallVec<[SizeAllocation; 8]> = SmallVec::new();
        let mut profit = 0.0;
        let mut leftover = budget;

        for ranked in ranking.iter() {
            let size = ranked.size;
            let consumption = size.consumption();

            // The exact floor cannot return zero when a unit fits; keep one unit as a fallback.
            let units = match whole_units(size.id(), leftover, consumption)? {
                0 if leftover >= consumption => 1,
                units => units,
            };

            if units == 0 {
                trace!(size = size.id(), leftover, "size does not fit");
                continue;
            }

            let allocation = SizeAllocation {
                size: size.id().to_string(),
                units,
                consumption,
                unit_profit: size.profit(),
            };

            profit += allocation.profit();
            leftover = (leftover - allocation.length()).max(0.0);

            trace!(size = size.id(), units, leftover, "committed units");

            allocations.push(allocation);
        }

        Ok(AllocationResult::from_parts(
            Strategy::Greedy,
            budget,
            allocations,
            profit,
            leftover,
        ))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::profiles::{MaterialProfile, Size};

    use super::*;

    fn greedy(profile: &MaterialProfile, budget: f64) -> Result<AllocationResult, AllocationError> {
        let sizes: SmallVec<[&Size; 8]> = profile.sizes().iter().collect();
        let ranking = Ranking::new(&sizes, profile.cost_per_metre());

        GreedyAllocator::allocate(&ranking, budget)
    }

    #[test]
    fn single_size_fills_budget() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 5.0)?;
        profile.add_size("A", 1.5, 20.0)?;

        let result = greedy(&profile, 100.0)?;

        assert_eq!(result.units("A"), 66);
        assert!((result.leftover() - 1.0).abs() < 1e-9);
        assert!((result.profit() - 1320.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn best_ratio_is_filled_first() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 0.0)?;
        profile.add_size("B", 3.0, 40.0)?.add_size("A", 2.0, 30.0)?;

        let result = greedy(&profile, 10.0)?;

        assert_eq!(result.units("A"), 5);
        assert_eq!(result.units("B"), 0);
        assert_eq!(result.allocations().len(), 1);
        assert!(result.leftover().abs() < 1e-9);
        assert!((result.profit() - 150.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn remainder_flows_to_lower_ranked_sizes() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 0.0)?;
        profile.add_size("A", 3.0, 45.0)?.add_size("B", 2.0, 20.0)?;

        let result = greedy(&profile, 11.0)?;

        // A takes 9m (3 units), B takes the remaining 2m (1 unit)
        assert_eq!(result.units("A"), 3);
        assert_eq!(result.units("B"), 1);
        assert!(result.leftover().abs() < 1e-9);

        let order: Vec<&str> = result
            .allocations()
            .iter()
            .map(|allocation| allocation.size.as_str())
            .collect();

        assert_eq!(order, ["A", "B"]);

        Ok(())
    }

    #[test]
    fn nothing_fits_leaves_whole_budget() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 0.0)?;
        profile.add_size("Gown", 4.0, 100.0)?;

        let result = greedy(&profile, 3.5)?;

        assert!(result.is_empty());
        assert!((result.leftover() - 3.5).abs() < 1e-9);
        assert!(result.profit().abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn awkward_fractions_never_overdraw() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 0.0)?;
        profile.add_size("A", 0.1, 1.0)?;

        let result = greedy(&profile, 1.0)?;
        let consumed: f64 = result.allocations().iter().map(SizeAllocation::length).sum();

        assert!(result.leftover() >= 0.0);
        assert!(consumed <= 1.0 + 1e-12);

        Ok(())
    }
}
