//! Manual Percentage Allocation

use smallvec::SmallVec;
use tracing::trace;

use crate::{
    allocation::{AllocationError, AllocationResult, SizeAllocation, Strategy, whole_units},
    percentages::ManualPercentages,
    profiles::Size,
};

/// Give each size its own percentage slice of the budget.
///
/// Each size with a positive share gets `budget * share / 100` metres and produces the
/// whole units that fit in that slice. Slices are independent, so processing order
/// does not change the result. Sizes without a positive share produce nothing.
///
/// The caller is responsible for checking that the eligible shares total at most 100.
///
/// # Errors
///
/// Returns an [`AllocationError`] if a unit count cannot be represented.
pub fn allocate(
    sizes: &[&Size],
    percentages: &ManualPercentages,
    budget: f64,
) -> Result<AllocationResult, AllocationError> {
    let mut allocations: SmallVec<[SizeAllocation; 8]> = SmallVec::new();
    let mut profit = 0.0;
    let mut leftover = budget;

    for size in sizes {
        let fraction = percentages.fraction(size.id());

        if fraction <= 0.0 {
            continue;
        }

        let slice = budget * fraction;
        let units = whole_units(size.id(), slice, size.consumption())?;

        trace!(size = size.id(), slice, units, "manual slice");

        if units == 0 {
            continue;
        }

        let allocation = SizeAllocation {
            size: size.id().to_string(),
            units,
            consumption: size.consumption(),
            unit_profit: size.profit(),
        };

        profit += allocation.profit();
        leftover -= allocation.length();

        allocations.push(allocation);
    }

    Ok(AllocationResult::from_parts(
        Strategy::Manual,
        budget,
        allocations,
        profit,
        leftover,
    ))
}
