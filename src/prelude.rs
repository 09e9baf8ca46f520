//! Yardage prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocation::{
        AllocationError, AllocationRequest, AllocationResult, Allocator, ComputationError,
        SizeAllocation, Strategy, UsageShare, allocate, allocate_with_observer,
        greedy::GreedyAllocator,
        observer::{NoopObserver, SearchObserver, SearchStats},
        ranking::{RankedSize, Ranking},
        search::ExhaustiveAllocator,
    },
    config::ConfigError,
    percentages::ManualPercentages,
    profiles::{
        MaterialProfile, ProfileError, Size, SizeParameters,
        registry::{MaterialKey, ProfileRegistry},
    },
    report::{AllocationReport, ReportError, write_materials},
};
