//! Search Observer

/// Observer for the exhaustive leftover search.
///
/// The search calls back for every complete assignment it evaluates and every time the
/// best assignment changes. Observers only watch; they cannot steer the search.
///
/// When no observer is wanted, [`NoopObserver`] is used and the calls compile away.
pub trait SearchObserver {
    /// Called for every complete, non-empty assignment.
    ///
    /// # Parameters
    ///
    /// - `units`: Units per ranked size, in rank order
    /// - `leftover`: Material left over by the assignment
    /// - `profit`: Total profit of the assignment
    fn on_leaf(&mut self, units: &[u32], leftover: f64, profit: f64);

    /// Called when an assignment becomes the new best.
    fn on_improvement(&mut self, units: &[u32], leftover: f64, profit: f64);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {
    fn on_leaf(&mut self, _units: &[u32], _leftover: f64, _profit: f64) {}

    fn on_improvement(&mut self, _units: &[u32], _leftover: f64, _profit: f64) {}
}

/// Observer counting how much of the search space was visited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Complete assignments evaluated
    pub leaves: u64,

    /// Times the best assignment changed
    pub improvements: u64,
}

impl SearchObserver for SearchStats {
    fn on_leaf(&mut self, _units: &[u32], _leftover: f64, _profit: f64) {
        self.leaves += 1;
    }

    fn on_improvement(&mut self, _units: &[u32], _leftover: f64, _profit: f64) {
        self.improvements += 1;
    }
}
