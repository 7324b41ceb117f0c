//! Per-tick observer hooks for the control loop

use crate::control::control_loop::{LoopSummary, TickReport};
use crate::obstacles::ObstacleSnapshot;

/// Callbacks invoked by [`ControlLoop`][crate::control::ControlLoop] after
/// every control cycle and once when the loop stops.
///
/// Both methods default to no-ops, so rendering or recording front ends only
/// override what they need. The loop itself never depends on an observer.
pub trait TickObserver {
    /// Called after a tick has been fully applied.
    ///
    /// `snapshot` is the obstacle layout the planner was given on that tick.
    fn on_tick(&mut self, _report: &TickReport, _snapshot: &ObstacleSnapshot) {}

    /// Called once after the loop reaches a terminal state.
    fn on_finish(&mut self, _summary: &LoopSummary) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}

/// Keeps every report and snapshot in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub reports: Vec<TickReport>,
    pub snapshots: Vec<ObstacleSnapshot>,
    pub summary: Option<LoopSummary>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickObserver for RecordingObserver {
    fn on_tick(&mut self, report: &TickReport, snapshot: &ObstacleSnapshot) {
        self.reports.push(report.clone());
        self.snapshots.push(snapshot.clone());
    }

    fn on_finish(&mut self, summary: &LoopSummary) {
        self.summary = Some(summary.clone());
    }
}
