//! Receding-horizon re-planning loop
//!
//! Each tick advances the obstacles, snapshots them, asks the planner for a
//! fresh path from the current start and moves the start to the second
//! waypoint of that path. The loop stops when the start is within
//! `end_dist_threshold` of the goal, when the iteration budget runs out, or
//! when an abort is requested between ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::common::{
    ConfigError, Hyperparameters, Planner, PlannerOutput, PlannerState, Point2D, SimError,
    SimResult,
};
use crate::control::observer::TickObserver;
use crate::obstacles::ObstacleHandler;

/// Loop-level settings, separate from the planner's own hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Maximum number of control cycles
    pub sim_loop: usize,
    /// Distance to the goal at which the loop stops
    pub end_dist_threshold: f64,
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sim_loop == 0 {
            return Err(ConfigError::ZeroIterationBudget);
        }
        if !(self.end_dist_threshold.is_finite() && self.end_dist_threshold > 0.0) {
            return Err(ConfigError::NonPositiveThreshold(self.end_dist_threshold));
        }
        Ok(())
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            sim_loop: 100,
            end_dist_threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    GoalReached,
    /// Iteration budget used up before reaching the goal
    Exhausted,
    /// Stopped on request, or after a planner contract violation
    Aborted,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoopState::Running)
    }
}

/// Shared flag asking a running loop to stop at the next tick boundary
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Diagnostics for one control cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Zero-based iteration index
    pub tick: usize,
    /// Wall-clock time spent inside the planner
    pub planner_time: Duration,
    pub success: bool,
    /// Start after applying the planner result
    pub start: Point2D,
    pub distance_to_goal: f64,
    pub path: PlannerOutput,
    pub state: LoopState,
}

/// Outcome of a complete run
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSummary {
    pub outcome: LoopState,
    /// Ticks run, matching the handler's tick count. A tick ended by a
    /// planner contract violation is included.
    pub ticks: usize,
    pub final_start: Point2D,
    pub goal: Point2D,
    pub planning_failures: usize,
    pub total_planner_time: Duration,
}

impl LoopSummary {
    pub fn average_planner_time(&self) -> Duration {
        if self.ticks == 0 {
            return Duration::ZERO;
        }
        self.total_planner_time.div_f64(self.ticks as f64)
    }

    pub fn distance_to_goal(&self) -> f64 {
        self.final_start.distance(&self.goal)
    }
}

/// Sense, plan and act loop around an owned [`ObstacleHandler`]
pub struct ControlLoop {
    handler: ObstacleHandler,
    state: PlannerState,
    config: LoopConfig,
    status: LoopState,
    tick: usize,
    planning_failures: usize,
    total_planner_time: Duration,
    abort: AbortHandle,
}

impl ControlLoop {
    /// Validates all settings up front; a bad configuration never starts a run.
    pub fn new(
        handler: ObstacleHandler,
        start: Point2D,
        goal: Point2D,
        hyperparameters: Hyperparameters,
        config: LoopConfig,
    ) -> SimResult<Self> {
        hyperparameters.validate()?;
        config.validate()?;
        let obstacle_snapshot = handler.collect();
        Ok(Self {
            handler,
            state: PlannerState {
                start,
                goal,
                hyperparameters,
                obstacle_snapshot,
            },
            config,
            status: LoopState::Running,
            tick: 0,
            planning_failures: 0,
            total_planner_time: Duration::ZERO,
            abort: AbortHandle::default(),
        })
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn handler(&self) -> &ObstacleHandler {
        &self.handler
    }

    pub fn planner_state(&self) -> &PlannerState {
        &self.state
    }

    pub fn start(&self) -> Point2D {
        self.state.start
    }

    pub fn goal(&self) -> Point2D {
        self.state.goal
    }

    pub fn status(&self) -> LoopState {
        self.status
    }

    /// Ticks run so far, including one that ended in a contract violation
    pub fn ticks(&self) -> usize {
        self.tick
    }

    pub fn planning_failures(&self) -> usize {
        self.planning_failures
    }

    /// Run one control cycle.
    ///
    /// Returns the state after the tick. Once terminal, further calls do
    /// nothing and return the same state.
    pub fn step<P, O>(&mut self, planner: &mut P, observer: &mut O) -> SimResult<LoopState>
    where
        P: Planner + ?Sized,
        O: TickObserver + ?Sized,
    {
        if self.status.is_terminal() {
            return Ok(self.status);
        }
        if self.abort.is_aborted() {
            info!(tick = self.tick, "abort requested, stopping before next tick");
            self.status = LoopState::Aborted;
            return Ok(self.status);
        }

        let tick = self.tick;
        self.handler.advance_all();
        self.state.obstacle_snapshot = self.handler.collect();

        let started = Instant::now();
        let output = planner.plan(&self.state);
        let planner_time = started.elapsed();
        self.total_planner_time += planner_time;

        let mut violation = None;
        if output.success {
            match Self::lookahead(&output) {
                Ok(next) => self.state.start = next,
                Err(reason) => {
                    error!(tick, %reason, "planner reported success with an unusable path");
                    violation = Some(reason);
                }
            }
        } else {
            self.planning_failures += 1;
            warn!(
                tick,
                start_x = self.state.start.x,
                start_y = self.state.start.y,
                "planning failed, keeping start"
            );
        }

        self.tick += 1;
        let distance_to_goal = self.state.start.distance(&self.state.goal);
        self.status = if violation.is_some() {
            LoopState::Aborted
        } else if distance_to_goal <= self.config.end_dist_threshold {
            LoopState::GoalReached
        } else if self.tick >= self.config.sim_loop {
            LoopState::Exhausted
        } else {
            LoopState::Running
        };

        info!(
            tick,
            planner_ms = planner_time.as_secs_f64() * 1e3,
            success = output.success,
            distance_to_goal,
            "control cycle"
        );

        let report = TickReport {
            tick,
            planner_time,
            success: output.success,
            start: self.state.start,
            distance_to_goal,
            path: output,
            state: self.status,
        };
        observer.on_tick(&report, &self.state.obstacle_snapshot);

        match violation {
            Some(reason) => Err(SimError::PlannerContractViolation { tick, reason }),
            None => Ok(self.status),
        }
    }

    /// Step until a terminal state and report the outcome.
    ///
    /// The observer's `on_finish` runs even when the loop ends with an error.
    pub fn run<P, O>(&mut self, planner: &mut P, observer: &mut O) -> SimResult<LoopSummary>
    where
        P: Planner + ?Sized,
        O: TickObserver + ?Sized,
    {
        loop {
            match self.step(planner, observer) {
                Ok(state) if state.is_terminal() => break,
                Ok(_) => {}
                Err(e) => {
                    observer.on_finish(&self.summary());
                    return Err(e);
                }
            }
        }

        let summary = self.summary();
        match summary.outcome {
            LoopState::GoalReached => info!(ticks = summary.ticks, "goal reached"),
            LoopState::Exhausted => warn!(
                ticks = summary.ticks,
                distance_to_goal = summary.distance_to_goal(),
                "iteration budget exhausted"
            ),
            _ => info!(ticks = summary.ticks, "control loop aborted"),
        }
        observer.on_finish(&summary);
        Ok(summary)
    }

    pub fn summary(&self) -> LoopSummary {
        LoopSummary {
            outcome: self.status,
            ticks: self.tick,
            final_start: self.state.start,
            goal: self.state.goal,
            planning_failures: self.planning_failures,
            total_planner_time: self.total_planner_time,
        }
    }

    /// Second waypoint of a successful path
    fn lookahead(output: &PlannerOutput) -> Result<Point2D, String> {
        if output.path_x.len() != output.path_y.len() {
            return Err(format!(
                "path_x has {} waypoints but path_y has {}",
                output.path_x.len(),
                output.path_y.len()
            ));
        }
        output
            .waypoint(1)
            .ok_or_else(|| format!("path has {} waypoint(s), need at least 2", output.len()))
    }
}
