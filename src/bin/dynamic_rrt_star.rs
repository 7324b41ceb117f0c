// RRT* re-planning among moving obstacles
//
// usage: dynamic_rrt_star [scenario.json]
// Without an argument the built-in crossing scenario is used.
// Set RUST_LOG=debug to see obstacle positions on every tick.

use std::process::ExitCode;

use tracing::{debug, error};

use dynamic_rrt_star::{
    LoopSummary, ObstacleSnapshot, RRTStar, Scenario, SimResult, TickObserver, TickReport,
};

/// Logs where every obstacle was when the planner looked at it
struct ObstacleTrace;

impl TickObserver for ObstacleTrace {
    fn on_tick(&mut self, report: &TickReport, snapshot: &ObstacleSnapshot) {
        for (i, (bounds, dynamic)) in snapshot.iter().enumerate() {
            debug!(tick = report.tick, obstacle = i, dynamic, bounds = ?bounds.to_array(), "obstacle");
        }
        debug!(
            tick = report.tick,
            x = report.start.x,
            y = report.start.y,
            waypoints = report.path.len(),
            "agent"
        );
    }
}

fn run() -> SimResult<LoopSummary> {
    let scenario = match std::env::args().nth(1) {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::default(),
    };
    let mut control = scenario.build_loop()?;
    let mut planner = RRTStar::new();
    control.run(&mut planner, &mut ObstacleTrace)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    println!("dynamic RRT* start!!");
    match run() {
        Ok(summary) => {
            println!("Finish: {:?} after {} iterations", summary.outcome, summary.ticks);
            println!(
                "Final position: ({:.2}, {:.2}), distance to goal {:.3}",
                summary.final_start.x,
                summary.final_start.y,
                summary.distance_to_goal()
            );
            println!("Planning failures: {}", summary.planning_failures);
            println!(
                "Average time per iteration: {:.3} s",
                summary.average_planner_time().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "simulation failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
