//! Progress notification port
//!
//! Defines the interface for reporting progress during a deliberation run.

use agora_domain::{Flavor, RoleId, TerminationReason};

/// Callback for progress updates during a deliberation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once before the first turn
    fn on_run_start(&self, _flavor: Flavor, _max_rounds_or_turns: u32) {}

    /// Called before an ordinary agent starts its turn
    fn on_turn_start(&self, role: &RoleId, counter: u32);

    /// Called when an ordinary agent's turn finished or failed
    fn on_turn_complete(&self, role: &RoleId, counter: u32, success: bool);

    /// Called after the counter advanced; `reason` is set when the loop ends
    fn on_cycle_advance(&self, counter: u32, reason: Option<&TerminationReason>);

    /// Called before the terminal synthesis agent runs
    fn on_synthesis_start(&self, _role: &RoleId) {}

    /// Called when the terminal synthesis finished or failed
    fn on_synthesis_complete(&self, _role: &RoleId, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_turn_start(&self, _role: &RoleId, _counter: u32) {}
    fn on_turn_complete(&self, _role: &RoleId, _counter: u32, _success: bool) {}
    fn on_cycle_advance(&self, _counter: u32, _reason: Option<&TerminationReason>) {}
}
