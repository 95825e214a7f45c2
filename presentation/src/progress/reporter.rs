//! Progress reporting for deliberation runs

use agora_application::ProgressNotifier;
use agora_domain::{Flavor, RoleId, TerminationReason};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Human-readable reason a run stopped looping
pub fn describe_termination(reason: &TerminationReason) -> String {
    match reason {
        TerminationReason::CeilingReached { max, .. } => format!("ceiling of {} reached", max),
        TerminationReason::CompletionSignal { role, phrase } => {
            format!("{} said \"{}\"", role.display_name(), phrase)
        }
    }
}

fn cycle_label(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::Adversarial => "Round",
        Flavor::Dialogic => "Turn",
    }
}

/// Reports progress with an indicatif bar: one tick per completed cycle
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
    label: Mutex<&'static str>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            label: Mutex::new("Round"),
        }
    }

    fn cycle_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }

    fn label(&self) -> &'static str {
        self.label.lock().map(|l| *l).unwrap_or("Round")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_run_start(&self, flavor: Flavor, max_rounds_or_turns: u32) {
        let bar = ProgressBar::new(max_rounds_or_turns as u64);
        bar.set_style(Self::cycle_style());
        bar.set_prefix(flavor.as_str().to_string());
        bar.set_message("Starting...");
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        if let Ok(mut label) = self.label.lock() {
            *label = cycle_label(flavor);
        }
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_turn_start(&self, role: &RoleId, counter: u32) {
        let label = self.label();
        self.with_bar(|bar| {
            bar.set_message(format!("{} {}: {}...", label, counter, role.display_name()))
        });
    }

    fn on_turn_complete(&self, role: &RoleId, _counter: u32, success: bool) {
        self.with_bar(|bar| {
            let status = if success {
                format!("{} {}", "v".green(), role.display_name())
            } else {
                format!("{} {}", "x".red(), role.display_name())
            };
            bar.set_message(status);
        });
    }

    fn on_cycle_advance(&self, _counter: u32, reason: Option<&TerminationReason>) {
        self.with_bar(|bar| {
            bar.inc(1);
            if let Some(reason) = reason {
                bar.set_message(describe_termination(reason));
            }
        });
    }

    fn on_synthesis_start(&self, role: &RoleId) {
        self.with_bar(|bar| bar.set_message(format!("{} is summarizing...", role.display_name())));
    }

    fn on_synthesis_complete(&self, role: &RoleId, success: bool) {
        if let Ok(mut slot) = self.bar.lock()
            && let Some(bar) = slot.take()
        {
            if success {
                bar.finish_with_message(format!("{} {}", role.display_name(), "done".green()));
            } else {
                bar.abandon_with_message(format!("{} {}", role.display_name(), "failed".red()));
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_run_start(&self, flavor: Flavor, max_rounds_or_turns: u32) {
        eprintln!(
            "{} {} (up to {} {}s)",
            "->".cyan(),
            flavor.as_str().bold(),
            max_rounds_or_turns,
            cycle_label(flavor).to_lowercase()
        );
    }

    fn on_turn_start(&self, _role: &RoleId, _counter: u32) {}

    fn on_turn_complete(&self, role: &RoleId, counter: u32, success: bool) {
        if success {
            eprintln!("  {} [{}] {}", "v".green(), counter, role.display_name());
        } else {
            eprintln!("  {} [{}] {} (failed)", "x".red(), counter, role.display_name());
        }
    }

    fn on_cycle_advance(&self, _counter: u32, reason: Option<&TerminationReason>) {
        if let Some(reason) = reason {
            eprintln!("{} {}", "->".cyan(), describe_termination(reason));
        }
    }

    fn on_synthesis_complete(&self, role: &RoleId, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), role.display_name());
        } else {
            eprintln!("  {} {} (failed)", "x".red(), role.display_name());
        }
    }
}
