//! What one orchestration run did.

use std::fmt;

use lightfps_page::{NodeId, PageResult};
use serde::Serialize;
use tracing::debug;

/// Engine subsystems, in the order a run executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Media,
    LazyLoad,
    Tracker,
    DarkMode,
    ReduceMemory,
    DisableAnimations,
    Sharpen,
    ReduceMotion,
    FontSmoothing,
    GifFreeze,
    MinimalUi,
    Audio,
}

impl Step {
    pub const ORDER: [Step; 12] = [
        Step::Media,
        Step::LazyLoad,
        Step::Tracker,
        Step::DarkMode,
        Step::ReduceMemory,
        Step::DisableAnimations,
        Step::Sharpen,
        Step::ReduceMotion,
        Step::FontSmoothing,
        Step::GifFreeze,
        Step::MinimalUi,
        Step::Audio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Media => "media",
            Step::LazyLoad => "lazy_load",
            Step::Tracker => "tracker",
            Step::DarkMode => "dark_mode",
            Step::ReduceMemory => "reduce_memory",
            Step::DisableAnimations => "disable_animations",
            Step::Sharpen => "sharpen",
            Step::ReduceMotion => "reduce_motion",
            Step::FontSmoothing => "font_smoothing",
            Step::GifFreeze => "gif_freeze",
            Step::MinimalUi => "minimal_ui",
            Step::Audio => "audio",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-element tallies for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Elements (or assets) changed.
    pub applied: usize,
    /// Elements already in the wanted state.
    pub skipped: usize,
    /// Elements whose operation failed and was left alone.
    pub failed: usize,
}

impl StepReport {
    /// Tally one element's outcome: `Ok(true)` changed, `Ok(false)` already
    /// fine, `Err` logged and counted.
    pub fn record(&mut self, step: Step, element: NodeId, outcome: PageResult<bool>) {
        match outcome {
            Ok(true) => self.applied += 1,
            Ok(false) => self.skipped += 1,
            Err(e) => {
                debug!(%step, ?element, error = %e, "element skipped");
                self.failed += 1;
            }
        }
    }

    pub fn merge(&mut self, other: StepReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    #[serde(flatten)]
    pub report: StepReport,
}

/// The outcome of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// 1 for the first run on this page.
    pub run: u64,
    /// False when the master switch was off and nothing ran.
    pub enabled: bool,
    /// Enabled steps, in execution order.
    pub steps: Vec<StepOutcome>,
    /// Steps switched off since the previous run and torn down.
    pub reverted: Vec<Step>,
}

impl RunReport {
    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|o| o.step == step).map(|o| &o.report)
    }

    pub fn push(&mut self, step: Step, report: StepReport) {
        self.steps.push(StepOutcome { step, report });
    }

    pub fn total(&self) -> StepReport {
        let mut total = StepReport::default();
        for outcome in &self.steps {
            total.merge(outcome.report);
        }
        total
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            return writeln!(f, "run {}: auto optimize is off", self.run);
        }
        writeln!(f, "run {}:", self.run)?;
        for outcome in &self.steps {
            let r = outcome.report;
            writeln!(
                f,
                "  {:<20} applied {:>4}  skipped {:>4}  failed {:>4}",
                outcome.step.name(),
                r.applied,
                r.skipped,
                r.failed
            )?;
        }
        for step in &self.reverted {
            writeln!(f, "  {:<20} reverted", step.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfps_page::PageError;

    #[test]
    fn test_record_outcomes() {
        let id = NodeId::new(1, 0);
        let mut report = StepReport::default();
        report.record(Step::LazyLoad, id, Ok(true));
        report.record(Step::LazyLoad, id, Ok(false));
        report.record(Step::LazyLoad, id, Err(PageError::NodeGone(id)));
        assert_eq!(
            report,
            StepReport {
                applied: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_run_report_lookup_and_display() {
        let mut run = RunReport {
            run: 2,
            enabled: true,
            ..RunReport::default()
        };
        run.push(
            Step::DarkMode,
            StepReport {
                applied: 3,
                ..StepReport::default()
            },
        );
        run.reverted.push(Step::Sharpen);

        assert_eq!(run.step(Step::DarkMode).map(|r| r.applied), Some(3));
        assert!(run.step(Step::Audio).is_none());
        let text = run.to_string();
        assert!(text.contains("dark_mode"));
        assert!(text.contains("sharpen"));
        assert!(text.contains("reverted"));
    }

    #[test]
    fn test_disabled_run_display() {
        let run = RunReport {
            run: 1,
            ..RunReport::default()
        };
        assert!(run.to_string().contains("auto optimize is off"));
    }

    #[test]
    fn test_report_serializes_flat_steps() {
        let mut run = RunReport {
            run: 1,
            enabled: true,
            ..RunReport::default()
        };
        run.push(Step::MinimalUi, StepReport::default());
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["steps"][0]["step"], "minimal_ui");
        assert_eq!(value["steps"][0]["applied"], 0);
    }
}
