//! Timing tables
//!
//! Renders per-case timing in the classic trial/average layout:
//!
//! ```text
//! tests/small.in
//!          TRIAL 0 TRIAL 1     AVG
//! Real:    0.0512s 0.0498s 0.0505s
//! User:    0.0301s 0.0295s 0.0298s
//! System:  0.0100s 0.0102s 0.0101s
//! ```

use crate::config::types::{ExecutionResult, TrialSet};
use std::fmt::Write;
use std::time::Duration;

const ROW_PREFIX_WIDTH: usize = 8;

/// Builder-configured renderer for timing tables.
#[derive(Clone, Debug)]
pub struct Timer {
    show_trials: bool,
    show_avg: bool,
    show_exit_codes: bool,
    precision: usize,
    column_width: usize,
    header: Option<String>,
    footer: Option<String>,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            show_trials: true,
            show_avg: true,
            show_exit_codes: false,
            precision: 4,
            column_width: 8,
            header: None,
            footer: None,
        }
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report only the per-case averages.
    pub fn only_avg(mut self) -> Self {
        self.show_trials = false;
        self.show_avg = true;
        self
    }

    /// Report only the individual trials.
    pub fn no_avg(mut self) -> Self {
        self.show_trials = true;
        self.show_avg = false;
        self
    }

    /// Report both trials and averages.
    pub fn all_times(mut self) -> Self {
        self.show_trials = true;
        self.show_avg = true;
        self
    }

    /// Digits after the decimal point.
    pub fn precision(mut self, digits: usize) -> Self {
        self.precision = digits;
        self
    }

    /// Minimum width of each value column.
    pub fn column_width(mut self, width: usize) -> Self {
        self.column_width = width;
        self
    }

    /// Add a Status row of per-trial exit codes. Only rendered when
    /// individual trials are shown.
    pub fn show_exit_codes(mut self) -> Self {
        self.show_exit_codes = true;
        self
    }

    /// Line printed once before the first case.
    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.header = Some(text.into());
        self
    }

    /// Line printed once after the last case.
    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn print(&self, sets: &[TrialSet]) {
        print!("{}", self.render(sets));
    }

    /// Render every case that has at least one completed trial. Cases with
    /// no results are omitted entirely; there is nothing to average.
    pub fn render(&self, sets: &[TrialSet]) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            let _ = writeln!(out, "{header}");
        }
        for set in sets {
            if set.results.is_empty() {
                continue;
            }
            self.render_set(&mut out, set);
        }
        if let Some(footer) = &self.footer {
            let _ = writeln!(out, "{footer}");
        }
        out
    }

    fn render_set(&self, out: &mut String, set: &TrialSet) {
        let _ = writeln!(out, "{}", set.label);

        let mut head = " ".repeat(ROW_PREFIX_WIDTH);
        if self.show_trials {
            for trial in 0..set.results.len() {
                let cell = format!("TRIAL {trial}");
                let _ = write!(head, "{cell:>width$}", width = self.cell_width());
            }
        }
        if self.show_avg {
            let _ = write!(head, "{:>width$}", "AVG", width = self.cell_width());
        }
        let _ = writeln!(out, "{head}");

        self.render_row(out, "Real:", set, |r| r.wall_time);
        self.render_row(out, "User:", set, |r| r.user_time);
        self.render_row(out, "System:", set, |r| r.system_time);
        if self.show_exit_codes && self.show_trials {
            self.render_status_row(out, set);
        }
        let _ = writeln!(out);
    }

    fn render_row<F>(&self, out: &mut String, name: &str, set: &TrialSet, pick: F)
    where
        F: Fn(&ExecutionResult) -> Duration,
    {
        let mut line = format!("{:<width$}", name, width = ROW_PREFIX_WIDTH);
        if self.show_trials {
            for result in &set.results {
                let _ = write!(line, "{:>width$}", self.cell(pick(result)), width = self.cell_width());
            }
        }
        if self.show_avg {
            // set.results is non-empty here; render() skips empty sets
            let total: f64 = set.results.iter().map(|r| pick(r).as_secs_f64()).sum();
            let avg = total / set.results.len() as f64;
            let cell = format!("{avg:.prec$}s", prec = self.precision);
            let _ = write!(line, "{cell:>width$}", width = self.cell_width());
        }
        let _ = writeln!(out, "{line}");
    }

    fn render_status_row(&self, out: &mut String, set: &TrialSet) {
        let mut line = format!("{:<width$}", "Status:", width = ROW_PREFIX_WIDTH);
        for result in &set.results {
            let _ = write!(
                line,
                "{:>width$}",
                result.exit_code,
                width = self.cell_width()
            );
        }
        let _ = writeln!(out, "{line}");
    }

    fn cell(&self, duration: Duration) -> String {
        format!("{:.prec$}s", duration.as_secs_f64(), prec = self.precision)
    }

    /// Wide enough for "TRIAL nn" and for the configured precision.
    fn cell_width(&self) -> usize {
        self.column_width.max(self.precision + 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(wall_ms: u64, user_ms: u64, sys_ms: u64, exit_code: i32) -> ExecutionResult {
        ExecutionResult {
            user_time: Duration::from_millis(user_ms),
            system_time: Duration::from_millis(sys_ms),
            wall_time: Duration::from_millis(wall_ms),
            exit_code,
        }
    }

    fn two_trial_set() -> TrialSet {
        TrialSet {
            label: "tests/a.in".to_string(),
            results: vec![result(100, 60, 10, 0), result(200, 80, 20, 0)],
            ..Default::default()
        }
    }

    #[test]
    fn renders_label_trials_and_average() {
        let rendered = Timer::new().render(&[two_trial_set()]);
        assert!(rendered.starts_with("tests/a.in\n"));
        assert!(rendered.contains("TRIAL 0"));
        assert!(rendered.contains("TRIAL 1"));
        assert!(rendered.contains("AVG"));
        assert!(rendered.contains("Real:"));
        assert!(rendered.contains("User:"));
        assert!(rendered.contains("System:"));
    }

    #[test]
    fn average_is_the_mean_of_the_trials() {
        let rendered = Timer::new().render(&[two_trial_set()]);
        // wall 0.1s and 0.2s average to 0.15s
        assert!(rendered.contains("0.1500s"));
        // user 0.06s and 0.08s average to 0.07s
        assert!(rendered.contains("0.0700s"));
    }

    #[test]
    fn precision_controls_the_decimals() {
        let rendered = Timer::new().precision(2).render(&[two_trial_set()]);
        assert!(rendered.contains("0.10s"));
        assert!(rendered.contains("0.15s"));
        assert!(!rendered.contains("0.1000s"));
    }

    #[test]
    fn avg_only_hides_the_trial_columns() {
        let rendered = Timer::new().only_avg().render(&[two_trial_set()]);
        assert!(!rendered.contains("TRIAL"));
        assert!(rendered.contains("AVG"));
        assert!(rendered.contains("0.1500s"));
    }

    #[test]
    fn no_avg_hides_the_average_column() {
        let rendered = Timer::new().no_avg().render(&[two_trial_set()]);
        assert!(rendered.contains("TRIAL 1"));
        assert!(!rendered.contains("AVG"));
        assert!(!rendered.contains("0.1500s"));
    }

    #[test]
    fn column_width_pads_the_cells() {
        let rendered = Timer::new()
            .column_width(12)
            .all_times()
            .render(&[two_trial_set()]);
        // "TRIAL 0" right-aligned in a 12-wide cell
        assert!(rendered.contains("     TRIAL 0"));
    }

    #[test]
    fn caseless_sets_are_omitted() {
        let empty = TrialSet {
            label: "never ran".to_string(),
            ..Default::default()
        };
        let rendered = Timer::new().render(&[empty]);
        assert_eq!(rendered, "");
    }

    #[test]
    fn exit_codes_appear_in_a_status_row() {
        let mut set = two_trial_set();
        set.results[1].exit_code = 7;
        let rendered = Timer::new().show_exit_codes().render(&[set]);
        assert!(rendered.contains("Status:"));
        assert!(rendered.contains('7'));
    }

    #[test]
    fn header_and_footer_wrap_the_report() {
        let rendered = Timer::new()
            .header("== timing ==")
            .footer("== end ==")
            .render(&[two_trial_set()]);
        assert!(rendered.starts_with("== timing ==\n"));
        assert!(rendered.ends_with("== end ==\n"));
    }

    #[test]
    fn each_case_ends_with_a_blank_line() {
        let rendered = Timer::new().render(&[two_trial_set(), two_trial_set()]);
        assert!(rendered.contains("\n\ntests/a.in\n"));
        assert!(rendered.ends_with("\n\n"));
    }
}
