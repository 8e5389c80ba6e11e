//! Results of individual gate checks and the combined evaluation.

use chrono::{DateTime, Utc};
use gantry_core::{FailureKind, FailureReport};
use gantry_runner::{CommandOutput, RunnerError};
use serde::{Deserialize, Serialize};

/// Outcome of one check command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub kind: FailureKind,
    pub command: String,
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Combined stdout and stderr, untruncated
    pub output: String,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn from_output(kind: FailureKind, output: &CommandOutput) -> Self {
        Self {
            kind,
            command: output.command.clone(),
            passed: output.success,
            exit_code: output.exit_code,
            timed_out: output.timed_out,
            output: output.combined_output(),
            duration_ms: output.duration_ms,
            completed_at: output.finished_at,
        }
    }

    /// A check whose command could not be run at all.
    pub fn from_runner_error(kind: FailureKind, command: &str, err: &RunnerError) -> Self {
        Self {
            kind,
            command: command.to_string(),
            passed: false,
            exit_code: None,
            timed_out: false,
            output: format!("Could not run `{}`: {}", command, err),
            duration_ms: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            FailureKind::Lint => "lint",
            FailureKind::Test => "test",
        }
    }

    fn message(&self) -> String {
        if self.passed {
            "passed".to_string()
        } else if self.timed_out {
            "timed out".to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("failed (exit {})", code),
                None => "failed".to_string(),
            }
        }
    }

    /// Failure report for the repair loop, if this check failed.
    pub fn failure_report(&self) -> Option<FailureReport> {
        (!self.passed).then(|| FailureReport {
            kind: self.kind,
            output: self.output.clone(),
        })
    }
}

/// Checks run in one gate pass, in order. A failed lint stops the pass.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GateEvaluation {
    pub checks: Vec<CheckResult>,
}

impl GateEvaluation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Whether every check ran and passed.
    pub fn passed(&self) -> bool {
        self.checks.len() == 2 && self.checks.iter().all(|c| c.passed)
    }

    /// The first failing check's report.
    pub fn failure(&self) -> Option<FailureReport> {
        self.checks.iter().find_map(CheckResult::failure_report)
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.checks.iter().map(|c| c.duration_ms).sum()
    }

    /// Human-readable summary with untruncated failure output.
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "Quality gate: {}\n",
            if self.passed() { "PASSED" } else { "FAILED" }
        ));
        report.push_str(&format!("Duration: {}ms\n\n", self.total_duration_ms()));

        report.push_str("Checks:\n");
        for check in &self.checks {
            let mark = if check.passed { "ok" } else { "FAIL" };
            report.push_str(&format!(
                "  [{}] {} `{}` - {} ({}ms)\n",
                mark,
                check.name(),
                check.command,
                check.message(),
                check.duration_ms
            ));
        }
        if self.checks.len() == 1 && !self.checks[0].passed {
            report.push_str("  [skip] test - not run after lint failure\n");
        }

        if let Some(failure) = self.checks.iter().find(|c| !c.passed) {
            report.push_str(&format!("\n{} output:\n{}\n", failure.name(), failure.output));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_failure_report() {
        let output = CommandOutput::exited("npm run lint", Some(1), "", "unused import 'fs'", Utc::now());
        let mut evaluation = GateEvaluation::new();
        evaluation.push(CheckResult::from_output(FailureKind::Lint, &output));

        assert!(!evaluation.passed());
        let failure = evaluation.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Lint);
        assert_eq!(failure.output, "unused import 'fs'");

        let report = evaluation.report();
        assert!(report.contains("FAILED"));
        assert!(report.contains("failed (exit 1)"));
        assert!(report.contains("not run after lint failure"));
        assert!(report.contains("unused import 'fs'"));
    }

    #[test]
    fn test_runner_error_is_a_failure() {
        let err = RunnerError::SpawnFailed {
            command: "npm test".to_string(),
            message: "No such file".to_string(),
        };
        let check = CheckResult::from_runner_error(FailureKind::Test, "npm test", &err);

        assert!(!check.passed);
        assert!(check.output.contains("No such file"));
        assert_eq!(check.failure_report().unwrap().kind, FailureKind::Test);
    }

    #[test]
    fn test_report_keeps_long_output() {
        let long = "x".repeat(5000);
        let output = CommandOutput::exited("npm test", Some(1), long.clone(), "", Utc::now());
        let mut evaluation = GateEvaluation::new();
        evaluation.push(CheckResult::from_output(
            FailureKind::Lint,
            &CommandOutput::exited("npm run lint", Some(0), "", "", Utc::now()),
        ));
        evaluation.push(CheckResult::from_output(FailureKind::Test, &output));

        assert!(evaluation.report().contains(&long));
    }
}
