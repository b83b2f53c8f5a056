//! Run results, tallies and the console report.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::{Value, json};

use crate::classify::Verdict;

const RULE_WIDTH: usize = 60;

/// Outcome of one executed test case. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub tool: String,
    pub success: bool,
    /// Truncated failure message; set only when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The pass came from a tolerated upstream failure.
    pub tolerated: bool,
}

impl TestResult {
    pub fn from_verdict(tool: impl Into<String>, verdict: Verdict) -> Self {
        let success = verdict.is_pass();
        let tolerated = matches!(verdict, Verdict::ToleratedFailure(_));
        let error = match verdict {
            Verdict::Failure(message) => Some(message),
            Verdict::Success | Verdict::ToleratedFailure(_) => None,
        };
        Self {
            tool: tool.into(),
            success,
            error,
            tolerated,
        }
    }
}

/// Pass/fail counters for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub unexpected_failed: usize,
    pub expected_failed: usize,
}

impl Tally {
    pub fn record(&mut self, result: &TestResult, expect_api_error: bool) {
        if result.success {
            self.passed += 1;
        } else if expect_api_error {
            self.expected_failed += 1;
        } else {
            self.unexpected_failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.unexpected_failed + self.expected_failed
    }

    /// Percentage of passes among cases not excused as expected failures.
    /// Zero when there is nothing to measure.
    pub fn success_rate(&self) -> f64 {
        let measured = self.passed + self.unexpected_failed;
        if measured == 0 {
            0.0
        } else {
            100.0 * self.passed as f64 / measured as f64
        }
    }

    /// Process exit code: 1 if and only if something failed unexpectedly.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.unexpected_failed > 0)
    }
}

/// A result together with the expectation it was judged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedResult {
    #[serde(flatten)]
    pub result: TestResult,
    pub expect_api_error: bool,
}

impl RecordedResult {
    pub fn is_unexpected_failure(&self) -> bool {
        !self.result.success && !self.expect_api_error
    }
}

/// Accumulated results of one harness run, in catalogue order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    results: Vec<RecordedResult>,
    tally: Tally,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: TestResult, expect_api_error: bool) -> &RecordedResult {
        self.tally.record(&result, expect_api_error);
        self.results.push(RecordedResult {
            result,
            expect_api_error,
        });
        &self.results[self.results.len() - 1]
    }

    pub fn results(&self) -> &[RecordedResult] {
        &self.results
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn exit_code(&self) -> u8 {
        self.tally.exit_code()
    }

    pub fn unexpected_failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results
            .iter()
            .filter(|r| r.is_unexpected_failure())
            .map(|r| &r.result)
    }

    /// Write the fixed-format summary block.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let t = self.tally;
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(out)?;
        writeln!(out, "{rule}")?;
        writeln!(out, "SUMMARY")?;
        writeln!(out, "{rule}")?;
        writeln!(out, "Passed: {}", t.passed)?;
        writeln!(out, "Failed: {}", t.unexpected_failed)?;
        writeln!(out, "Expected failures (external API): {}", t.expected_failed)?;
        writeln!(out, "Total: {}", t.total())?;
        writeln!(
            out,
            "Success rate (excluding API issues): {}/{} ({:.1}%)",
            t.passed,
            t.passed + t.unexpected_failed,
            t.success_rate()
        )?;

        if t.unexpected_failed > 0 {
            writeln!(out)?;
            writeln!(out, "Unexpected failures:")?;
            for result in self.unexpected_failures() {
                writeln!(
                    out,
                    "  - {}: {}",
                    result.tool,
                    result.error.as_deref().unwrap_or("")
                )?;
            }
        }
        Ok(())
    }

    /// Machine-readable form of the whole report.
    pub fn to_json(&self) -> Value {
        let t = self.tally;
        json!({
            "passed": t.passed,
            "failed": t.unexpected_failed,
            "expected_failures": t.expected_failed,
            "total": t.total(),
            "success_rate": t.success_rate(),
            "exit_code": t.exit_code(),
            "results": self.results,
        })
    }
}

/// Write the per-case status line(s) for one result.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn write_case_line<W: Write>(out: &mut W, recorded: &RecordedResult) -> io::Result<()> {
    let result = &recorded.result;
    if result.success {
        if result.tolerated {
            writeln!(out, "  OK: {} (tolerated upstream failure)", result.tool)
        } else {
            writeln!(out, "  OK: {}", result.tool)
        }
    } else if recorded.expect_api_error {
        writeln!(out, "  EXPECTED FAIL: {} (external API issue)", result.tool)
    } else {
        writeln!(out, "  FAIL: {}", result.tool)?;
        writeln!(out, "        {}", result.error.as_deref().unwrap_or(""))
    }
}
