//! Runs a list of probes in order and turns the results into an exit code.

use crate::console::Reporter;
use crate::probes::{Probe, ProbeContext, ProbeOutcome, ProbeResult};

/// How probe results map to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// 0 all passed, 1 some passed, 2 none passed, 3 fatal.
    Graded,
    /// 0 all passed, 1 otherwise.
    Binary,
}

impl ExitPolicy {
    pub fn exit_code(self, results: &[ProbeResult]) -> u8 {
        let passed = results.iter().filter(|r| r.outcome.is_pass()).count();
        let all = !results.is_empty() && passed == results.len();
        match self {
            ExitPolicy::Graded if all => 0,
            ExitPolicy::Graded if passed > 0 => 1,
            ExitPolicy::Graded => 2,
            ExitPolicy::Binary if all => 0,
            ExitPolicy::Binary => 1,
        }
    }

    /// Code for configuration errors and unexpected failures.
    pub fn fatal_code(self) -> u8 {
        match self {
            ExitPolicy::Graded => 3,
            ExitPolicy::Binary => 1,
        }
    }
}

pub async fn run_suite(ctx: &ProbeContext<'_>, probes: &[Probe]) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(probes.len());
    for (i, probe) in probes.iter().enumerate() {
        if i > 0 && !ctx.pause.is_zero() {
            tokio::time::sleep(ctx.pause).await;
        }
        ctx.reporter.banner(&format!("Running test: {}", probe.name()));
        let result = probe.run(ctx).await;
        tracing::debug!(
            probe = %result.name,
            outcome = result.outcome.label(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "probe finished"
        );
        results.push(result);
    }
    results
}

pub fn print_summary(r: &dyn Reporter, target: &str, results: &[ProbeResult]) {
    r.banner("Test Summary");
    for result in results {
        let line = format!(
            "{:<8} - {} ({:.2}s)",
            result.outcome.label(),
            result.name,
            result.elapsed.as_secs_f64()
        );
        match result.outcome {
            ProbeOutcome::Passed => r.success(&line),
            ProbeOutcome::Partial => r.warning(&line),
            ProbeOutcome::Failed => r.error(&line),
        }
        if let Some(detail) = result.detail.as_deref() {
            r.debug(&format!("         {detail}"));
        }
    }

    let passed = results.iter().filter(|r| r.outcome.is_pass()).count();
    if !results.is_empty() && passed == results.len() {
        r.success(&format!(
            "All tests passed! {target} API is properly configured."
        ));
    } else if passed > 0 {
        r.warning(&format!(
            "{passed}/{} tests passed. Some {target} API features are working.",
            results.len()
        ));
    } else {
        r.error(&format!(
            "All tests failed! Please check your {target} API configuration."
        ));
    }
}
