use crate::model::{CheckStatus, OverallStatus, Priority, StatusCounts, ValidationCheck, ValidationSummary};

/// Severity dominance: any FAIL wins, then any WARNING, else PASS. INFO never
/// moves the verdict. With `strict`, a WARNING counts as a FAIL.
pub fn overall_status(checks: &[ValidationCheck], strict: bool) -> OverallStatus {
    let mut worst = OverallStatus::Pass;
    for check in checks {
        match check.status {
            CheckStatus::Fail => return OverallStatus::Fail,
            CheckStatus::Warning if strict => return OverallStatus::Fail,
            CheckStatus::Warning => worst = OverallStatus::Warning,
            CheckStatus::Pass | CheckStatus::Info => {}
        }
    }
    worst
}

/// Compute summary statistics from the check list.
pub fn compute_summary(checks: &[ValidationCheck]) -> ValidationSummary {
    let mut counts = StatusCounts::default();
    let mut critical_failures = 0;

    for c in checks {
        match c.status {
            CheckStatus::Pass => counts.pass += 1,
            CheckStatus::Warning => counts.warning += 1,
            CheckStatus::Fail => {
                counts.fail += 1;
                if c.priority == Priority::Critical {
                    critical_failures += 1;
                }
            }
            CheckStatus::Info => counts.info += 1,
        }
    }

    ValidationSummary {
        total_checks: checks.len(),
        status_counts: counts,
        critical_failures,
        checks_passed: counts.pass + counts.info,
        checks_failed: counts.fail,
        checks_warning: counts.warning,
    }
}
