use log::info;

use crate::checks;
use crate::config::ValidationConfig;
use crate::evidence::{compute_summary, overall_status};
use crate::model::{FileMetadata, ValidationCheck, ValidationInput, ValidationResult};

/// Runs the seven checks in fixed order. Holds only immutable policy, so one
/// engine can serve concurrent sessions.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, input: &ValidationInput, meta: &FileMetadata) -> ValidationResult {
        info!("[Validation] Starting 7-check validation engine...");
        let traveler = input.traveler.as_ref();
        let image = input.image.as_ref();
        let bom = input.bom.as_ref();

        let mut checks: Vec<ValidationCheck> = Vec::new();
        checks.extend(checks::job_number_match(traveler, bom));
        checks.extend(checks::part_numbers_match(traveler, image, bom));
        checks.extend(checks::revisions_match(traveler, image, bom));
        checks.extend(checks::board_serials_match(traveler, image));
        checks.extend(checks::unit_serial_match(traveler, image));
        checks.push(checks::flight_status(meta));
        checks.push(checks::file_completeness(meta, &self.config.files));

        let overall = overall_status(&checks, self.config.strict);
        let summary = compute_summary(&checks);
        info!(
            "[Validation] Validation complete - Overall status: {overall} ({} checks, {} failed, {} warnings)",
            summary.total_checks, summary.checks_failed, summary.checks_warning
        );

        ValidationResult {
            overall_status: overall,
            checks,
            summary,
        }
    }
}

/// Validate with the default policy.
pub fn validate(input: &ValidationInput, meta: &FileMetadata) -> ValidationResult {
    ValidationEngine::default().validate(input, meta)
}
