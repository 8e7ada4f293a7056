//! `shipcheck validate`, `normalize` and `check-config`.

use std::path::{Path, PathBuf};

use shipcheck_engine::model::{CheckStatus, ValidationResult};
use shipcheck_engine::{run_session, Normalizer, SessionBundle, ShipcheckError, SourceKind, ValidationConfig};

use crate::exit_codes::{bundle_exit_code, verdict_exit_code, EXIT_SUCCESS, EXIT_USAGE};
use crate::CliError;

fn load_bundle(path: &Path) -> Result<SessionBundle, CliError> {
    SessionBundle::from_file(path).map_err(|e| bundle_err(&e))
}

fn bundle_err(err: &ShipcheckError) -> CliError {
    let hint = match err {
        ShipcheckError::BundleParse(_) => {
            Some("expected a JSON object with traveler, image and boms keys".to_string())
        }
        _ => None,
    };
    CliError { code: bundle_exit_code(err), message: err.to_string(), hint }
}

fn load_config(path: Option<&Path>, strict: bool) -> Result<ValidationConfig, CliError> {
    let mut config = match path {
        Some(path) => ValidationConfig::from_file(path)
            .map_err(|e| CliError { code: EXIT_USAGE, message: e.to_string(), hint: None })?,
        None => ValidationConfig::default(),
    };
    if strict {
        config.strict = true;
    }
    tracing::debug!(strict = config.strict, files = ?config.files, "loaded validation config");
    Ok(config)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(
    bundle_path: PathBuf,
    config_path: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref(), strict)?;
    let bundle = load_bundle(&bundle_path)?;

    let session = run_session(&bundle, &config);
    let result = &session.result;

    let json_str = to_json(result)?;
    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{json_str}");
    }

    print_summary(result, config.strict);

    let code = verdict_exit_code(result.overall_status);
    if code == EXIT_SUCCESS {
        return Ok(());
    }
    let message = match result.summary.checks_failed {
        0 if config.strict => "warnings found (strict mode)".to_string(),
        0 => "warnings found".to_string(),
        n => format!("{n} check(s) failed"),
    };
    Err(CliError { code, message, hint: None })
}

/// Human summary to stderr: the verdict line, then every entry that is not a PASS.
fn print_summary(result: &ValidationResult, strict: bool) {
    let s = &result.summary;
    eprintln!(
        "{}{}: {} checks, {} passed, {} warnings, {} failed ({} critical)",
        result.overall_status,
        if strict { " [strict]" } else { "" },
        s.total_checks,
        s.checks_passed,
        s.checks_warning,
        s.checks_failed,
        s.critical_failures,
    );
    for check in result.checks.iter().filter(|c| c.status != CheckStatus::Pass) {
        eprintln!(
            "  {:<7} #{} {}: {}",
            check.status.to_string(),
            check.check_number,
            check.check_name,
            check.message
        );
    }
}

// ============================================================================
// normalize
// ============================================================================

pub fn cmd_normalize(bundle_path: PathBuf, source: SourceKind) -> Result<(), CliError> {
    let bundle = load_bundle(&bundle_path)?;
    let record = bundle
        .normalize_source(&Normalizer::new(), source)
        .ok_or_else(|| {
            CliError::runtime(format!("bundle has no {source} data"))
                .with_hint(format!("add a \"{}\" entry to {}", bundle_key(source), bundle_path.display()))
        })?;
    println!("{}", to_json(&record)?);
    Ok(())
}

fn bundle_key(source: SourceKind) -> &'static str {
    match source {
        SourceKind::Traveler => "traveler",
        SourceKind::Image => "image",
        SourceKind::Bom => "boms",
    }
}

// ============================================================================
// check-config
// ============================================================================

pub fn cmd_check_config(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path), false)?;
    let f = &config.files;
    eprintln!(
        "ok: {} (strict={}, traveler={}, image={}, boms={}-{})",
        config_path.display(),
        config.strict,
        f.traveler,
        f.image,
        f.min_boms,
        f.max_boms
    );
    Ok(())
}
