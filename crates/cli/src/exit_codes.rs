//! CLI Exit Code Registry
//!
//! Single source of truth for `shipcheck` exit codes. Exit codes are part of
//! the shell contract: line scripts gate shipment on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success / overall verdict PASS                        |
//! | 1    | Runtime error (unreadable or malformed bundle)        |
//! | 2    | Usage or config error (bad args, invalid qc.toml)     |
//! | 3    | Overall verdict WARNING                               |
//! | 4    | Overall verdict FAIL                                  |

use shipcheck_engine::{OverallStatus, ShipcheckError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed, verdict PASS where one applies.
pub const EXIT_SUCCESS: u8 = 0;

/// Runtime error - the session bundle could not be read or parsed, or it
/// lacks the requested source.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or an unusable config file.
/// clap exits with this code on its own for argument errors.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Verdict (3-4)
// =============================================================================

/// Validation finished with warnings only. Shipment needs a human sign-off.
pub const EXIT_VERDICT_WARNING: u8 = 3;

/// Validation found at least one failure (or a warning under strict mode).
pub const EXIT_VERDICT_FAIL: u8 = 4;

/// Map an overall verdict to its exit code.
pub fn verdict_exit_code(status: OverallStatus) -> u8 {
    match status {
        OverallStatus::Pass => EXIT_SUCCESS,
        OverallStatus::Warning => EXIT_VERDICT_WARNING,
        OverallStatus::Fail => EXIT_VERDICT_FAIL,
    }
}

/// Exit code for an error raised while loading the session bundle.
pub fn bundle_exit_code(err: &ShipcheckError) -> u8 {
    match err {
        ShipcheckError::ConfigParse(_) | ShipcheckError::ConfigValidation(_) => EXIT_USAGE,
        ShipcheckError::BundleParse(_) | ShipcheckError::Io(_) => EXIT_ERROR,
    }
}
