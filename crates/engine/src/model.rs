use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::RawFieldBag;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Which document a field bag or normalized record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Traveler,
    Image,
    Bom,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traveler => "traveler",
            Self::Image => "image",
            Self::Bom => "bom",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "traveler" => Ok(Self::Traveler),
            "image" => Ok(Self::Image),
            "bom" => Ok(Self::Bom),
            other => Err(format!("unknown source kind: \"{other}\" (expected traveler, image or bom)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

/// A canonical part number with the revision it was listed at, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRevision {
    pub part_number: String,
    pub revision: Option<String>,
    /// BOM spreadsheet the row came from. Only set on BOM records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// Normalizer output for one source. Every identifier in the sets has already
/// passed its format validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub source: SourceKind,
    pub job_numbers: BTreeSet<String>,
    pub board_serials: BTreeSet<String>,
    pub unit_serials: BTreeSet<String>,
    pub part_numbers: BTreeSet<String>,
    pub parts_with_revisions: Vec<PartRevision>,
    /// Audit trail of corrections. Never used for matching.
    pub normalization_applied: Vec<String>,
    /// Job number -> BOM files that carried it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub job_sources: BTreeMap<String, Vec<String>>,
    /// Board serial -> part number of the board it was printed on.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub board_serial_parts: BTreeMap<String, String>,
}

impl NormalizedRecord {
    pub fn empty(source: SourceKind) -> Self {
        Self {
            source,
            job_numbers: BTreeSet::new(),
            board_serials: BTreeSet::new(),
            unit_serials: BTreeSet::new(),
            part_numbers: BTreeSet::new(),
            parts_with_revisions: Vec::new(),
            normalization_applied: Vec::new(),
            job_sources: BTreeMap::new(),
            board_serial_parts: BTreeMap::new(),
        }
    }

    /// Revisions keyed by part number, skipping entries without one.
    /// Later entries win, matching the order the source listed them in.
    pub fn revisions_by_part(&self) -> BTreeMap<&str, &str> {
        self.parts_with_revisions
            .iter()
            .filter_map(|p| p.revision.as_deref().map(|r| (p.part_number.as_str(), r)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Engine input
// ---------------------------------------------------------------------------

/// Up to three normalized records for one validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationInput {
    pub traveler: Option<NormalizedRecord>,
    pub image: Option<NormalizedRecord>,
    pub bom: Option<NormalizedRecord>,
}

/// File counters plus the pre-normalization bags the flight-status check reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub traveler_count: usize,
    #[serde(default)]
    pub image_count: usize,
    #[serde(default)]
    pub bom_count: usize,
    #[serde(default)]
    pub source_data: SourceData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traveler: Option<RawFieldBag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<RawFieldBag>,
}

impl FileMetadata {
    pub fn new(traveler_count: usize, image_count: usize, bom_count: usize) -> Self {
        Self {
            traveler_count,
            image_count,
            bom_count,
            source_data: SourceData::default(),
        }
    }

    /// Raw flight marking from the image bag. Non-string values count as absent.
    pub fn flight_status(&self) -> Option<&str> {
        self.source_data
            .image
            .as_ref()
            .and_then(|bag| bag.get("flight_status"))
            .and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
    Info,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warning => write!(f, "WARNING"),
            Self::Fail => write!(f, "FAIL"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Pass,
    Warning,
    Fail,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warning => write!(f, "WARNING"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Serialized as the bare integer 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    Critical = 1,
    Moderate = 2,
    Informational = 3,
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Critical),
            2 => Ok(Self::Moderate),
            3 => Ok(Self::Informational),
            other => Err(format!("priority must be 1, 2 or 3, got {other}")),
        }
    }
}

/// One verdict with its evidence. Checks 1-5 may emit several of these, one
/// per identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub check_number: u8,
    pub check_name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
}

impl ValidationCheck {
    pub fn new(
        check_number: u8,
        check_name: impl Into<String>,
        status: CheckStatus,
        priority: Priority,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check_number,
            check_name: check_name.into(),
            status,
            message: message.into(),
            details: Map::new(),
            priority,
            expected_value: None,
            actual_value: None,
        }
    }

    pub fn expected(mut self, value: impl Into<String>) -> Self {
        self.expected_value = Some(value.into());
        self
    }

    pub fn actual(mut self, value: impl Into<String>) -> Self {
        self.actual_value = Some(value.into());
        self
    }

    /// Attach evidence. Only JSON objects are kept.
    pub fn details(mut self, details: Value) -> Self {
        if let Value::Object(map) = details {
            self.details = map;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "PASS")]
    pub pass: usize,
    #[serde(rename = "WARNING")]
    pub warning: usize,
    #[serde(rename = "FAIL")]
    pub fail: usize,
    #[serde(rename = "INFO")]
    pub info: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_checks: usize,
    pub status_counts: StatusCounts,
    /// Priority-1 FAILs: the blocking subset of `checks_failed`.
    pub critical_failures: usize,
    /// PASS + INFO.
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub checks_warning: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub overall_status: OverallStatus,
    pub checks: Vec<ValidationCheck>,
    pub summary: ValidationSummary,
}
