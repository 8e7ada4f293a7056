//! Per-source extraction inputs and the adapter that builds them from raw bags.
//!
//! Extraction collaborators hand over loosely-typed JSON maps whose keys vary by
//! document kind. [`SourceFields::from_raw`] is the only place that tolerates
//! that looseness: unknown keys and values of the wrong JSON type are dropped
//! here, so the normalizer only ever sees typed fields.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::bom::aggregate_bom_files;
use crate::model::SourceKind;

/// Untyped field bag as produced by the extraction layer.
pub type RawFieldBag = Map<String, Value>;

const TRAVELER_KEYS: &[&str] = &[
    "job_number",
    "job_numbers",
    "unit_serial",
    "board_serials",
    "board_serials_raw",
    "part_numbers",
];
const IMAGE_KEYS: &[&str] = &[
    "job_number",
    "job_numbers",
    "unit_serial",
    "board_serials",
    "board_serials_raw",
    "part_numbers",
    "flight_status",
];
const BOM_KEYS: &[&str] = &[
    "file_name",
    "job_number",
    "job_numbers",
    "part_numbers",
    "parts",
    "files",
];

// ---------------------------------------------------------------------------
// Typed inputs
// ---------------------------------------------------------------------------

/// A part listed on a traveler or read off a photo, optionally with revision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartEntry {
    pub part: String,
    pub revision: Option<String>,
}

impl PartEntry {
    pub fn bare(part: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            revision: None,
        }
    }

    pub fn with_revision(part: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            revision: Some(revision.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TravelerFields {
    pub job_number: Option<String>,
    pub job_numbers: Vec<String>,
    pub unit_serial: Option<String>,
    pub board_serials: Vec<String>,
    /// Part number -> raw board serials printed for that board.
    pub board_serials_raw: BTreeMap<String, Vec<String>>,
    pub part_numbers: Vec<PartEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageFields {
    pub job_number: Option<String>,
    pub job_numbers: Vec<String>,
    pub unit_serial: Option<String>,
    pub board_serials: Vec<String>,
    pub board_serials_raw: BTreeMap<String, Vec<String>>,
    pub part_numbers: Vec<PartEntry>,
    /// Free-text flight marking. Not an identifier, so the normalizer skips it.
    pub flight_status: Option<String>,
}

/// One BOM spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BomPart {
    pub part_number: String,
    pub revision: Option<String>,
    pub row_number: Option<u32>,
    pub source_file: Option<String>,
}

/// A raw job number and the BOM file it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSource {
    pub job_number: String,
    pub file_name: String,
}

/// One BOM file, or the aggregate of several (see [`aggregate_bom_files`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BomFields {
    pub file_name: Option<String>,
    pub job_number: Option<String>,
    pub job_numbers: Vec<String>,
    pub part_numbers: Vec<PartEntry>,
    pub parts: Vec<BomPart>,
    pub job_sources: Vec<JobSource>,
}

impl BomFields {
    fn has_content(&self) -> bool {
        self.job_number.is_some()
            || !self.job_numbers.is_empty()
            || !self.part_numbers.is_empty()
            || !self.parts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFields {
    Traveler(TravelerFields),
    Image(ImageFields),
    Bom(BomFields),
}

impl SourceFields {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Traveler(_) => SourceKind::Traveler,
            Self::Image(_) => SourceKind::Image,
            Self::Bom(_) => SourceKind::Bom,
        }
    }

    /// Build typed fields from an extraction bag. Never fails: unrecognized
    /// keys and mistyped values are skipped.
    pub fn from_raw(kind: SourceKind, bag: &RawFieldBag) -> Self {
        let known = match kind {
            SourceKind::Traveler => TRAVELER_KEYS,
            SourceKind::Image => IMAGE_KEYS,
            SourceKind::Bom => BOM_KEYS,
        };
        for key in bag.keys() {
            if !known.contains(&key.as_str()) {
                debug!("[Fields] ignoring unrecognized key '{key}' in {kind} bag");
            }
        }

        match kind {
            SourceKind::Traveler => Self::Traveler(TravelerFields {
                job_number: bag.get("job_number").and_then(scalar_string),
                job_numbers: string_list(bag, "job_numbers"),
                unit_serial: bag.get("unit_serial").and_then(scalar_string),
                board_serials: string_list(bag, "board_serials"),
                board_serials_raw: serials_by_part(bag),
                part_numbers: part_entries(bag),
            }),
            SourceKind::Image => Self::Image(ImageFields {
                job_number: bag.get("job_number").and_then(scalar_string),
                job_numbers: string_list(bag, "job_numbers"),
                unit_serial: bag.get("unit_serial").and_then(scalar_string),
                board_serials: string_list(bag, "board_serials"),
                board_serials_raw: serials_by_part(bag),
                part_numbers: part_entries(bag),
                flight_status: bag.get("flight_status").and_then(scalar_string),
            }),
            SourceKind::Bom => Self::Bom(bom_from_raw(bag)),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw value helpers
// ---------------------------------------------------------------------------

/// Strings pass through; numbers are rendered (an OCR'd `82334` is the same
/// job as `"82334"`). Anything else is absent.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(bag: &RawFieldBag, key: &str) -> Vec<String> {
    match bag.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!("[Fields] '{key}' is not a sequence, ignoring");
            Vec::new()
        }
    }
}

fn object_list<'a>(bag: &'a RawFieldBag, key: &str) -> Vec<&'a Map<String, Value>> {
    match bag.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!("[Fields] '{key}' is not a sequence, ignoring");
            Vec::new()
        }
    }
}

/// `part_number` wins over `part` when an entry carries both.
fn part_entries(bag: &RawFieldBag) -> Vec<PartEntry> {
    let Some(Value::Array(items)) = bag.get("part_numbers") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => {
                let part = obj
                    .get("part_number")
                    .and_then(scalar_string)
                    .filter(|s| !s.is_empty())
                    .or_else(|| obj.get("part").and_then(scalar_string))?;
                Some(PartEntry {
                    part,
                    revision: obj.get("revision").and_then(scalar_string),
                })
            }
            other => scalar_string(other).map(PartEntry::bare),
        })
        .collect()
}

fn serials_by_part(bag: &RawFieldBag) -> BTreeMap<String, Vec<String>> {
    let Some(Value::Object(map)) = bag.get("board_serials_raw") else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(part, serials)| {
            let list = match serials {
                Value::Array(items) => items.iter().filter_map(scalar_string).collect(),
                other => scalar_string(other).into_iter().collect(),
            };
            (part.clone(), list)
        })
        .collect()
}

fn bom_parts(bag: &RawFieldBag) -> Vec<BomPart> {
    object_list(bag, "parts")
        .into_iter()
        .filter_map(|obj| {
            Some(BomPart {
                part_number: obj.get("part_number").and_then(scalar_string)?,
                revision: obj.get("revision").and_then(scalar_string),
                row_number: obj
                    .get("row_number")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok()),
                source_file: obj.get("source_file").and_then(scalar_string),
            })
        })
        .collect()
}

fn bom_file_from_raw(bag: &RawFieldBag) -> BomFields {
    BomFields {
        file_name: bag.get("file_name").and_then(scalar_string),
        job_number: bag.get("job_number").and_then(scalar_string),
        job_numbers: string_list(bag, "job_numbers"),
        part_numbers: part_entries(bag),
        parts: bom_parts(bag),
        job_sources: Vec::new(),
    }
}

/// Split a BOM bag into its per-file bags. A bag is either a single file or
/// carries several under `files`; top-level jobs and parts next to `files`
/// count as one more file.
pub fn bom_files_from_raw(bag: &RawFieldBag) -> Vec<BomFields> {
    let top = bom_file_from_raw(bag);
    let mut files: Vec<BomFields> = object_list(bag, "files")
        .into_iter()
        .map(bom_file_from_raw)
        .collect();
    if files.is_empty() || top.has_content() {
        files.push(top);
    }
    files
}

/// Aggregate only when there is more than one file, so a lone file keeps its
/// own name for job attribution.
fn bom_from_raw(bag: &RawFieldBag) -> BomFields {
    let files = bom_files_from_raw(bag);
    if files.len() == 1 {
        files.into_iter().next().unwrap_or_default()
    } else {
        aggregate_bom_files(&files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> RawFieldBag {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn traveler_bag_with_unknown_keys() {
        let raw = bag(json!({
            "job_number": "82334",
            "work_instruction": "WI-0042",
            "unit_serial": "1619",
            "board_serials": ["80751-0053", 42, null],
            "part_numbers": [{"part": "PCA-1153-03", "revision": "F"}, "pca-1052-05"]
        }));
        let SourceFields::Traveler(t) = SourceFields::from_raw(SourceKind::Traveler, &raw) else {
            panic!("expected traveler fields");
        };
        assert_eq!(t.job_number.as_deref(), Some("82334"));
        assert_eq!(t.unit_serial.as_deref(), Some("1619"));
        assert_eq!(t.board_serials, vec!["80751-0053".to_string(), "42".to_string()]);
        assert_eq!(
            t.part_numbers,
            vec![
                PartEntry::with_revision("PCA-1153-03", "F"),
                PartEntry::bare("pca-1052-05"),
            ]
        );
    }

    #[test]
    fn numeric_scalars_become_strings() {
        let raw = bag(json!({ "job_number": 82334, "job_numbers": [80751, "82334"] }));
        let SourceFields::Traveler(t) = SourceFields::from_raw(SourceKind::Traveler, &raw) else {
            panic!("expected traveler fields");
        };
        assert_eq!(t.job_number.as_deref(), Some("82334"));
        assert_eq!(t.job_numbers, vec!["80751".to_string(), "82334".to_string()]);
    }

    #[test]
    fn mistyped_values_are_dropped() {
        let raw = bag(json!({
            "job_numbers": "82334",
            "board_serials": {"a": 1},
            "unit_serial": true,
            "part_numbers": "PCA-1153-03"
        }));
        let SourceFields::Image(i) = SourceFields::from_raw(SourceKind::Image, &raw) else {
            panic!("expected image fields");
        };
        assert!(i.job_numbers.is_empty());
        assert!(i.board_serials.is_empty());
        assert!(i.unit_serial.is_none());
        assert!(i.part_numbers.is_empty());
    }

    #[test]
    fn part_number_key_preferred_over_part() {
        let raw = bag(json!({
            "part_numbers": [{"part": "AAA-1", "part_number": "BBB-2", "revision": "E"}]
        }));
        let SourceFields::Image(i) = SourceFields::from_raw(SourceKind::Image, &raw) else {
            panic!("expected image fields");
        };
        assert_eq!(i.part_numbers, vec![PartEntry::with_revision("BBB-2", "E")]);
    }

    #[test]
    fn image_flight_status_and_serial_map() {
        let raw = bag(json!({
            "flight_status": "FLIGHT",
            "board_serials_raw": {"PCA-1153-03": ["VGN-80751-0053"], "PCA-1052-05": "80751-0054"}
        }));
        let SourceFields::Image(i) = SourceFields::from_raw(SourceKind::Image, &raw) else {
            panic!("expected image fields");
        };
        assert_eq!(i.flight_status.as_deref(), Some("FLIGHT"));
        assert_eq!(i.board_serials_raw["PCA-1052-05"], vec!["80751-0054".to_string()]);
        assert_eq!(i.board_serials_raw.len(), 2);
    }

    #[test]
    fn bom_single_file() {
        let raw = bag(json!({
            "file_name": "82334-A.xlsx",
            "job_number": "82334",
            "parts": [
                {"part_number": "PCA-1153-03", "revision": "F", "row_number": 12},
                {"revision": "A", "row_number": 13}
            ]
        }));
        let SourceFields::Bom(b) = SourceFields::from_raw(SourceKind::Bom, &raw) else {
            panic!("expected bom fields");
        };
        assert_eq!(b.file_name.as_deref(), Some("82334-A.xlsx"));
        assert_eq!(b.parts.len(), 1);
        assert_eq!(b.parts[0].row_number, Some(12));
    }

    #[test]
    fn bom_files_are_aggregated() {
        let raw = bag(json!({
            "files": [
                {"file_name": "a.xlsx", "job_number": "82334",
                 "parts": [{"part_number": "PCA-1153-03", "revision": "F"}]},
                {"file_name": "b.xlsx", "job_numbers": ["80751"],
                 "parts": [{"part_number": "PCA-1052-05", "revision": "B"}]}
            ]
        }));
        let SourceFields::Bom(b) = SourceFields::from_raw(SourceKind::Bom, &raw) else {
            panic!("expected bom fields");
        };
        assert_eq!(b.parts.len(), 2);
        assert_eq!(b.parts[1].source_file.as_deref(), Some("b.xlsx"));
        assert_eq!(b.job_sources.len(), 2);
    }

    #[test]
    fn top_level_content_next_to_files_is_a_file() {
        let raw = bag(json!({
            "job_number": "11111",
            "files": [{"file_name": "a.xlsx", "job_number": "82334"}, {}]
        }));
        let files = bom_files_from_raw(&raw);
        assert_eq!(files.len(), 3);
        assert_eq!(files[2].job_number.as_deref(), Some("11111"));

        let plain = bag(json!({ "file_name": "a.xlsx" }));
        assert_eq!(bom_files_from_raw(&plain).len(), 1);
    }
}
