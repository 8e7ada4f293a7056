//! One validation session end to end: raw bags in, normalized records and a
//! report out. This is what the CLI drives.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::bom::aggregate_bom_files;
use crate::config::ValidationConfig;
use crate::engine::ValidationEngine;
use crate::error::ShipcheckError;
use crate::fields::{bom_files_from_raw, BomFields, RawFieldBag, SourceFields};
use crate::model::{FileMetadata, NormalizedRecord, SourceData, SourceKind, ValidationInput, ValidationResult};
use crate::normalize::Normalizer;

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Raw extraction output for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    #[serde(default)]
    pub traveler: Option<RawFieldBag>,
    #[serde(default)]
    pub image: Option<RawFieldBag>,
    /// One bag per BOM spreadsheet. A bag may also carry several files under `files`.
    #[serde(default)]
    pub boms: Vec<RawFieldBag>,
    /// Uploaded file counts. Derived from the bags when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_counts: Option<FileCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub traveler: usize,
    #[serde(default)]
    pub image: usize,
    #[serde(default)]
    pub bom: usize,
}

impl SessionBundle {
    pub fn from_json(input: &str) -> Result<Self, ShipcheckError> {
        serde_json::from_str(input).map_err(|e| ShipcheckError::BundleParse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ShipcheckError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ShipcheckError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&input)
    }

    /// Counts as uploaded: explicit counts win, otherwise one per present bag
    /// and one per BOM file.
    pub fn file_counts(&self) -> FileCounts {
        self.file_counts.unwrap_or_else(|| FileCounts {
            traveler: usize::from(self.traveler.is_some()),
            image: usize::from(self.image.is_some()),
            bom: self.boms.iter().map(bom_file_count).sum(),
        })
    }

    /// All BOM bags folded into one typed input, or `None` if there are none.
    /// Nested `files` are flattened first so every file is labelled once.
    pub fn bom_fields(&self) -> Option<BomFields> {
        let mut files: Vec<BomFields> = self.boms.iter().flat_map(bom_files_from_raw).collect();
        match files.len() {
            0 => None,
            1 => files.pop(),
            _ => Some(aggregate_bom_files(&files)),
        }
    }

    /// Normalize a single source. `None` when the bundle has no bag for it.
    pub fn normalize_source(&self, normalizer: &Normalizer, kind: SourceKind) -> Option<NormalizedRecord> {
        match kind {
            SourceKind::Traveler => self
                .traveler
                .as_ref()
                .map(|bag| normalizer.normalize_extracted_data(bag, kind)),
            SourceKind::Image => self
                .image
                .as_ref()
                .map(|bag| normalizer.normalize_extracted_data(bag, kind)),
            SourceKind::Bom => self
                .bom_fields()
                .map(|bom| normalizer.normalize(&SourceFields::Bom(bom))),
        }
    }
}

fn bom_file_count(bag: &RawFieldBag) -> usize {
    bom_files_from_raw(bag).len()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutput {
    pub traveler: Option<NormalizedRecord>,
    pub image: Option<NormalizedRecord>,
    pub bom: Option<NormalizedRecord>,
    pub file_metadata: FileMetadata,
    pub result: ValidationResult,
}

/// Normalize every source in the bundle and validate them together.
pub fn run_session(bundle: &SessionBundle, config: &ValidationConfig) -> SessionOutput {
    let normalizer = Normalizer::new();
    let counts = bundle.file_counts();
    info!(
        "[Session] {} traveler, {} image, {} BOM file(s)",
        counts.traveler, counts.image, counts.bom
    );

    let input = ValidationInput {
        traveler: bundle.normalize_source(&normalizer, SourceKind::Traveler),
        image: bundle.normalize_source(&normalizer, SourceKind::Image),
        bom: bundle.normalize_source(&normalizer, SourceKind::Bom),
    };
    let file_metadata = FileMetadata {
        traveler_count: counts.traveler,
        image_count: counts.image,
        bom_count: counts.bom,
        source_data: SourceData {
            traveler: bundle.traveler.clone(),
            image: bundle.image.clone(),
        },
    };

    let result = ValidationEngine::new(config.clone()).validate(&input, &file_metadata);
    SessionOutput {
        traveler: input.traveler,
        image: input.image,
        bom: input.bom,
        file_metadata,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OverallStatus;

    const BUNDLE: &str = r#"{
        "traveler": {"job_number": "82334", "unit_serial": "1619", "board_serials": ["80751-0053"]},
        "image": {"unit_serial": "INF-1619", "board_serials": ["VGN-80751-0053"], "flight_status": "FLIGHT"},
        "boms": [
            {"file_name": "82334-top.xlsx", "job_number": "82334", "parts": [{"part_number": "PCA-1153-03", "revision": "F"}]},
            {"file_name": "82334-io.xlsx", "job_number": "82334", "parts": [{"part_number": "PCA-1052-05", "revision": "B"}]}
        ]
    }"#;

    #[test]
    fn derives_counts_from_bags() {
        let bundle = SessionBundle::from_json(BUNDLE).unwrap();
        assert_eq!(
            bundle.file_counts(),
            FileCounts {
                traveler: 1,
                image: 1,
                bom: 2
            }
        );
    }

    #[test]
    fn explicit_counts_win() {
        let mut bundle = SessionBundle::from_json(BUNDLE).unwrap();
        bundle.file_counts = Some(FileCounts {
            traveler: 1,
            image: 2,
            bom: 2,
        });
        let out = run_session(&bundle, &ValidationConfig::default());
        assert_eq!(out.result.overall_status, OverallStatus::Fail);
        assert_eq!(out.file_metadata.image_count, 2);
    }

    #[test]
    fn nested_files_count_individually() {
        let bundle = SessionBundle::from_json(
            r#"{"boms": [{"files": [{"job_number": "82334"}, {"job_number": "80751"}, {}]}]}"#,
        )
        .unwrap();
        assert_eq!(bundle.file_counts().bom, 3);
        assert_eq!(bundle.file_counts().traveler, 0);
    }

    #[test]
    fn session_aggregates_boms() {
        let bundle = SessionBundle::from_json(BUNDLE).unwrap();
        let out = run_session(&bundle, &ValidationConfig::default());
        let bom = out.bom.unwrap();
        assert_eq!(bom.part_numbers.len(), 2);
        assert_eq!(
            bom.job_sources["82334"],
            vec!["82334-io.xlsx".to_string(), "82334-top.xlsx".to_string()]
        );
        assert_eq!(out.traveler.unwrap().board_serials.len(), 1);
        // no parts on traveler/image -> check 2 warns
        assert_eq!(out.result.overall_status, OverallStatus::Warning);
        assert!(out.file_metadata.source_data.image.is_some());
    }

    #[test]
    fn nested_and_flat_bags_label_each_file_once() {
        let bundle = SessionBundle::from_json(
            r#"{"boms": [
                {"files": [{"file_name": "a.xlsx", "job_number": "82334"},
                           {"file_name": "b.xlsx", "job_number": "80751"}]},
                {"file_name": "c.xlsx", "job_number": "11111"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(bundle.file_counts().bom, 3);
        let bom = bundle.normalize_source(&Normalizer::new(), SourceKind::Bom).unwrap();
        assert_eq!(bom.job_sources["82334"], vec!["a.xlsx".to_string()]);
        assert_eq!(bom.job_sources["80751"], vec!["b.xlsx".to_string()]);
        assert_eq!(bom.job_sources["11111"], vec!["c.xlsx".to_string()]);
    }

    #[test]
    fn unnamed_files_numbered_across_bags() {
        let bundle = SessionBundle::from_json(
            r#"{"boms": [
                {"files": [{"job_number": "11111"}, {"job_number": "22222"}]},
                {"job_number": "82334"}
            ]}"#,
        )
        .unwrap();
        let bom = bundle.normalize_source(&Normalizer::new(), SourceKind::Bom).unwrap();
        assert_eq!(bom.job_sources["11111"], vec!["BOM 1".to_string()]);
        assert_eq!(bom.job_sources["22222"], vec!["BOM 2".to_string()]);
        assert_eq!(bom.job_sources["82334"], vec!["BOM 3".to_string()]);
    }

    #[test]
    fn malformed_bundle_is_error() {
        let err = SessionBundle::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, ShipcheckError::BundleParse(_)));
        let err = SessionBundle::from_json(r#"{"boms": "x"}"#).unwrap_err();
        assert!(matches!(err, ShipcheckError::BundleParse(_)));
    }

    #[test]
    fn empty_bundle_still_reports() {
        let out = run_session(&SessionBundle::default(), &ValidationConfig::default());
        assert_eq!(out.result.checks.len(), 7);
        assert!(out.bom.is_none());
    }
}
