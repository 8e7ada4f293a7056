//! The seven cross-source checks. Each function is independent and returns
//! the entries it contributes; a failure in one never short-circuits another.

use std::collections::BTreeMap;

use serde_json::json;

use crate::config::FileLimits;
use crate::model::{CheckStatus, FileMetadata, NormalizedRecord, Priority, ValidationCheck};

pub const JOB_NUMBER: (u8, &str) = (1, "Job Number");
pub const PART_NUMBER: (u8, &str) = (2, "Part Number");
pub const REVISION: (u8, &str) = (3, "Revision");
pub const BOARD_SERIAL: (u8, &str) = (4, "Board Serial");
pub const UNIT_SERIAL: (u8, &str) = (5, "Unit Serial");
pub const FLIGHT_STATUS: (u8, &str) = (6, "Flight Status");
pub const FILE_COMPLETENESS: (u8, &str) = (7, "File Completeness");

fn entry(
    (number, name): (u8, &str),
    status: CheckStatus,
    priority: Priority,
    message: impl Into<String>,
) -> ValidationCheck {
    ValidationCheck::new(number, name, status, priority, message)
}

/// Names of the absent records, for "Missing ... data" messages.
fn missing_sources(sources: &[(&'static str, bool)]) -> Vec<&'static str> {
    sources
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect()
}

fn missing_entry(
    check: (u8, &str),
    priority: Priority,
    missing: Vec<&'static str>,
) -> ValidationCheck {
    entry(
        check,
        CheckStatus::Fail,
        priority,
        format!("Missing {} data", missing.join(" and ")),
    )
    .details(json!({ "missing_sources": missing }))
}

/// Whether the normalizer left a correction note of this kind on the record.
fn rewrote(record: &NormalizedRecord, note_prefix: &str) -> bool {
    record
        .normalization_applied
        .iter()
        .any(|note| note.starts_with(note_prefix))
}

fn other_source(source: &str) -> &'static str {
    if source == "traveler" {
        "image"
    } else {
        "traveler"
    }
}

// ---------------------------------------------------------------------------
// 1. Job number
// ---------------------------------------------------------------------------

/// Every traveler job number must appear in at least one BOM file.
pub fn job_number_match(
    traveler: Option<&NormalizedRecord>,
    bom: Option<&NormalizedRecord>,
) -> Vec<ValidationCheck> {
    let p = Priority::Critical;
    let (Some(traveler), Some(bom)) = (traveler, bom) else {
        let missing = missing_sources(&[("traveler", traveler.is_some()), ("BOM", bom.is_some())]);
        return vec![missing_entry(JOB_NUMBER, p, missing)];
    };

    if traveler.job_numbers.is_empty() {
        return vec![entry(JOB_NUMBER, CheckStatus::Fail, p, "No job number found in traveler")
            .expected("Job number in traveler")
            .actual("No job number found")];
    }
    if bom.job_numbers.is_empty() {
        return vec![entry(JOB_NUMBER, CheckStatus::Fail, p, "No job numbers found in BOMs")
            .expected("Job numbers in BOM files")
            .actual("No job numbers found")];
    }

    traveler
        .job_numbers
        .iter()
        .map(|job| {
            if bom.job_numbers.contains(job) {
                let files = bom.job_sources.get(job).cloned().unwrap_or_default();
                let found_in = if files.is_empty() {
                    "BOM file(s)".to_string()
                } else {
                    files.join(", ")
                };
                entry(
                    JOB_NUMBER,
                    CheckStatus::Pass,
                    p,
                    format!("Job number {job} found in {} BOM file(s)", files.len().max(1)),
                )
                .expected(format!("Job {job} in BOM files"))
                .actual(format!("Found in: {found_in}"))
                .details(json!({
                    "job_number": job,
                    "found_in_bom": true,
                    "bom_files": files,
                }))
            } else {
                entry(
                    JOB_NUMBER,
                    CheckStatus::Fail,
                    p,
                    format!("Job number {job} from traveler not found in any BOM file"),
                )
                .expected(format!("Job {job} in BOM files"))
                .actual("Not found in any BOM file")
                .details(json!({
                    "job_number": job,
                    "found_in_bom": false,
                    "available_jobs": bom.job_numbers,
                }))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 2. Part numbers
// ---------------------------------------------------------------------------

/// Every part number read from the traveler or image must be on a BOM.
pub fn part_numbers_match(
    traveler: Option<&NormalizedRecord>,
    image: Option<&NormalizedRecord>,
    bom: Option<&NormalizedRecord>,
) -> Vec<ValidationCheck> {
    let p = Priority::Critical;
    let bom = match bom {
        Some(b) if !b.part_numbers.is_empty() => b,
        _ => {
            return vec![entry(PART_NUMBER, CheckStatus::Fail, p, "No BOM data available")
                .expected("Part numbers in BOM files")
                .actual("No BOM part data")
                .details(json!({ "bom_present": bom.is_some() }))];
        }
    };

    let mut part_sources: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, record) in [("traveler", traveler), ("image", image)] {
        for part in record.into_iter().flat_map(|r| r.part_numbers.iter()) {
            part_sources.entry(part.as_str()).or_default().push(name);
        }
    }

    if part_sources.is_empty() {
        return vec![entry(
            PART_NUMBER,
            CheckStatus::Warning,
            p,
            "No part numbers found in traveler or image",
        )
        .expected("Part numbers in traveler/image")
        .actual("None found")];
    }

    part_sources
        .into_iter()
        .map(|(part, sources)| {
            if bom.part_numbers.contains(part) {
                let mut files: Vec<&str> = bom
                    .parts_with_revisions
                    .iter()
                    .filter(|r| r.part_number == part)
                    .filter_map(|r| r.source_file.as_deref())
                    .collect();
                files.sort_unstable();
                files.dedup();
                let found_in = if files.is_empty() {
                    "BOM file(s)".to_string()
                } else {
                    files.join(", ")
                };
                entry(PART_NUMBER, CheckStatus::Pass, p, format!("Part number {part} found in BOM"))
                    .expected(part)
                    .actual(format!("Found in: {found_in}"))
                    .details(json!({
                        "part_number": part,
                        "source": sources,
                        "found_in_bom": true,
                        "bom_files": files,
                    }))
            } else {
                entry(
                    PART_NUMBER,
                    CheckStatus::Fail,
                    p,
                    format!(
                        "Part number {part} from {} not found in any BOM",
                        sources.join(" and ")
                    ),
                )
                .expected(part)
                .actual("Not found in BOM files")
                .details(json!({
                    "part_number": part,
                    "source": sources,
                    "found_in_bom": false,
                }))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 3. Revisions
// ---------------------------------------------------------------------------

/// BOM revisions for one part, in first-seen order, each with its files.
type BomRevisions = Vec<(String, Vec<String>)>;

fn bom_revisions(bom: Option<&NormalizedRecord>) -> BTreeMap<&str, BomRevisions> {
    let mut by_part: BTreeMap<&str, BomRevisions> = BTreeMap::new();
    for row in bom.into_iter().flat_map(|b| b.parts_with_revisions.iter()) {
        let Some(rev) = row.revision.as_deref() else {
            continue;
        };
        let file = row.source_file.as_deref().unwrap_or("BOM");
        let revs = by_part.entry(row.part_number.as_str()).or_default();
        match revs.iter_mut().find(|(r, _)| r == rev) {
            Some((_, files)) => {
                if !files.iter().any(|f| f == file) {
                    files.push(file.to_string());
                }
            }
            None => revs.push((rev.to_string(), vec![file.to_string()])),
        }
    }
    by_part
}

/// Compare each traveler/image revision against every BOM revision on file.
///
/// Traveler revisions win over image revisions for the same part. A mismatch
/// is always a WARNING; `minor_difference` (one revision containing the other,
/// e.g. `F` vs `F2`) is reported as evidence only.
pub fn revisions_match(
    traveler: Option<&NormalizedRecord>,
    image: Option<&NormalizedRecord>,
    bom: Option<&NormalizedRecord>,
) -> Vec<ValidationCheck> {
    let p = Priority::Moderate;
    let traveler_revs = traveler.map(NormalizedRecord::revisions_by_part).unwrap_or_default();
    let image_revs = image.map(NormalizedRecord::revisions_by_part).unwrap_or_default();
    let bom_revs = bom_revisions(bom);

    let mut parts: Vec<&str> = traveler_revs.keys().chain(image_revs.keys()).copied().collect();
    parts.sort_unstable();
    parts.dedup();

    if parts.is_empty() {
        return vec![entry(
            REVISION,
            CheckStatus::Info,
            p,
            "Traveler document does not include individual board revision information (this is expected behavior)",
        )
        .expected("N/A")
        .actual("No revision data in traveler")];
    }

    parts
        .into_iter()
        .map(|part| {
            let (source_rev, source) = match traveler_revs.get(part) {
                Some(rev) => (*rev, "traveler"),
                None => (image_revs[part], "image"),
            };
            let expected = format!("{part} Rev {source_rev}");

            let Some(revs) = bom_revs.get(part).filter(|r| !r.is_empty()) else {
                return entry(
                    REVISION,
                    CheckStatus::Warning,
                    p,
                    format!("Revision for {part}: No revision data in BOM files"),
                )
                .expected(expected)
                .actual("No revision info in BOM")
                .details(json!({
                    "part_number": part,
                    "source_revision": source_rev,
                    "source": source,
                }));
            };

            if let Some((_, files)) = revs.iter().find(|(r, _)| r == source_rev) {
                let joined = files.join(", ");
                return entry(
                    REVISION,
                    CheckStatus::Pass,
                    p,
                    format!("{part} revision {source_rev} matches in {joined}"),
                )
                .expected(expected)
                .actual(format!("Found in: {joined}"))
                .details(json!({
                    "part_number": part,
                    "revision": source_rev,
                    "source": source,
                    "bom_files": files,
                    "match": true,
                }));
            }

            let bom_values: Vec<&str> = revs.iter().map(|(r, _)| r.as_str()).collect();
            let shown = bom_values
                .iter()
                .map(|r| format!("'{r}'"))
                .collect::<Vec<_>>()
                .join(", ");
            let minor = bom_values
                .iter()
                .any(|r| r.contains(source_rev) || source_rev.contains(r));
            entry(
                REVISION,
                CheckStatus::Warning,
                p,
                format!("Revision mismatch for {part}: BOM shows {shown} but {source} shows '{source_rev}'"),
            )
            .expected(expected)
            .actual(format!("BOM shows: {shown}"))
            .details(json!({
                "part_number": part,
                "source_revision": source_rev,
                "source": source,
                "bom_revisions": bom_values,
                "match": false,
                "minor_difference": minor,
            }))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 4. Board serials
// ---------------------------------------------------------------------------

/// Board serials must agree between traveler and image after normalization.
pub fn board_serials_match(
    traveler: Option<&NormalizedRecord>,
    image: Option<&NormalizedRecord>,
) -> Vec<ValidationCheck> {
    let p = Priority::Moderate;
    let (Some(traveler), Some(image)) = (traveler, image) else {
        let missing = missing_sources(&[("traveler", traveler.is_some()), ("image", image.is_some())]);
        return vec![missing_entry(BOARD_SERIAL, p, missing)];
    };

    if traveler.board_serials.is_empty() && image.board_serials.is_empty() {
        return vec![entry(
            BOARD_SERIAL,
            CheckStatus::Info,
            p,
            "Note: Image shows 'VGN-' prefix on all board serials, traveler omits this prefix (this is expected)",
        )
        .expected("Board serials with optional VGN- prefix")
        .actual("Prefix handling varies by source")];
    }

    let normalized = rewrote(traveler, "Board serial:") || rewrote(image, "Board serial:");
    let serials = traveler.board_serials.union(&image.board_serials);

    serials
        .map(|serial| {
            let in_traveler = traveler.board_serials.contains(serial);
            let in_image = image.board_serials.contains(serial);
            let part = traveler
                .board_serial_parts
                .get(serial)
                .or_else(|| image.board_serial_parts.get(serial));
            let board = match part {
                Some(part) => format!("Board {part} serial"),
                None => "Board serial".to_string(),
            };

            if in_traveler && in_image {
                let suffix = if normalized { " (traveler without prefix)" } else { "" };
                entry(
                    BOARD_SERIAL,
                    CheckStatus::Pass,
                    p,
                    format!("{board} matches: {serial} (image) = {serial}{suffix}"),
                )
                .expected(serial.as_str())
                .actual(format!("{serial} (matched)"))
                .details(json!({
                    "serial": serial,
                    "part_number": part,
                    "normalized": normalized,
                    "in_traveler": true,
                    "in_image": true,
                }))
            } else {
                let found = if in_image { "image" } else { "traveler" };
                let missing = other_source(found);
                entry(
                    BOARD_SERIAL,
                    CheckStatus::Warning,
                    p,
                    format!("{board} {serial} found only in {found} (missing from {missing})"),
                )
                .expected(format!("{serial} in both sources"))
                .actual(format!("Only in {found}"))
                .details(json!({
                    "serial": serial,
                    "part_number": part,
                    "in_traveler": in_traveler,
                    "in_image": in_image,
                    "missing_from": missing,
                }))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 5. Unit serial
// ---------------------------------------------------------------------------

/// Unit serial must agree between traveler and image. Unlike board serials,
/// finding none at all is a WARNING.
pub fn unit_serial_match(
    traveler: Option<&NormalizedRecord>,
    image: Option<&NormalizedRecord>,
) -> Vec<ValidationCheck> {
    let p = Priority::Moderate;
    let (Some(traveler), Some(image)) = (traveler, image) else {
        let missing = missing_sources(&[("traveler", traveler.is_some()), ("image", image.is_some())]);
        return vec![missing_entry(UNIT_SERIAL, p, missing)];
    };

    if traveler.unit_serials.is_empty() && image.unit_serials.is_empty() {
        return vec![entry(
            UNIT_SERIAL,
            CheckStatus::Warning,
            p,
            "No unit serials found in traveler or image",
        )
        .expected("Unit serial in traveler/image")
        .actual("Not found")];
    }

    let normalized = rewrote(traveler, "Unit serial:") || rewrote(image, "Unit serial:");

    traveler
        .unit_serials
        .union(&image.unit_serials)
        .map(|unit| {
            let in_traveler = traveler.unit_serials.contains(unit);
            let in_image = image.unit_serials.contains(unit);
            if in_traveler && in_image {
                let suffix = if normalized { " (traveler without prefix)" } else { "" };
                entry(
                    UNIT_SERIAL,
                    CheckStatus::Pass,
                    p,
                    format!("Unit serial matches: {unit} (image) = {unit}{suffix}"),
                )
                .expected(unit.as_str())
                .actual(format!("{unit} (matched)"))
                .details(json!({
                    "unit_serial": unit,
                    "normalized": normalized,
                    "in_traveler": true,
                    "in_image": true,
                }))
            } else {
                let found = if in_image { "image" } else { "traveler" };
                let missing = other_source(found);
                entry(
                    UNIT_SERIAL,
                    CheckStatus::Warning,
                    p,
                    format!("Unit serial {unit} found only in {found} (missing from {missing})"),
                )
                .expected(format!("{unit} in both sources"))
                .actual(format!("Only in {found}"))
                .details(json!({
                    "unit_serial": unit,
                    "in_traveler": in_traveler,
                    "in_image": in_image,
                    "missing_from": missing,
                }))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 6. Flight status
// ---------------------------------------------------------------------------

/// Classify the flight marking read off the hardware photo.
pub fn flight_status(meta: &FileMetadata) -> ValidationCheck {
    let p = Priority::Informational;
    let raw = meta.flight_status().map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return entry(
            FLIGHT_STATUS,
            CheckStatus::Fail,
            p,
            "Flight status marking not detected on hardware",
        );
    }

    let upper = raw.to_uppercase();
    let details = json!({ "flight_status": raw });
    if upper.contains("FLIGHT") && !upper.contains("NOT") {
        entry(
            FLIGHT_STATUS,
            CheckStatus::Pass,
            p,
            "FLIGHT marking confirmed - Hardware is flight-qualified",
        )
        .details(details)
    } else if upper.contains("EDU") || upper.contains("NOT FOR FLIGHT") {
        entry(
            FLIGHT_STATUS,
            CheckStatus::Warning,
            p,
            "Educational hardware (NOT FOR FLIGHT) - Not flight-qualified",
        )
        .details(details)
    } else {
        entry(
            FLIGHT_STATUS,
            CheckStatus::Info,
            p,
            format!("Flight status detected: {raw}"),
        )
        .details(details)
    }
}

// ---------------------------------------------------------------------------
// 7. File completeness
// ---------------------------------------------------------------------------

fn count_issues(label: &str, plural: &str, count: usize, min: usize, max: usize) -> Option<String> {
    if count == 0 {
        Some(format!("No {label} provided"))
    } else if count < min || count > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min}-{max}")
        };
        Some(format!("{count} {plural} (expected {expected})"))
    } else {
        None
    }
}

/// Revalidate the hard file-count constraints.
pub fn file_completeness(meta: &FileMetadata, limits: &FileLimits) -> ValidationCheck {
    let p = Priority::Critical;
    let issues: Vec<String> = [
        count_issues("traveler document", "traveler documents", meta.traveler_count, limits.traveler, limits.traveler),
        count_issues("product image", "images", meta.image_count, limits.image, limits.image),
        count_issues("BOM files", "BOMs", meta.bom_count, limits.min_boms, limits.max_boms),
    ]
    .into_iter()
    .flatten()
    .collect();

    if issues.is_empty() {
        entry(
            FILE_COMPLETENESS,
            CheckStatus::Pass,
            p,
            format!(
                "All required files present: {} traveler, {} image, {} BOM(s)",
                meta.traveler_count, meta.image_count, meta.bom_count
            ),
        )
        .details(json!({
            "traveler_count": meta.traveler_count,
            "image_count": meta.image_count,
            "bom_count": meta.bom_count,
        }))
    } else {
        entry(
            FILE_COMPLETENESS,
            CheckStatus::Fail,
            p,
            format!("File completeness issues: {}", issues.join(", ")),
        )
        .details(json!({
            "traveler_count": meta.traveler_count,
            "image_count": meta.image_count,
            "bom_count": meta.bom_count,
            "issues": issues,
        }))
    }
}
