//! Canonicalization of extracted identifiers.
//!
//! Every scalar normalizer is total: it returns `None` for input it cannot
//! repair and never guesses. [`Normalizer`] folds a whole source's fields into
//! a [`NormalizedRecord`], recording a note for each serial it had to rewrite.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::{BomFields, BomPart, ImageFields, PartEntry, RawFieldBag, SourceFields, TravelerFields};
use crate::model::{NormalizedRecord, PartRevision, SourceKind};

static BOARD_SERIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:VGN-?)?([0-9]{5})-?([0-9]{4})$").expect("board serial pattern"));
static UNIT_SERIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:INF-?)?([0-9]{4})$").expect("unit serial pattern"));
static PART_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3,}-[A-Z0-9-]+$").expect("part number pattern"));
static REV_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^REV\s*").expect("revision prefix pattern"));

// ---------------------------------------------------------------------------
// Scalar normalizers
// ---------------------------------------------------------------------------

/// Keep the digits; accept exactly five. `"Job: 82334"` -> `"82334"`.
pub fn normalize_job_number(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 5 {
        Some(digits)
    } else {
        warn!("[Normalizer] Invalid job number format: '{raw}'");
        None
    }
}

/// `INF-####`, `INF####` and bare `####` all become `INF-####`.
pub fn normalize_unit_serial(raw: &str) -> Option<String> {
    let serial = raw.trim().to_uppercase();
    if serial.is_empty() {
        return None;
    }
    match UNIT_SERIAL.captures(&serial) {
        Some(caps) => Some(format!("INF-{}", &caps[1])),
        None => {
            warn!("[Normalizer] Invalid unit serial format: '{serial}'");
            None
        }
    }
}

/// Resolve to `VGN-#####-####`, tolerating a missing prefix or missing dashes.
pub fn normalize_board_serial(raw: &str) -> Option<String> {
    let serial = raw.trim().to_uppercase();
    if serial.is_empty() {
        return None;
    }
    match BOARD_SERIAL.captures(&serial) {
        Some(caps) => Some(format!("VGN-{}-{}", &caps[1], &caps[2])),
        None => {
            warn!("[Normalizer] Invalid board serial format: '{serial}'");
            None
        }
    }
}

/// Uppercase; three or more letters, a dash, then letters/digits/dashes.
pub fn normalize_part_number(raw: &str) -> Option<String> {
    let part = raw.trim().to_uppercase();
    if part.is_empty() {
        return None;
    }
    if PART_NUMBER.is_match(&part) {
        Some(part)
    } else {
        warn!("[Normalizer] Invalid part number format: '{part}'");
        None
    }
}

/// `"Rev F2"`, `"f2"` and `"REV. F2"` all become `"F2"`.
pub fn normalize_revision(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let stripped = REV_PREFIX.replace(&upper, "");
    let revision = stripped.trim_matches(|c| matches!(c, '.' | ' ' | '-' | '_'));
    if revision.is_empty() {
        None
    } else {
        Some(revision.to_string())
    }
}

// ---------------------------------------------------------------------------
// Record builder
// ---------------------------------------------------------------------------

struct RecordBuilder {
    record: NormalizedRecord,
}

impl RecordBuilder {
    fn new(source: SourceKind) -> Self {
        Self {
            record: NormalizedRecord::empty(source),
        }
    }

    fn add_job(&mut self, raw: &str) -> Option<String> {
        let job = normalize_job_number(raw)?;
        self.record.job_numbers.insert(job.clone());
        Some(job)
    }

    fn add_board_serial(&mut self, raw: &str) -> Option<String> {
        let serial = normalize_board_serial(raw)?;
        if serial != raw.trim().to_uppercase() {
            self.note(format!("Board serial: '{raw}' → '{serial}'"));
        }
        self.record.board_serials.insert(serial.clone());
        Some(serial)
    }

    fn add_unit_serial(&mut self, raw: &str) {
        if let Some(unit) = normalize_unit_serial(raw) {
            if unit != raw.trim().to_uppercase() {
                self.note(format!("Unit serial: '{raw}' → '{unit}'"));
            }
            self.record.unit_serials.insert(unit);
        }
    }

    fn add_part(&mut self, raw_part: &str, raw_revision: Option<&str>, source_file: Option<&str>) {
        let Some(part_number) = normalize_part_number(raw_part) else {
            return;
        };
        self.record.part_numbers.insert(part_number.clone());
        self.record.parts_with_revisions.push(PartRevision {
            part_number,
            revision: raw_revision.and_then(normalize_revision),
            source_file: source_file.map(str::to_string),
        });
    }

    fn add_job_source(&mut self, raw_job: &str, file_name: &str) {
        if let Some(job) = self.add_job(raw_job) {
            let files = self.record.job_sources.entry(job).or_default();
            if !files.iter().any(|f| f == file_name) {
                files.push(file_name.to_string());
            }
        }
    }

    /// Serials listed per board: merged into the serial set and attributed to
    /// the board's part number. The first board claiming a serial keeps it.
    /// Serials under an invalid part key are kept but left unattributed.
    fn add_serials_by_part(&mut self, by_part: &BTreeMap<String, Vec<String>>) {
        for (raw_part, serials) in by_part {
            let part = normalize_part_number(raw_part);
            for raw in serials {
                let Some(serial) = self.add_board_serial(raw) else {
                    continue;
                };
                if let Some(part) = &part {
                    self.record
                        .board_serial_parts
                        .entry(serial)
                        .or_insert_with(|| part.clone());
                }
            }
        }
    }

    fn add_document(
        &mut self,
        job_number: Option<&str>,
        job_numbers: &[String],
        unit_serial: Option<&str>,
        board_serials: &[String],
        part_numbers: &[PartEntry],
    ) {
        for raw in job_number.into_iter().chain(job_numbers.iter().map(String::as_str)) {
            self.add_job(raw);
        }
        for raw in board_serials {
            self.add_board_serial(raw);
        }
        if let Some(raw) = unit_serial {
            self.add_unit_serial(raw);
        }
        for entry in part_numbers {
            self.add_part(&entry.part, entry.revision.as_deref(), None);
        }
    }

    fn note(&mut self, note: String) {
        debug!("[Normalizer] {note}");
        self.record.normalization_applied.push(note);
    }

    fn finish(mut self) -> NormalizedRecord {
        for files in self.record.job_sources.values_mut() {
            files.sort();
        }
        let r = &self.record;
        info!(
            "[Normalizer] Normalized {}: {} jobs, {} parts, {} boards, {} units, {} corrections",
            r.source,
            r.job_numbers.len(),
            r.part_numbers.len(),
            r.board_serials.len(),
            r.unit_serials.len(),
            r.normalization_applied.len()
        );
        self.record
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Stateless; any number of instances may be used concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, fields: &SourceFields) -> NormalizedRecord {
        info!("[Normalizer] Normalizing data from {}", fields.kind());
        match fields {
            SourceFields::Traveler(t) => self.normalize_traveler(t),
            SourceFields::Image(i) => self.normalize_image(i),
            SourceFields::Bom(b) => self.normalize_bom(b),
        }
    }

    /// Raw-bag entry point: adapt, then normalize.
    pub fn normalize_extracted_data(&self, bag: &RawFieldBag, source: SourceKind) -> NormalizedRecord {
        self.normalize(&SourceFields::from_raw(source, bag))
    }

    fn normalize_traveler(&self, t: &TravelerFields) -> NormalizedRecord {
        let mut b = RecordBuilder::new(SourceKind::Traveler);
        b.add_document(
            t.job_number.as_deref(),
            &t.job_numbers,
            t.unit_serial.as_deref(),
            &t.board_serials,
            &t.part_numbers,
        );
        b.add_serials_by_part(&t.board_serials_raw);
        b.finish()
    }

    fn normalize_image(&self, i: &ImageFields) -> NormalizedRecord {
        let mut b = RecordBuilder::new(SourceKind::Image);
        b.add_document(
            i.job_number.as_deref(),
            &i.job_numbers,
            i.unit_serial.as_deref(),
            &i.board_serials,
            &i.part_numbers,
        );
        b.add_serials_by_part(&i.board_serials_raw);
        b.finish()
    }

    fn normalize_bom(&self, bom: &BomFields) -> NormalizedRecord {
        let mut b = RecordBuilder::new(SourceKind::Bom);
        for raw in bom.job_number.iter().chain(bom.job_numbers.iter()) {
            b.add_job(raw);
        }
        for source in &bom.job_sources {
            b.add_job_source(&source.job_number, &source.file_name);
        }
        let file = bom.file_name.as_deref();
        for entry in &bom.part_numbers {
            b.add_part(&entry.part, entry.revision.as_deref(), file);
        }
        for BomPart {
            part_number,
            revision,
            source_file,
            ..
        } in &bom.parts
        {
            b.add_part(part_number, revision.as_deref(), source_file.as_deref().or(file));
        }
        if let Some(name) = file {
            let jobs: Vec<String> = b.record.job_numbers.iter().cloned().collect();
            for job in jobs {
                b.add_job_source(&job, name);
            }
        }
        b.finish()
    }
}
