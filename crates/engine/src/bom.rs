use log::info;

use crate::fields::{BomFields, BomPart, JobSource};

/// Fold per-file BOM bags into one, tagging every job and part with the file
/// it came from. Unnamed files are labelled `BOM 1`, `BOM 2`, ... by position
/// in `files`. A bag that already carries `job_sources` keeps them as-is.
pub fn aggregate_bom_files(files: &[BomFields]) -> BomFields {
    let mut aggregate = BomFields::default();

    for (i, file) in files.iter().enumerate() {
        let label = file
            .file_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("BOM {}", i + 1));

        let attributed = !file.job_sources.is_empty();
        for job in file.job_number.iter().chain(file.job_numbers.iter()) {
            aggregate.job_numbers.push(job.clone());
            if !attributed {
                aggregate.job_sources.push(JobSource {
                    job_number: job.clone(),
                    file_name: label.clone(),
                });
            }
        }
        aggregate.job_sources.extend(file.job_sources.iter().cloned());

        for entry in &file.part_numbers {
            aggregate.parts.push(BomPart {
                part_number: entry.part.clone(),
                revision: entry.revision.clone(),
                row_number: None,
                source_file: Some(label.clone()),
            });
        }
        for part in &file.parts {
            aggregate.parts.push(BomPart {
                source_file: part.source_file.clone().or_else(|| Some(label.clone())),
                ..part.clone()
            });
        }
    }

    info!(
        "[BOM] Aggregated {} file(s): {} job entries, {} part rows",
        files.len(),
        aggregate.job_numbers.len(),
        aggregate.parts.len()
    );
    aggregate
}
