//! `shipcheck-engine`: identifier normalization and cross-source validation
//! for traveler documents, hardware photos, and BOM spreadsheets.
//!
//! Pure engine crate: receives already-extracted field bags, returns normalized
//! records and a validation report. No CLI or document-extraction dependencies.

pub mod bom;
pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod fields;
pub mod model;
pub mod normalize;
pub mod pipeline;

pub use config::ValidationConfig;
pub use engine::ValidationEngine;
pub use error::ShipcheckError;
pub use fields::{BomFields, ImageFields, RawFieldBag, SourceFields, TravelerFields};
pub use model::{
    CheckStatus, FileMetadata, NormalizedRecord, OverallStatus, SourceKind, ValidationCheck,
    ValidationInput, ValidationResult,
};
pub use normalize::Normalizer;
pub use pipeline::{run_session, SessionBundle, SessionOutput};
