//! Zip extraction into the temporary working area.

mod error;
mod extractor;

pub use error::ExtractionError;
pub use extractor::{ExtractStats, extract_archive};
