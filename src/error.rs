//! Error kinds used across the parser, reasoner, and cross-checker.
//!
//! Local/recoverable failures are plain [`std::io::Error`] values built with
//! a specific [`std::io::ErrorKind`] and a descriptive message. There is no
//! dedicated error enum: callers match on `.kind()`.

use std::io::{Error, ErrorKind};

/// The `$LogFile` restart page magic did not read `"RSTR"`. Fatal — the
/// file is not an NTFS transaction log.
pub fn invalid_restart(detail: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::InvalidData, format!("invalid restart page: {detail}"))
}

/// An `RCRD` page's magic did not validate. Local — the page is skipped,
/// the walk continues.
pub fn invalid_record_page(page_index: u64) -> Error {
    Error::new(
        ErrorKind::InvalidData,
        format!("page {page_index} is not a valid RCRD page"),
    )
}

/// A discovered candidate failed one of the seven header validation
/// predicates. Local — the candidate is discarded, scanning continues.
pub fn failed_record_validation(record_start: usize) -> Error {
    Error::new(
        ErrorKind::InvalidData,
        format!("candidate record at offset {record_start:#x} failed header validation"),
    )
}

/// Persistence backend refused an insert. Fatal.
pub fn store_error(detail: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Other, format!("store error: {detail}"))
}
