//! # Changelog Module
//!
//! Parsing and linting of reStructuredText release notes.
//!
//! Release notes are a newest-first list of releases, each headed by an
//! underlined `Release X.Y.Z (date)` title and holding bullet items grouped
//! under informal headings such as `**New Features**:`. Items may carry
//! cross-reference roles (``:func:`calcRMSD` ``) pointing at documented
//! symbols.
//!
//! - [`types`] - The parsed document model
//! - [`parser`] - Tolerant parsing that records markup problems as issues
//! - [`validator`] - Ordering, duplication, emptiness and cross-reference checks

pub mod parser;
pub mod types;
pub mod validator;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
