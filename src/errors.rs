//! Import errors
//!
//! Malformed source data (out-of-range indices, unreadable names) is fatal to the
//! entire import: downstream stages assume a well-formed tree, so the error is
//! propagated straight to the importer entry point and no further work happens.
//! Degenerate geometry is *not* an error anywhere in this crate; it is silently
//! dropped at the point of detection.

/// All the ways an already-parsed BSP structure can turn out to be malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BspError {
    /// An index into one of the source arrays is out of range.
    #[error("{kind} index {index} out of range (len = {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    /// A texture-name string-table entry does not point at valid UTF-8.
    #[error("texture name at string-data offset {offset} is not valid UTF-8")]
    InvalidTextureName { offset: usize },
    /// The file has no models at all, so there is no world geometry to import.
    #[error("source data contains no models")]
    NoModels,
}
