//! Error types for the pdfdesk library.
//!
//! Failures fall into three bands, and each band has its own type:
//!
//! * **Local validation**: [`AdmissionError`] (a candidate file was refused
//!   by the collection) and [`PreconditionError`] (a submission was refused
//!   before any request was built). Both are detected without touching the
//!   network and are never retried.
//!
//! * **Network**: [`TransportError`] (no usable HTTP response) and
//!   [`ChallengeError`] (the verification question could not be loaded).
//!
//! * **Fatal / API misuse**: [`DeskError`], returned as `Err` from
//!   configuration, file loading, reordering and download helpers.
//!
//! A remote rejection (`{"error": "..."}`) is deliberately *not* an error
//! type: it is a normal terminal state of a submission, reported as
//! [`crate::submission::SubmitOutcome::Failed`].
//!
//! The `Display` text of every variant is the message shown to the user.

use crate::variant::Variant;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the library.
#[derive(Debug, Error)]
pub enum DeskError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Ordering errors ───────────────────────────────────────────────────
    /// The variant does not let the user rearrange its files.
    #[error("{variant} does not support reordering files")]
    ReorderingUnsupported { variant: Variant },

    /// A requested order is not a permutation of the current files.
    #[error("Invalid file order: {0}")]
    InvalidOrder(String),

    /// An index-based operation referred past the end of the file list.
    #[error("Position {index} is out of range (the list has {len} files)")]
    IndexOutOfRange { index: usize, len: usize },

    // ── Download errors ───────────────────────────────────────────────────
    /// A downloaded result could not be written to disk.
    #[error("Failed to write downloaded file '{path}': {source}")]
    DownloadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a download reference failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Why a candidate file was refused by a [`crate::collection::ManagedFileCollection`].
///
/// Admission is evaluated per candidate; a batch collects one of these for
/// every refused file and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// Declared MIME type does not satisfy the variant's filter.
    #[error("File '{name}' ({mime}) is not {expected} and was skipped.")]
    WrongType {
        name: String,
        mime: String,
        expected: &'static str,
    },

    /// The collection already holds the maximum number of files.
    #[error("File '{name}' was skipped: you can add at most {max} files.")]
    CapacityExceeded { name: String, max: usize },

    /// A member with the same declared name is already present.
    #[error("File '{name}' has already been added.")]
    DuplicateName { name: String },
}

impl AdmissionError {
    /// Declared name of the refused candidate.
    pub fn file_name(&self) -> &str {
        match self {
            AdmissionError::WrongType { name, .. }
            | AdmissionError::CapacityExceeded { name, .. }
            | AdmissionError::DuplicateName { name } => name,
        }
    }
}

/// A submission refused locally, before any request was issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// There is nothing to submit.
    #[error("Please add at least one file first.")]
    EmptyCollection,

    /// The variant needs a verification answer and none was entered.
    #[error("Please answer the verification question before submitting.")]
    ChallengeAnswerMissing,

    /// A required tool parameter was left empty.
    #[error("Please enter a value for '{field}'.")]
    MissingParameter { field: &'static str },
}

/// No usable HTTP response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request exceeded the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// Connection refused, DNS failure, reset, unreadable body, …
    #[error("Network error or server is unreachable ({endpoint}): {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// Non-2xx status on a request whose body carries no message (downloads).
    #[error("Server answered HTTP {status} for '{endpoint}'")]
    Status { endpoint: String, status: u16 },
}

/// The verification question could not be loaded.
///
/// Terminal for that attempt: nothing retries automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    /// The service answered with a non-2xx status.
    #[error("Failed to load the verification question (HTTP {status}). Please retry.")]
    Unavailable { status: u16 },

    /// The service answered 2xx but without a `question`.
    #[error("Failed to load the verification question: the server sent no question. Please retry.")]
    MissingQuestion,

    /// The request itself failed.
    #[error("Failed to load the verification question. Please check your network and retry.\n{reason}")]
    Unreachable { reason: String },
}
