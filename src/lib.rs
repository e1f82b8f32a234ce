//! # pdfdesk
//!
//! Client for a PDF and image processing service: merge, split and compress
//! PDFs, convert images between formats, and bind images into a PDF.
//!
//! Every tool follows the same workflow. Collect local files, optionally
//! rearrange them and set tool options, answer a verification question when
//! the tool asks for one, submit, then fetch the returned files or show the
//! error. This crate implements that workflow once, parameterised by
//! [`Variant`].
//!
//! ## Workflow Overview
//!
//! ```text
//! Workflow::open(variant)
//!  │
//!  ├─ 1. Challenge  GET /api/captcha (merge, split, img2img, img2pdf)
//!  ├─ 2. Collect    admit / remove files; type, count and name rules per variant
//!  ├─ 3. Arrange    reorder (merge, img2pdf) and set options
//!  ├─ 4. Submit     local checks, then one multipart POST at a time
//!  └─ 5. Route      download links to the presenter, or one error message;
//!                   an answer rejection reloads the question
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfdesk::{ClientConfig, HttpTransport, ManagedFile, NoopPresenter, SubmitOutcome, Variant, Workflow};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder().base_url("http://127.0.0.1:5000").build()?;
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!     let mut merge = Workflow::open(Variant::Merge, transport, Arc::new(NoopPresenter)).await;
//!
//!     merge.admit(ManagedFile::from_path("a.pdf").await?)?;
//!     merge.admit(ManagedFile::from_path("b.pdf").await?)?;
//!     merge.set_order(&["b.pdf", "a.pdf"])?;
//!     println!("{}", merge.challenge().question.as_deref().unwrap_or("?"));
//!     merge.set_answer("7");
//!
//!     match merge.submit().await {
//!         SubmitOutcome::Succeeded(result) => println!("{}", result.downloads[0]),
//!         other => eprintln!("{:?}", other.message()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfdesk` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfdesk = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod challenge;
pub mod collection;
pub mod config;
pub mod download;
pub mod error;
pub mod ordering;
pub mod presenter;
pub mod submission;
pub mod transport;
pub mod variant;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use challenge::{ChallengeGate, ChallengeState};
pub use collection::{BatchAdmission, FileId, ManagedFile, ManagedFileCollection};
pub use config::{
    ClientConfig, ClientConfigBuilder, CompressionLevel, ImageFormat, SplitMode, ToolOptions,
};
pub use download::save_all;
pub use error::{AdmissionError, ChallengeError, DeskError, PreconditionError, TransportError};
pub use ordering::OrderingController;
pub use presenter::{NoopPresenter, Presenter, ResultPresenter};
pub use submission::{
    DownloadRef, FailureKind, SubmissionController, SubmissionFailure, SubmissionRequest,
    SubmissionResult, SubmissionState, SubmitOutcome,
};
pub use transport::{HttpTransport, ReplyBody, ServiceReply, Transport};
pub use variant::{ResponseShape, TypeFilter, Variant, VariantConfig};
pub use workflow::Workflow;
