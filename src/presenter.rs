//! Rendering-surface callbacks for a workflow.
//!
//! Inject an [`Arc<dyn ResultPresenter>`] into [`crate::workflow::Workflow::open`]
//! to be told when the file list changes, a verification question arrives,
//! or a submission starts and ends. The workflow never renders anything
//! itself; a GUI, a terminal spinner or a test recorder all plug in here.
//!
//! # Example
//!
//! ```rust
//! use pdfdesk::{ResultPresenter, SubmissionResult};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct LastLinks(Mutex<Vec<String>>);
//!
//! impl ResultPresenter for LastLinks {
//!     fn on_success(&self, result: &SubmissionResult) {
//!         *self.0.lock().unwrap() = result
//!             .downloads
//!             .iter()
//!             .map(|d| d.as_str().to_string())
//!             .collect();
//!     }
//! }
//!
//! let presenter: Arc<dyn ResultPresenter> = Arc::new(LastLinks::default());
//! ```

use crate::submission::SubmissionResult;
use std::sync::Arc;

/// Receives workflow events. Every method defaults to a no-op.
///
/// Must be `Send + Sync`: a UI thread may hold the presenter while the
/// workflow awaits a response on a runtime worker.
pub trait ResultPresenter: Send + Sync {
    /// The file list changed; `names` is the new list in current order.
    fn on_collection_changed(&self, names: &[String]) {
        let _ = names;
    }

    /// One combined message for every file refused in a batch.
    fn on_admission_errors(&self, message: &str) {
        let _ = message;
    }

    fn on_challenge_loaded(&self, question: &str) {
        let _ = question;
    }

    fn on_challenge_failed(&self, message: &str) {
        let _ = message;
    }

    /// A request is about to be sent.
    ///
    /// # Arguments
    /// * `label` - progress text for the variant, e.g. "Merging your PDFs..."
    fn on_submit_start(&self, label: &str) {
        let _ = label;
    }

    fn on_success(&self, result: &SubmissionResult) {
        let _ = result;
    }

    /// A submission ended without a result, or was refused locally.
    fn on_failure(&self, message: &str) {
        let _ = message;
    }
}

/// Discards every event.
pub struct NoopPresenter;

impl ResultPresenter for NoopPresenter {}

/// Shared presenter handle as stored by a workflow.
pub type Presenter = Arc<dyn ResultPresenter>;


#[cfg(test)]
mod tests {
    use super::recording::{Event, RecordingPresenter};
    use super::*;
    use crate::submission::DownloadRef;

    #[test]
    fn noop_presenter_does_not_panic() {
        let p = NoopPresenter;
        p.on_collection_changed(&["a.pdf".into()]);
        p.on_admission_errors("x");
        p.on_submit_start("Merging your PDFs...");
        p.on_failure("boom");
    }

    #[test]
    fn arc_dyn_presenter_forwards_events() {
        let rec = RecordingPresenter::new();
        let p: Presenter = rec.clone();
        let result = SubmissionResult {
            downloads: vec![DownloadRef::new("/dl/x.pdf")],
        };
        p.on_submit_start("Compressing your PDF...");
        p.on_success(&result);
        assert_eq!(
            rec.events(),
            vec![
                Event::SubmitStart("Compressing your PDF...".into()),
                Event::Success(result),
            ]
        );
    }
}
