//! One tool page: files, order, verification answer, options and submission.
//!
//! A [`Workflow`] is created when a tool view opens and dropped when it
//! closes. It owns its collection, ordering and challenge state outright;
//! nothing is shared between workflows except the transport.
//!
//! ```text
//!   admit / remove / reorder ──▶ ManagedFileCollection + OrderingController
//!                                          │
//!   set_answer ──▶ ChallengeGate           │
//!                        │                 ▼
//!                        └────────▶ build_request() ──▶ SubmissionController ──▶ Transport
//!                                                                │
//!           ResultPresenter ◀──── success / failure ─────────────┘
//!           ChallengeGate::load ◀── rejection mentioning the answer
//! ```

use crate::challenge::{ChallengeGate, ChallengeState};
use crate::collection::{BatchAdmission, FileId, ManagedFile, ManagedFileCollection};
use crate::config::{CompressionLevel, ImageFormat, SplitMode, ToolOptions};
use crate::error::{AdmissionError, ChallengeError, DeskError, PreconditionError};
use crate::ordering::OrderingController;
use crate::presenter::Presenter;
use crate::submission::{SubmissionController, SubmissionRequest, SubmissionState, SubmitOutcome};
use crate::transport::Transport;
use crate::variant::{Variant, VariantConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Form field carrying the verification answer.
pub const ANSWER_FIELD: &str = "captcha_answer";
/// Repeated form field carrying the submission order by name.
pub const ORDER_FIELD: &str = "order[]";

pub struct Workflow {
    config: VariantConfig,
    collection: ManagedFileCollection,
    ordering: OrderingController,
    challenge: ChallengeGate,
    options: ToolOptions,
    controller: Arc<SubmissionController>,
    presenter: Presenter,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("variant", &self.config.variant)
            .field("files", &self.current_names())
            .field("challenge", self.challenge.state())
            .field("options", &self.options)
            .field("state", &self.controller.state())
            .finish()
    }
}

impl Workflow {
    /// Create a workflow without touching the network.
    pub fn new(variant: Variant, transport: Arc<dyn Transport>, presenter: Presenter) -> Self {
        let config = variant.config();
        Self {
            config,
            collection: ManagedFileCollection::new(config),
            ordering: OrderingController::new(),
            challenge: ChallengeGate::new(transport.clone()),
            options: ToolOptions::default(),
            controller: Arc::new(SubmissionController::new(transport)),
            presenter,
        }
    }

    /// Create a workflow and, for variants that need one, load the first
    /// verification question.
    ///
    /// A failed load is reported to the presenter and leaves the question
    /// empty; the workflow is still returned so the user can retry with
    /// [`reload_challenge`](Self::reload_challenge).
    pub async fn open(
        variant: Variant,
        transport: Arc<dyn Transport>,
        presenter: Presenter,
    ) -> Self {
        let mut workflow = Self::new(variant, transport, presenter);
        info!("Opened {} workflow", variant);
        if workflow.config.requires_challenge {
            // Reported through the presenter.
            let _ = workflow.reload_challenge().await;
        }
        workflow
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    // ── Files ────────────────────────────────────────────────────────────

    fn notify_collection(&self) {
        self.presenter.on_collection_changed(&self.current_names());
    }

    /// Admit one file. A refusal is also reported to the presenter.
    pub fn admit(&mut self, file: ManagedFile) -> Result<FileId, AdmissionError> {
        match self.collection.admit(file) {
            Ok(id) => {
                self.notify_collection();
                Ok(id)
            }
            Err(e) => {
                self.presenter.on_admission_errors(&e.to_string());
                Err(e)
            }
        }
    }

    /// Admit a batch (a multi-file pick or drop). Each file is judged on its
    /// own; all refusals are reported as one message.
    pub fn admit_batch(&mut self, files: impl IntoIterator<Item = ManagedFile>) -> BatchAdmission {
        let report = self.collection.admit_batch(files);
        if !report.accepted.is_empty() {
            self.notify_collection();
        }
        if let Some(message) = report.message() {
            warn!("{} of the files were refused", report.rejected.len());
            self.presenter.on_admission_errors(&message);
        }
        report
    }

    /// Replace the current content with one file (picking a new file on a
    /// single-file tool). On refusal the current file stays.
    pub fn replace(&mut self, file: ManagedFile) -> Result<FileId, AdmissionError> {
        match self.collection.replace(file) {
            Ok(id) => {
                self.ordering.reset();
                self.notify_collection();
                Ok(id)
            }
            Err(e) => {
                self.presenter.on_admission_errors(&e.to_string());
                Err(e)
            }
        }
    }

    /// Remove a file by id. No-op when absent.
    pub fn remove(&mut self, id: FileId) -> Option<ManagedFile> {
        let removed = self.collection.remove(id);
        if removed.is_some() {
            self.notify_collection();
        }
        removed
    }

    /// Remove the file shown at `index` in the current order.
    ///
    /// Indices shift after every removal; re-read [`current_order`](Self::current_order)
    /// rather than reusing an index.
    pub fn remove_at(&mut self, index: usize) -> Option<ManagedFile> {
        let id = *self.current_order().get(index)?;
        self.remove(id)
    }

    /// Remove every file with this name.
    pub fn remove_named(&mut self, name: &str) -> usize {
        let removed = self.collection.remove_named(name).len();
        if removed > 0 {
            self.notify_collection();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.collection.clear();
        self.ordering.reset();
        self.notify_collection();
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn collection(&self) -> &ManagedFileCollection {
        &self.collection
    }

    // ── Order ────────────────────────────────────────────────────────────

    fn ensure_reorderable(&self) -> Result<(), DeskError> {
        if self.config.reorderable {
            Ok(())
        } else {
            Err(DeskError::ReorderingUnsupported {
                variant: self.config.variant,
            })
        }
    }

    /// Move the file at position `from` to position `to`.
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<(), DeskError> {
        self.ensure_reorderable()?;
        self.ordering.move_item(&self.collection, from, to)?;
        self.notify_collection();
        Ok(())
    }

    /// Set the whole order from a list of names (a permutation of the current files).
    pub fn set_order<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), DeskError> {
        self.ensure_reorderable()?;
        self.ordering.set_order(&self.collection, names)?;
        self.notify_collection();
        Ok(())
    }

    /// Ids in submission order, derived from the live collection on every call.
    pub fn current_order(&self) -> Vec<FileId> {
        self.ordering.current_order(&self.collection)
    }

    pub fn current_names(&self) -> Vec<String> {
        self.ordering.current_names(&self.collection)
    }

    // ── Verification ─────────────────────────────────────────────────────

    pub fn challenge(&self) -> &ChallengeState {
        self.challenge.state()
    }

    pub fn set_answer(&mut self, text: impl Into<String>) {
        self.challenge.set_answer(text);
    }

    /// Fetch a new verification question and tell the presenter about it.
    pub async fn reload_challenge(&mut self) -> Result<String, ChallengeError> {
        match self.challenge.load().await {
            Ok(question) => {
                let question = question.to_string();
                self.presenter.on_challenge_loaded(&question);
                Ok(question)
            }
            Err(e) => {
                self.presenter.on_challenge_failed(&e.to_string());
                Err(e)
            }
        }
    }

    // ── Options ──────────────────────────────────────────────────────────

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ToolOptions) {
        self.options = options;
    }

    pub fn set_compression_level(&mut self, level: CompressionLevel) {
        self.options.compression_level = level;
    }

    pub fn set_output_format(&mut self, format: ImageFormat) {
        self.options.output_format = format;
    }

    pub fn set_split_mode(&mut self, mode: SplitMode) {
        self.options.split_mode = mode;
    }

    pub fn set_page_ranges(&mut self, ranges: impl Into<String>) {
        self.options.page_ranges = ranges.into();
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Check preconditions and assemble the request from the current state.
    ///
    /// Checks run in a fixed order (files, answer, parameters) and the first
    /// failure is returned.
    pub fn build_request(&self) -> Result<SubmissionRequest, PreconditionError> {
        if self.collection.is_empty() {
            return Err(PreconditionError::EmptyCollection);
        }
        if self.config.requires_challenge && !self.challenge.is_satisfied_locally() {
            return Err(PreconditionError::ChallengeAnswerMissing);
        }
        let ranges = self.options.page_ranges.trim();
        if self.config.variant == Variant::Split
            && self.options.split_mode == SplitMode::CustomRanges
            && ranges.is_empty()
        {
            return Err(PreconditionError::MissingParameter {
                field: "page_ranges",
            });
        }

        let order = self.current_order();
        let files: Vec<(&'static str, ManagedFile)> = order
            .iter()
            .filter_map(|id| self.collection.get(*id))
            .map(|f| (self.config.file_field, f.clone()))
            .collect();

        let mut fields: Vec<(String, String)> = Vec::new();
        if self.config.reorderable {
            for (_, file) in &files {
                fields.push((ORDER_FIELD.into(), file.name().to_string()));
            }
        }
        match self.config.variant {
            Variant::Compress => {
                fields.push(("level".into(), self.options.compression_level.to_string()));
            }
            Variant::Split => {
                fields.push(("split_option".into(), self.options.split_mode.to_string()));
                if self.options.split_mode == SplitMode::CustomRanges {
                    fields.push(("page_ranges".into(), ranges.to_string()));
                }
            }
            Variant::ImageToImage => {
                fields.push(("format".into(), self.options.output_format.to_string()));
            }
            Variant::Merge | Variant::ImageToPdf => {}
        }
        if self.config.requires_challenge {
            fields.push((ANSWER_FIELD.into(), self.challenge.answer().to_string()));
        }

        Ok(SubmissionRequest {
            endpoint: self.config.endpoint,
            files,
            fields,
        })
    }

    /// Validate, send and route one submission.
    ///
    /// Local refusals never reach the controller. When the service blames
    /// the verification answer, the answer is cleared and a new question is
    /// loaded before this returns. The file list is never touched.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                debug!("Submission refused locally: {}", e);
                self.presenter.on_failure(&e.to_string());
                return SubmitOutcome::Refused(e);
            }
        };

        if self.controller.is_in_flight() {
            return SubmitOutcome::Busy;
        }
        self.presenter.on_submit_start(self.config.progress_label);
        let outcome = self.controller.dispatch(request, &self.config).await;

        match &outcome {
            SubmitOutcome::Succeeded(result) => {
                info!("{}", self.config.complete_label);
                self.presenter.on_success(result);
            }
            SubmitOutcome::Failed(failure) => {
                self.presenter.on_failure(&failure.message);
                if failure.challenge_rejected() && self.config.requires_challenge {
                    info!("Verification answer rejected, loading a new question");
                    self.challenge.invalidate();
                    // Reported through the presenter.
                    let _ = self.reload_challenge().await;
                }
            }
            SubmitOutcome::Busy | SubmitOutcome::Refused(_) => {}
        }
        outcome
    }

    /// Shared handle for cancelling or observing the submission from elsewhere.
    pub fn controller(&self) -> Arc<SubmissionController> {
        self.controller.clone()
    }

    pub fn state(&self) -> SubmissionState {
        self.controller.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::presenter::recording::{Event, RecordingPresenter};
    use crate::submission::{DownloadRef, FailureKind, SubmissionResult};
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::{ReplyBody, ServiceReply};
    use crate::variant::MAX_IMAGES;
    use std::time::Duration;

    fn pdf(name: &str) -> ManagedFile {
        ManagedFile::new(name, "application/pdf", b"%PDF-1.7".to_vec())
    }

    fn png(name: &str) -> ManagedFile {
        ManagedFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn reply(status: u16, body: ReplyBody) -> Result<ServiceReply, TransportError> {
        Ok(ServiceReply::new(status, body))
    }

    fn single(url: &str) -> Result<ServiceReply, TransportError> {
        reply(
            200,
            ReplyBody {
                download_url: Some(url.into()),
                ..ReplyBody::default()
            },
        )
    }

    fn error(status: u16, message: &str) -> Result<ServiceReply, TransportError> {
        reply(
            status,
            ReplyBody {
                error: Some(message.into()),
                ..ReplyBody::default()
            },
        )
    }

    #[tokio::test]
    async fn merge_sends_latest_order_and_succeeds() {
        let t = ScriptedTransport::new();
        t.push_question("What is 3 + 4?");
        t.push_submission(single("/dl/x.pdf"));
        let mut wf = Workflow::open(Variant::Merge, t.clone(), RecordingPresenter::new()).await;

        wf.admit(pdf("a.pdf")).unwrap();
        wf.admit(pdf("b.pdf")).unwrap();
        wf.set_order(&["b.pdf", "a.pdf"]).unwrap();
        wf.set_answer("7");

        let outcome = wf.submit().await;
        let expected = SubmissionResult {
            downloads: vec![DownloadRef::new("/dl/x.pdf")],
        };
        assert_eq!(outcome, SubmitOutcome::Succeeded(expected.clone()));
        assert_eq!(wf.state(), SubmissionState::Succeeded(expected));

        let sent = t.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].endpoint, "/api/merge");
        assert_eq!(sent[0].order(), vec!["b.pdf", "a.pdf"]);
        assert_eq!(sent[0].file_names(), vec!["b.pdf", "a.pdf"]);
        assert_eq!(sent[0].field(ANSWER_FIELD), Some("7"));
        assert!(sent[0].files.iter().all(|(field, _)| *field == "files[]"));
    }

    #[tokio::test]
    async fn captcha_rejection_clears_answer_and_reloads() {
        let t = ScriptedTransport::new();
        t.push_question("What is 3 + 4?");
        t.push_question("What is 2 + 2?");
        t.push_submission(error(400, "Invalid captcha answer"));
        let rec = RecordingPresenter::new();
        let mut wf = Workflow::open(Variant::Merge, t.clone(), rec.clone()).await;
        wf.admit(pdf("a.pdf")).unwrap();
        wf.set_answer("8");

        let outcome = wf.submit().await;
        match outcome {
            SubmitOutcome::Failed(f) => assert_eq!(f.kind, FailureKind::ChallengeRejected),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(wf.state(), SubmissionState::Failed("Invalid captcha answer".into()));
        assert_eq!(wf.challenge().answer, "");
        assert_eq!(wf.challenge().question.as_deref(), Some("What is 2 + 2?"));
        assert!(!wf.challenge().stale);
        assert_eq!(t.challenge_count(), 2);
        assert_eq!(wf.current_names(), vec!["a.pdf"]);
        assert!(rec
            .events()
            .contains(&Event::ChallengeLoaded("What is 2 + 2?".into())));
    }

    #[tokio::test]
    async fn captcha_error_on_success_status_still_reloads() {
        let t = ScriptedTransport::new();
        t.push_question("What is 3 + 4?");
        t.push_question("What is 6 + 1?");
        t.push_submission(error(200, "Invalid CAPTCHA answer."));
        let rec = RecordingPresenter::new();
        let mut wf = Workflow::open(Variant::Merge, t.clone(), rec.clone()).await;
        wf.admit(pdf("a.pdf")).unwrap();
        wf.set_answer("9");

        match wf.submit().await {
            SubmitOutcome::Failed(f) => {
                assert_eq!(f.kind, FailureKind::ChallengeRejected);
                assert_eq!(f.message, "Invalid CAPTCHA answer.");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(wf.challenge().answer, "");
        assert_eq!(wf.challenge().question.as_deref(), Some("What is 6 + 1?"));
        assert_eq!(t.challenge_count(), 2);
        assert!(rec
            .events()
            .contains(&Event::Failure("Invalid CAPTCHA answer.".into())));
    }

    #[tokio::test]
    async fn abandoned_submit_allows_the_next_one() {
        let t = ScriptedTransport::with_delay(Duration::from_millis(500));
        t.push_submission(single("/dl/late.pdf"));
        t.push_submission(single("/dl/again.pdf"));
        let mut wf = Workflow::new(Variant::Compress, t.clone(), RecordingPresenter::new());
        wf.admit(pdf("doc.pdf")).unwrap();

        let elapsed = tokio::time::timeout(Duration::from_millis(50), wf.submit()).await;
        assert!(elapsed.is_err());
        assert!(!wf.controller().is_in_flight());

        match wf.submit().await {
            SubmitOutcome::Succeeded(r) => assert_eq!(r.downloads[0].as_str(), "/dl/again.pdf"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(t.sent_count(), 2);
    }

    #[tokio::test]
    async fn other_rejections_keep_the_answer() {
        let t = ScriptedTransport::new();
        t.push_question("q");
        t.push_submission(error(400, "Failed to merge PDFs"));
        let mut wf = Workflow::open(Variant::Merge, t.clone(), RecordingPresenter::new()).await;
        wf.admit(pdf("a.pdf")).unwrap();
        wf.set_answer("7");
        assert!(matches!(wf.submit().await, SubmitOutcome::Failed(_)));
        assert_eq!(wf.challenge().answer, "7");
        assert_eq!(t.challenge_count(), 1);
    }

    #[tokio::test]
    async fn split_custom_without_ranges_is_refused_locally() {
        let t = ScriptedTransport::new();
        t.push_question("q");
        let mut wf = Workflow::open(Variant::Split, t.clone(), RecordingPresenter::new()).await;
        wf.admit(pdf("doc.pdf")).unwrap();
        wf.set_answer("7");
        wf.set_split_mode(SplitMode::CustomRanges);
        wf.set_page_ranges("   ");

        assert_eq!(
            wf.submit().await,
            SubmitOutcome::Refused(PreconditionError::MissingParameter {
                field: "page_ranges"
            })
        );
        assert_eq!(t.sent_count(), 0);
        assert_eq!(wf.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn split_sends_trimmed_ranges_only_for_custom_mode() {
        let t = ScriptedTransport::new();
        t.push_question("q");
        let mut wf = Workflow::open(Variant::Split, t, RecordingPresenter::new()).await;
        wf.admit(pdf("doc.pdf")).unwrap();
        wf.set_answer("7");
        wf.set_page_ranges(" 1-3, 5 ");

        let all = wf.build_request().unwrap();
        assert_eq!(all.field("split_option"), Some("all_pages"));
        assert_eq!(all.field("page_ranges"), None);
        assert_eq!(all.files[0].0, "file");

        wf.set_split_mode(SplitMode::CustomRanges);
        let custom = wf.build_request().unwrap();
        assert_eq!(custom.field("split_option"), Some("custom_ranges"));
        assert_eq!(custom.field("page_ranges"), Some("1-3, 5"));
        assert!(custom.order().is_empty());
    }

    #[tokio::test]
    async fn missing_answer_is_refused_before_network() {
        let t = ScriptedTransport::new();
        t.push_question("q");
        let rec = RecordingPresenter::new();
        let mut wf = Workflow::open(Variant::ImageToPdf, t.clone(), rec.clone()).await;
        wf.admit(png("p.png")).unwrap();
        assert_eq!(
            wf.submit().await,
            SubmitOutcome::Refused(PreconditionError::ChallengeAnswerMissing)
        );
        assert_eq!(t.sent_count(), 0);
        assert!(matches!(rec.events().last(), Some(Event::Failure(_))));
    }

    #[tokio::test]
    async fn empty_collection_is_checked_first() {
        let t = ScriptedTransport::new();
        let mut wf = Workflow::new(Variant::Merge, t.clone(), RecordingPresenter::new());
        assert_eq!(
            wf.submit().await,
            SubmitOutcome::Refused(PreconditionError::EmptyCollection)
        );
        assert_eq!(t.sent_count(), 0);
    }

    #[tokio::test]
    async fn compress_needs_no_challenge_and_sends_level() {
        let t = ScriptedTransport::new();
        t.push_submission(single("/uploads/abc_doc.pdf"));
        let mut wf = Workflow::open(Variant::Compress, t.clone(), RecordingPresenter::new()).await;
        assert_eq!(t.challenge_count(), 0);
        wf.admit(pdf("doc.pdf")).unwrap();
        wf.set_compression_level(CompressionLevel::UltraHigh);

        assert!(matches!(wf.submit().await, SubmitOutcome::Succeeded(_)));
        let sent = t.sent.lock().unwrap();
        assert_eq!(sent[0].field("level"), Some("ultra_high"));
        assert_eq!(sent[0].field(ANSWER_FIELD), None);
    }

    #[tokio::test]
    async fn img2img_collects_multiple_links() {
        let t = ScriptedTransport::new();
        t.push_question("q");
        t.push_submission(reply(
            200,
            ReplyBody {
                download_urls: Some(vec!["/uploads/1_a.webp".into(), "/uploads/2_b.webp".into()]),
                ..ReplyBody::default()
            },
        ));
        let mut wf =
            Workflow::open(Variant::ImageToImage, t.clone(), RecordingPresenter::new()).await;
        wf.admit_batch(vec![png("a.png"), png("b.png")]);
        wf.set_output_format(ImageFormat::Webp);
        wf.set_answer("4");

        match wf.submit().await {
            SubmitOutcome::Succeeded(r) => assert_eq!(r.downloads.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        let sent = t.sent.lock().unwrap();
        assert_eq!(sent[0].field("format"), Some("webp"));
        assert!(sent[0].order().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_leaves_challenge_and_files_alone() {
        let t = ScriptedTransport::new();
        t.push_question("q");
        t.push_submission(Err(TransportError::Unreachable {
            endpoint: "/api/img2pdf".into(),
            reason: "connection refused".into(),
        }));
        let mut wf =
            Workflow::open(Variant::ImageToPdf, t.clone(), RecordingPresenter::new()).await;
        wf.admit_batch(vec![png("a.png"), png("b.png")]);
        wf.move_file(1, 0).unwrap();
        wf.set_answer("9");

        assert!(matches!(wf.submit().await, SubmitOutcome::Failed(_)));
        assert_eq!(wf.state(), SubmissionState::Failed("Network error.".into()));
        assert_eq!(wf.challenge().answer, "9");
        assert_eq!(wf.current_names(), vec!["b.png", "a.png"]);
        assert_eq!(t.challenge_count(), 1);
    }

    #[tokio::test]
    async fn image_batch_over_capacity() {
        let rec = RecordingPresenter::new();
        let mut wf = Workflow::new(Variant::ImageToImage, ScriptedTransport::new(), rec.clone());
        let report = wf.admit_batch((1..=26).map(|i| png(&format!("{i}.png"))));
        assert_eq!(report.accepted.len(), MAX_IMAGES);
        assert_eq!(
            report.rejected,
            vec![AdmissionError::CapacityExceeded {
                name: "26.png".into(),
                max: MAX_IMAGES
            }]
        );
        assert_eq!(wf.len(), 25);
        assert!(rec
            .events()
            .iter()
            .any(|e| matches!(e, Event::Admission(m) if m.contains("26.png"))));
    }

    #[test]
    fn reordering_unsupported_on_split() {
        let mut wf =
            Workflow::new(Variant::Split, ScriptedTransport::new(), RecordingPresenter::new());
        wf.admit(pdf("a.pdf")).unwrap();
        assert!(matches!(
            wf.move_file(0, 0),
            Err(DeskError::ReorderingUnsupported {
                variant: Variant::Split
            })
        ));
        assert!(wf.set_order(&["a.pdf"]).is_err());
    }

    #[test]
    fn remove_at_uses_displayed_order() {
        let rec = RecordingPresenter::new();
        let mut wf = Workflow::new(Variant::Merge, ScriptedTransport::new(), rec.clone());
        wf.admit_batch(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")]);
        wf.set_order(&["c.pdf", "a.pdf", "b.pdf"]).unwrap();
        let removed = wf.remove_at(0).unwrap();
        assert_eq!(removed.name(), "c.pdf");
        assert_eq!(wf.current_names(), vec!["a.pdf", "b.pdf"]);
        assert!(wf.remove_at(5).is_none());
        assert_eq!(
            rec.events().last(),
            Some(&Event::Collection(vec!["a.pdf".into(), "b.pdf".into()]))
        );
    }

    #[test]
    fn replace_swaps_single_file() {
        let mut wf =
            Workflow::new(Variant::Compress, ScriptedTransport::new(), RecordingPresenter::new());
        wf.admit(pdf("one.pdf")).unwrap();
        assert!(matches!(
            wf.admit(pdf("two.pdf")),
            Err(AdmissionError::CapacityExceeded { max: 1, .. })
        ));
        wf.replace(pdf("two.pdf")).unwrap();
        assert_eq!(wf.current_names(), vec!["two.pdf"]);
        assert!(wf.replace(png("x.png")).is_err());
        assert_eq!(wf.current_names(), vec!["two.pdf"]);
    }

    #[tokio::test]
    async fn open_reports_challenge_failure() {
        let t = ScriptedTransport::new();
        t.push_challenge(reply(500, ReplyBody::default()));
        let rec = RecordingPresenter::new();
        let wf = Workflow::open(Variant::Merge, t, rec.clone()).await;
        assert_eq!(wf.challenge().question, None);
        assert!(matches!(rec.events().as_slice(), [Event::ChallengeFailed(_)]));
    }
}
