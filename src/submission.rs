//! One-at-a-time submission of a built request.
//!
//! ```text
//!            dispatch()                 reply / transport error / cancel()
//!   Idle ──────────────▶ InFlight ──────────────────────────────────────▶ Succeeded(result)
//!    ▲                      │                                              Failed(message)
//!    │                      └─ dispatch() while InFlight → Busy (no request sent)
//!    └──────── any terminal state accepts the next dispatch() ────────────┘
//! ```
//!
//! The controller never retries. A remote `{"error": ...}`, a non-2xx
//! status, a timeout or a cancellation all end in `Failed`, from which the
//! next user action may submit again.

use crate::collection::ManagedFile;
use crate::error::{PreconditionError, TransportError};
use crate::transport::{ServiceReply, Transport};
use crate::variant::{ResponseShape, VariantConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Message used by the PDF tools when a rejection carries no `error` text.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
/// Message used when a cancelled or abandoned request ends.
pub const CANCELLED_MESSAGE: &str = "Submission cancelled.";
/// Message used by the PDF tools when no response could be obtained.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error or server is unreachable.";

static RE_CHALLENGE_REJECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)captcha").unwrap());

/// Does a rejection message blame the verification answer?
///
/// Plain case-insensitive substring match on "captcha", as the service
/// words every answer-related rejection that way ("Invalid CAPTCHA answer.",
/// "CAPTCHA session expired. Please refresh."). It also fires on unrelated
/// messages that happen to contain the word.
pub fn is_challenge_rejection(message: &str) -> bool {
    RE_CHALLENGE_REJECTION.is_match(message)
}

// ── Request ──────────────────────────────────────────────────────────────

/// Everything one submission sends. Built fresh for every submit.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Endpoint path, e.g. `/api/merge`.
    pub endpoint: &'static str,
    /// `(field name, file)` in submission order.
    pub files: Vec<(&'static str, ManagedFile)>,
    /// Text fields in the order they are sent. Repeated names (`order[]`) repeat.
    pub fields: Vec<(String, String)>,
}

impl SubmissionRequest {
    /// First value of a text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated text field, in order.
    pub fn field_values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The `order[]` list.
    pub fn order(&self) -> Vec<&str> {
        self.field_values("order[]")
    }

    /// Names of the attached files, in order.
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|(_, f)| f.name()).collect()
    }
}

// ── Results ──────────────────────────────────────────────────────────────

/// Opaque locator of a produced file, exactly as the service returned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DownloadRef(String);

impl DownloadRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name: the last path segment.
    pub fn file_name(&self) -> &str {
        let path = self.0.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Absolute URL, resolved against the service root.
    ///
    /// Absolute references are returned as-is.
    pub fn resolve(&self, base: &Url) -> Result<Url, TransportError> {
        base.join(&self.0).map_err(|e| TransportError::Unreachable {
            endpoint: self.0.clone(),
            reason: format!("invalid download link: {e}"),
        })
    }
}

impl fmt::Display for DownloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successful submission: one or more download references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub downloads: Vec<DownloadRef>,
}

impl SubmissionResult {
    /// Single-reference results (merge, compress, image-to-PDF).
    pub fn url(&self) -> Option<&DownloadRef> {
        self.downloads.first()
    }
}

/// Why a dispatched submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The service rejected the request and the message blames the verification answer.
    ChallengeRejected,
    /// The service rejected the request for another reason.
    Rejected,
    /// 2xx, but the body carried no download reference.
    MalformedReply,
    /// No response: connection failure or timeout.
    Transport,
    /// [`SubmissionController::cancel`] was called while in flight.
    Cancelled,
}

/// A failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    /// The single human-readable message to show.
    pub message: String,
    /// HTTP status, when a response was obtained.
    pub status: Option<u16>,
}

impl SubmissionFailure {
    pub fn challenge_rejected(&self) -> bool {
        self.kind == FailureKind::ChallengeRejected
    }
}

/// Observable controller state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded(SubmissionResult),
    Failed(String),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::InFlight)
    }
}

/// What a submit call ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Refused locally; nothing was sent and the controller state is unchanged.
    Refused(PreconditionError),
    /// Another submission was already in flight; nothing was sent.
    Busy,
    Succeeded(SubmissionResult),
    Failed(SubmissionFailure),
}

impl SubmitOutcome {
    /// The message a presenter would show for a non-success outcome.
    pub fn message(&self) -> Option<String> {
        match self {
            SubmitOutcome::Refused(e) => Some(e.to_string()),
            SubmitOutcome::Failed(f) => Some(f.message.clone()),
            SubmitOutcome::Busy | SubmitOutcome::Succeeded(_) => None,
        }
    }
}

/// Interpret a reply according to the variant's response shape.
///
/// A reply carrying `error` and no download reference is a rejection even
/// when its status is 2xx.
pub fn route_reply(
    reply: &ServiceReply,
    config: &VariantConfig,
) -> Result<SubmissionResult, SubmissionFailure> {
    let downloads: Vec<DownloadRef> = match config.response {
        ResponseShape::Single => reply
            .body
            .download_url
            .iter()
            .cloned()
            .map(DownloadRef)
            .collect(),
        ResponseShape::Multiple => reply
            .body
            .download_urls
            .iter()
            .flatten()
            .cloned()
            .map(DownloadRef)
            .collect(),
    };
    let error = reply
        .body
        .error
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    if reply.is_success() && !downloads.is_empty() {
        return Ok(SubmissionResult { downloads });
    }
    if reply.is_success() && error.is_none() {
        return Err(SubmissionFailure {
            kind: FailureKind::MalformedReply,
            message: "The server reported success but sent no download link.".into(),
            status: Some(reply.status),
        });
    }

    let message = error.unwrap_or(config.failure_message).to_string();
    let kind = if is_challenge_rejection(&message) {
        FailureKind::ChallengeRejected
    } else {
        FailureKind::Rejected
    };
    Err(SubmissionFailure {
        kind,
        message,
        status: Some(reply.status),
    })
}

fn transport_failure(err: &TransportError, config: &VariantConfig) -> SubmissionFailure {
    let message = match err {
        TransportError::Timeout { secs, .. } => {
            format!("The server did not respond within {secs}s. Please try again.")
        }
        _ => config.network_error_message.to_string(),
    };
    SubmissionFailure {
        kind: FailureKind::Transport,
        message,
        status: None,
    }
}

fn cancelled_failure() -> SubmissionFailure {
    SubmissionFailure {
        kind: FailureKind::Cancelled,
        message: CANCELLED_MESSAGE.to_string(),
        status: None,
    }
}

// ── Controller ───────────────────────────────────────────────────────────

/// Sends at most one request at a time and tracks its state.
///
/// Shareable (`Arc`) so a UI can call [`cancel`](Self::cancel) or read
/// [`state`](Self::state) while a submission is awaiting its response.
pub struct SubmissionController {
    transport: Arc<dyn Transport>,
    state: Mutex<SubmissionState>,
    cancel: Notify,
}

impl fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionController")
            .field("state", &self.state())
            .finish()
    }
}

impl SubmissionController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Mutex::new(SubmissionState::Idle),
            cancel: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().is_in_flight()
    }

    /// Abandon the in-flight request, if any. No effect otherwise.
    pub fn cancel(&self) {
        if self.is_in_flight() {
            info!("Cancelling in-flight submission");
            self.cancel.notify_waiters();
        }
    }

    /// Send `request` unless another one is in flight.
    ///
    /// Returns [`SubmitOutcome::Busy`] without touching the network when a
    /// submission is already in flight. Dropping the returned future before
    /// it completes leaves the controller in `Failed(CANCELLED_MESSAGE)`.
    pub async fn dispatch(
        &self,
        request: SubmissionRequest,
        config: &VariantConfig,
    ) -> SubmitOutcome {
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);

        let guard = {
            let mut state = self.lock();
            if state.is_in_flight() {
                warn!("Submission ignored: another one is in flight");
                return SubmitOutcome::Busy;
            }
            // Registered before InFlight becomes visible to cancel().
            cancelled.as_mut().enable();
            *state = SubmissionState::InFlight;
            InFlightGuard {
                controller: self,
                finished: false,
            }
        };

        let endpoint = request.endpoint;
        info!("Submitting to {}", endpoint);

        let routed = tokio::select! {
            reply = self.transport.send(request) => match reply {
                Ok(reply) => route_reply(&reply, config),
                Err(e) => {
                    warn!("{}", e);
                    Err(transport_failure(&e, config))
                }
            },
            _ = &mut cancelled => Err(cancelled_failure()),
        };

        match routed {
            Ok(result) => {
                info!("{} succeeded with {} download(s)", endpoint, result.downloads.len());
                guard.finish(SubmissionState::Succeeded(result.clone()));
                SubmitOutcome::Succeeded(result)
            }
            Err(failure) => {
                warn!("{} failed: {}", endpoint, failure.message);
                guard.finish(SubmissionState::Failed(failure.message.clone()));
                SubmitOutcome::Failed(failure)
            }
        }
    }
}

/// Holds the controller in `InFlight` until [`finish`](Self::finish) records
/// the terminal state. Dropped unfinished, it records a cancellation.
struct InFlightGuard<'a> {
    controller: &'a SubmissionController,
    finished: bool,
}

impl InFlightGuard<'_> {
    fn finish(mut self, next: SubmissionState) {
        *self.controller.lock() = next;
        self.finished = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Submission abandoned while in flight");
            *self.controller.lock() = SubmissionState::Failed(CANCELLED_MESSAGE.to_string());
        }
    }
}
