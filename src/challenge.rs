//! Human-verification question and the answer held for it.
//!
//! The expected answer lives on the server (in the session the transport's
//! cookie store carries), so the client can only check that *some* answer
//! was entered. Correctness is decided by the submission endpoint.

use crate::error::ChallengeError;
use crate::transport::Transport;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the gate currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChallengeState {
    /// `None` until loaded, and after a failed load.
    pub question: Option<String>,
    pub answer: String,
    /// Set when the server rejected the previous answer; cleared by a successful load.
    pub stale: bool,
}

/// Fetches and tracks the verification question for one workflow.
pub struct ChallengeGate {
    transport: Arc<dyn Transport>,
    state: ChallengeState,
}

impl std::fmt::Debug for ChallengeGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeGate")
            .field("state", &self.state)
            .finish()
    }
}

impl ChallengeGate {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: ChallengeState::default(),
        }
    }

    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    pub fn question(&self) -> Option<&str> {
        self.state.question.as_deref()
    }

    pub fn answer(&self) -> &str {
        &self.state.answer
    }

    pub fn is_stale(&self) -> bool {
        self.state.stale
    }

    /// Fetch a fresh question.
    ///
    /// Success resets the state to `{question, answer: "", stale: false}`.
    /// Failure drops the question and leaves the answer and stale flag as
    /// they were. Nothing retries automatically.
    pub async fn load(&mut self) -> Result<&str, ChallengeError> {
        debug!("Loading verification question");
        let reply = match self.transport.fetch_challenge().await {
            Ok(reply) => reply,
            Err(e) => {
                self.state.question = None;
                warn!("Verification question unavailable: {}", e);
                return Err(ChallengeError::Unreachable {
                    reason: e.to_string(),
                });
            }
        };

        if !reply.is_success() {
            self.state.question = None;
            warn!("Verification question request answered HTTP {}", reply.status);
            return Err(ChallengeError::Unavailable {
                status: reply.status,
            });
        }

        match reply.body.question {
            Some(question) => {
                info!("Verification question loaded");
                self.state = ChallengeState {
                    question: Some(question),
                    answer: String::new(),
                    stale: false,
                };
                Ok(self.state.question.as_deref().unwrap_or_default())
            }
            None => {
                self.state.question = None;
                warn!("Verification question reply had no question");
                Err(ChallengeError::MissingQuestion)
            }
        }
    }

    /// Store the user's answer verbatim.
    pub fn set_answer(&mut self, text: impl Into<String>) {
        self.state.answer = text.into();
    }

    /// `true` when an answer has been entered. Necessary, not sufficient.
    pub fn is_satisfied_locally(&self) -> bool {
        !self.state.answer.is_empty()
    }

    /// The server rejected the answer: forget it and mark the question stale.
    pub fn invalidate(&mut self) {
        self.state.answer.clear();
        self.state.stale = true;
    }
}
