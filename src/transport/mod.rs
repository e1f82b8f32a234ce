//! The network seam between the workflow core and the processing service.
//!
//! Everything that crosses the wire goes through the [`Transport`] trait:
//! fetching a verification question, sending a submission, and fetching a
//! returned file. [`HttpTransport`] is the reqwest implementation; tests and
//! embedders can supply their own.
//!
//! A transport reports *what the server said* ([`ServiceReply`]: status and
//! parsed JSON body) and leaves interpretation to the caller. Only failures
//! to obtain a response at all are `Err`.

pub mod http;

pub use http::HttpTransport;

use crate::error::TransportError;
use crate::submission::{DownloadRef, SubmissionRequest};
use async_trait::async_trait;
use serde::Deserialize;

/// Path of the verification-question endpoint.
pub const CHALLENGE_ENDPOINT: &str = "/api/captcha";

/// HTTP-level access to the processing service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET /api/captcha`.
    async fn fetch_challenge(&self) -> Result<ServiceReply, TransportError>;

    /// `POST` the request to its endpoint as a multipart form.
    async fn send(&self, request: SubmissionRequest) -> Result<ServiceReply, TransportError>;

    /// Fetch the bytes behind a returned download reference.
    async fn fetch_download(&self, reference: &DownloadRef) -> Result<Vec<u8>, TransportError>;
}

/// What the service answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    /// Parsed JSON body. Fields are all optional; a body that is not JSON
    /// parses as the empty body.
    pub body: ReplyBody,
}

impl ServiceReply {
    pub fn new(status: u16, body: ReplyBody) -> Self {
        Self { status, body }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Union of every JSON body the service sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplyBody {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub download_urls: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ReplyBody {
    /// Lenient parse: anything that is not a JSON object becomes the empty body.
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory transport for unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Scripted = Result<ServiceReply, TransportError>;

    /// Replays queued replies and records every request it was given.
    #[derive(Default)]
    pub struct ScriptedTransport {
        challenges: Mutex<VecDeque<Scripted>>,
        submissions: Mutex<VecDeque<Scripted>>,
        pub sent: Mutex<Vec<SubmissionRequest>>,
        pub challenge_calls: Mutex<usize>,
        pub delay: Option<Duration>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay: Some(delay),
                ..Self::default()
            })
        }

        pub fn push_challenge(&self, reply: Scripted) {
            self.challenges.lock().unwrap().push_back(reply);
        }

        pub fn push_question(&self, question: &str) {
            self.push_challenge(Ok(ServiceReply::new(
                200,
                ReplyBody {
                    question: Some(question.into()),
                    ..ReplyBody::default()
                },
            )));
        }

        pub fn push_submission(&self, reply: Scripted) {
            self.submissions.lock().unwrap().push_back(reply);
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn challenge_count(&self) -> usize {
            *self.challenge_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn fetch_challenge(&self) -> Result<ServiceReply, TransportError> {
            *self.challenge_calls.lock().unwrap() += 1;
            let next = self.challenges.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(ServiceReply::new(500, ReplyBody::default())))
        }

        async fn send(&self, request: SubmissionRequest) -> Result<ServiceReply, TransportError> {
            self.sent.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.submissions.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(ServiceReply::new(500, ReplyBody::default())))
        }

        async fn fetch_download(&self, reference: &DownloadRef) -> Result<Vec<u8>, TransportError> {
            Ok(reference.as_str().as_bytes().to_vec())
        }
    }
}
