//! reqwest-backed [`Transport`].

use super::{ReplyBody, ServiceReply, Transport, CHALLENGE_ENDPOINT};
use crate::config::ClientConfig;
use crate::error::{DeskError, TransportError};
use crate::submission::{DownloadRef, SubmissionRequest};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

/// Talks to the processing service over HTTP.
///
/// Keeps a cookie store: the service remembers the expected verification
/// answer in its session, so the question and the answer must travel on the
/// same session.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, DeskError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .map_err(|e| DeskError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.config
            .endpoint_url(path)
            .map_err(|e| TransportError::Unreachable {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })
    }

    fn map_err(&self, endpoint: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.config.request_timeout.as_secs(),
            }
        } else {
            TransportError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn read_reply(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<ServiceReply, TransportError> {
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_err(endpoint, e))?;
        debug!("{} answered HTTP {} ({} bytes)", endpoint, status, bytes.len());
        Ok(ServiceReply::new(status, ReplyBody::parse(&bytes)))
    }
}

/// Build the multipart body: files first (original names and declared
/// types), then the text fields in request order.
pub fn build_form(request: SubmissionRequest) -> Result<Form, TransportError> {
    let endpoint = request.endpoint;
    let mut form = Form::new();
    for (field, file) in request.files {
        let part = Part::bytes(file.content().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|e| TransportError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: format!("invalid MIME type '{}': {e}", file.mime()),
            })?;
        form = form.part(field, part);
    }
    for (name, value) in request.fields {
        form = form.text(name, value);
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_challenge(&self) -> Result<ServiceReply, TransportError> {
        let url = self.url(CHALLENGE_ENDPOINT)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_err(CHALLENGE_ENDPOINT, e))?;
        self.read_reply(CHALLENGE_ENDPOINT, response).await
    }

    async fn send(&self, request: SubmissionRequest) -> Result<ServiceReply, TransportError> {
        let endpoint = request.endpoint;
        let url = self.url(endpoint)?;
        info!("POST {} ({} files)", url, request.files.len());
        let form = build_form(request)?;
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                let err = self.map_err(endpoint, e);
                warn!("{}", err);
                err
            })?;
        self.read_reply(endpoint, response).await
    }

    async fn fetch_download(&self, reference: &DownloadRef) -> Result<Vec<u8>, TransportError> {
        let url = reference.resolve(&self.config.base_url)?;
        let endpoint = reference.as_str();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_err(endpoint, e))?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_err(endpoint, e))?;
        Ok(bytes.to_vec())
    }
}
