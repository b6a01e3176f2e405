//! Encrypt-and-upload pipeline for reports.
//!
//! Serialize, import key, encrypt, concatenate IV and ciphertext, upload.
//! Nothing is sent unless every earlier step succeeded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::ReportCipher;
use crate::error::{Error, Result};
use crate::report::{ReportFormContext, ReportPayload, ReportStatus};
use crate::storage::{BlobId, BlobMetadata, BlobStore};

/// Header carrying the report thread id.
pub const THREAD_ID_HEADER: &str = "x-thread-id";
/// Header carrying the author id.
pub const AUTHOR_ID_HEADER: &str = "x-author-id";
/// Header carrying the report status tag.
pub const STATUS_HEADER: &str = "x-report-status";

/// Who a submission belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    /// Report thread identifier.
    pub thread_id: String,
    /// Author identifier.
    pub author_id: String,
}

/// An encrypted upload ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// `IV || ciphertext`.
    pub body: Vec<u8>,
    /// Thread and author.
    pub metadata: SubmissionMetadata,
    /// Draft or submitted.
    pub status: ReportStatus,
}

/// Response of the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Whether the upload was accepted.
    pub success: bool,
    /// Identifier of the stored blob.
    pub id: String,
    /// Where the blob can be fetched.
    pub url: String,
}

/// Destination for encrypted report blobs.
#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Upload one blob.
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt>;
}

/// Uploads to an aimpact server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    /// Create an uploader for the server at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL of the server.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch a stored blob.
    ///
    /// Returns `None` if the server does not have it.
    ///
    /// # Errors
    ///
    /// Returns a transport error for unreachable servers or unexpected statuses.
    pub async fn fetch(&self, id: &BlobId) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/api/blobs/{id}", self.endpoint);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::http_status(
                status.as_u16(),
                format!("fetching blob {id} failed"),
            ));
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }

    fn headers(request: &UploadRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        let pairs = [
            (THREAD_ID_HEADER, request.metadata.thread_id.as_str()),
            (AUTHOR_ID_HEADER, request.metadata.author_id.as_str()),
            (STATUS_HEADER, request.status.as_str()),
        ];
        for (name, value) in pairs {
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::transport(format!("invalid value for header {name}")))?;
            headers.insert(HeaderName::from_static(name), value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl BlobUploader for HttpUploader {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let url = format!("{}/api/upload", self.endpoint);
        let headers = Self::headers(&request)?;
        debug!(url = %url, size = request.body.len(), "uploading report blob");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(
                status.as_u16(),
                format!("upload rejected with status {status}"),
            ));
        }

        let receipt: UploadReceipt = response.json().await?;
        if !receipt.success {
            return Err(Error::transport("upload endpoint reported failure"));
        }
        Ok(receipt)
    }
}

/// Uploads straight into an in-process [`BlobStore`].
#[derive(Debug, Clone)]
pub struct StoreUploader {
    store: Arc<BlobStore>,
    public_base_url: String,
}

impl StoreUploader {
    /// Create an uploader writing to `store`.
    #[must_use]
    pub fn new(store: Arc<BlobStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobUploader for StoreUploader {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let metadata = BlobMetadata {
            thread_id: Some(request.metadata.thread_id),
            author_id: Some(request.metadata.author_id),
            status: Some(request.status),
        };
        let id = self.store.store(request.body, metadata)?;
        Ok(UploadReceipt {
            success: true,
            url: blob_url(&self.public_base_url, &id),
            id: id.to_string(),
        })
    }
}

/// URL under which a blob is served.
#[must_use]
pub fn blob_url(public_base_url: &str, id: &BlobId) -> String {
    format!("{}/api/blobs/{id}", public_base_url.trim_end_matches('/'))
}

/// The encrypt-and-upload pipeline.
pub struct SubmitPipeline {
    key_fragment: String,
    uploader: Arc<dyn BlobUploader>,
}

impl std::fmt::Debug for SubmitPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitPipeline").finish_non_exhaustive()
    }
}

impl SubmitPipeline {
    /// Create a pipeline using the given key fragment and uploader.
    #[must_use]
    pub fn new(key_fragment: impl Into<String>, uploader: Arc<dyn BlobUploader>) -> Self {
        Self {
            key_fragment: key_fragment.into(),
            uploader,
        }
    }

    /// Encrypt a report and build the upload request, without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, key import or encryption fails.
    pub fn seal(
        &self,
        context: &ReportFormContext,
        status: ReportStatus,
        metadata: &SubmissionMetadata,
    ) -> Result<UploadRequest> {
        let payload = ReportPayload::new(context, status, Utc::now());
        let plaintext = payload.to_json()?;
        let cipher = ReportCipher::import(&self.key_fragment)?;
        let blob = cipher.encrypt(plaintext.as_bytes())?;
        Ok(UploadRequest {
            body: blob.to_bytes(),
            metadata: metadata.clone(),
            status,
        })
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. The upload is only attempted
    /// once encryption has succeeded.
    pub async fn run(
        &self,
        context: &ReportFormContext,
        status: ReportStatus,
        metadata: &SubmissionMetadata,
    ) -> Result<UploadReceipt> {
        let request = self.seal(context, status, metadata)?;
        let receipt = self.uploader.upload(request).await?;
        info!(
            id = %receipt.id,
            status = %status,
            thread = %metadata.thread_id,
            "report uploaded"
        );
        Ok(receipt)
    }
}
