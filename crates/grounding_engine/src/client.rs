use std::path::Path;
use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::decode::{
    chat_record, chunk_records, document_record, error_detail, search_records, WireChatRequest,
    WireChatResponse, WireChunkList, WireDocument, WireDocumentList, WireExtractResponse,
    WireQuery, WireQueryResponse, WireStatusResponse,
};
use crate::{
    ApiError, ChatAnswerRecord, ChatTurnRecord, ChunkRecord, DocumentRecord, FailureKind,
    SearchHitRecord,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit. Uploads parse and index server-side before
    /// answering, so this is unset by default.
    pub request_timeout: Option<Duration>,
    /// Reviewer name sent along with validated extractions.
    pub validated_by: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            validated_by: "current_user".to_string(),
        }
    }
}

/// Every call the viewer makes to the document backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError>;

    async fn load_chunks(&self, doc_id: &str) -> Result<Vec<ChunkRecord>, ApiError>;

    /// Raw bytes of the rendered document.
    async fn fetch_document(&self, doc_id: &str) -> Result<Vec<u8>, ApiError>;

    /// Upload one file. The backend answers after parsing and indexing it.
    async fn upload(&self, path: &Path) -> Result<DocumentRecord, ApiError>;

    async fn search(&self, query: &str, n_results: usize)
        -> Result<Vec<SearchHitRecord>, ApiError>;

    async fn chat(
        &self,
        question: &str,
        history: &[ChatTurnRecord],
    ) -> Result<ChatAnswerRecord, ApiError>;

    /// Structured data extracted from the document, as pretty-printed JSON.
    async fn extract(&self, doc_id: &str) -> Result<String, ApiError>;

    /// Save reviewed data; returns the server's status message.
    async fn validate(&self, doc_id: &str, payload: &serde_json::Value)
        -> Result<String, ApiError>;

    async fn delete(&self, doc_id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    base: Url,
    validated_by: String,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("unsupported base url {base}"),
            ));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base,
            validated_by: settings.validated_by,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        request.send().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        let url = self.endpoint(&["api", "documents"])?;
        let response = self.send(self.client.get(url)).await?;
        let list: WireDocumentList = read_json(response).await?;
        Ok(list.documents.into_iter().map(document_record).collect())
    }

    async fn load_chunks(&self, doc_id: &str) -> Result<Vec<ChunkRecord>, ApiError> {
        let url = self.endpoint(&["api", "document", doc_id, "chunks"])?;
        let response = self.send(self.client.get(url)).await?;
        let list: WireChunkList = read_json(response).await?;
        engine_debug!("{} chunks received for {}", list.chunks.len(), doc_id);
        Ok(chunk_records(list.chunks))
    }

    async fn fetch_document(&self, doc_id: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["api", "document", doc_id, "pdf"])?;
        let response = check_status(self.send(self.client.get(url)).await?).await?;

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes.extend_from_slice(&chunk);
            engine_trace!("{}: {} bytes received", doc_id, bytes.len());
        }
        Ok(bytes)
    }

    async fn upload(&self, path: &Path) -> Result<DocumentRecord, ApiError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let contents = tokio::fs::read(path)
            .await
            .map_err(|err| ApiError::new(FailureKind::Io, format!("{}: {err}", path.display())))?;

        let form = Form::new().part("file", Part::bytes(contents).file_name(name.clone()));
        let url = self.endpoint(&["api", "upload"])?;
        let response = self.send(self.client.post(url).multipart(form)).await?;
        let mut document: WireDocument = read_json(response).await?;
        if document.filename.as_deref().map_or(true, str::is_empty) {
            document.filename = Some(name);
        }
        Ok(document_record(document))
    }

    async fn search(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<SearchHitRecord>, ApiError> {
        let url = self.endpoint(&["api", "query"])?;
        let body = WireQuery { query, n_results };
        let response = self.send(self.client.post(url).json(&body)).await?;
        let results: WireQueryResponse = read_json(response).await?;
        Ok(search_records(results))
    }

    async fn chat(
        &self,
        question: &str,
        history: &[ChatTurnRecord],
    ) -> Result<ChatAnswerRecord, ApiError> {
        let url = self.endpoint(&["api", "chat"])?;
        let body = WireChatRequest::new(question, history);
        let response = self.send(self.client.post(url).json(&body)).await?;
        let answer: WireChatResponse = read_json(response).await?;
        Ok(chat_record(answer))
    }

    async fn extract(&self, doc_id: &str) -> Result<String, ApiError> {
        let mut url = self.endpoint(&["api", "extract"])?;
        url.query_pairs_mut().append_pair("doc_id", doc_id);
        let response = self.send(self.client.post(url)).await?;
        let extracted: WireExtractResponse = read_json(response).await?;
        serde_json::to_string_pretty(&extracted.extracted_data)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn validate(
        &self,
        doc_id: &str,
        payload: &serde_json::Value,
    ) -> Result<String, ApiError> {
        let mut url = self.endpoint(&["api", "validate"])?;
        url.query_pairs_mut()
            .append_pair("doc_id", doc_id)
            .append_pair("validated_by", &self.validated_by);
        let response = self.send(self.client.post(url).json(payload)).await?;
        let status: WireStatusResponse = read_json(response).await?;
        Ok(status
            .message
            .or(status.status)
            .unwrap_or_else(|| "Validation saved".to_string()))
    }

    async fn delete(&self, doc_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "document", doc_id])?;
        let response = self.send(self.client.delete(url)).await?;
        read_body(response).await?;
        Ok(())
    }
}

/// Pass successful responses through; failures carry the server's `detail`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    let message = error_detail(&body).unwrap_or_else(|| status.to_string());
    Err(ApiError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let response = check_status(response).await?;
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(body.to_vec())
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let body = read_body(response).await?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
