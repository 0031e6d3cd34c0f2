//! Wire payloads of the document backend and their conversion into records.
//!
//! Everything textual coming from the backend is passed through
//! [`sanitize_markup`] here, so no markup ever reaches a record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::sanitize::sanitize_markup;
use crate::types::{
    BoxRecord, ChatAnswerRecord, ChatSourceRecord, ChatTurnRecord, ChunkRecord, DocumentRecord,
    GroundingRecord, SearchHitRecord,
};

const DEFAULT_CHUNK_TYPE: &str = "text";

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocument {
    pub(crate) doc_id: String,
    #[serde(default)]
    pub(crate) filename: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) num_chunks: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocumentList {
    #[serde(default)]
    pub(crate) documents: Vec<WireDocument>,
}

/// A chunk or result identifier; backends send either strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_key(self) -> String {
        match self {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WireBox {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

/// Grounding as far as it could be read. A page that cannot be read drops
/// the whole grounding; a box with a missing or non-numeric edge drops the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WireGrounding {
    page: Option<i64>,
    r#box: Option<WireBox>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChunk {
    #[serde(default, alias = "id")]
    chunk_id: Option<WireId>,
    #[serde(default, alias = "markdown")]
    text: Option<String>,
    #[serde(default, alias = "type")]
    chunk_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_grounding")]
    grounding: Option<WireGrounding>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChunkList {
    #[serde(default)]
    pub(crate) chunks: Vec<WireChunk>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireQuery<'a> {
    pub(crate) query: &'a str,
    pub(crate) n_results: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSearchResult {
    chunk_id: WireId,
    doc_id: String,
    #[serde(default)]
    text: String,
    #[serde(default, deserialize_with = "lenient_page")]
    page: Option<i64>,
    #[serde(default)]
    chunk_type: Option<String>,
    #[serde(default)]
    similarity_score: f64,
    #[serde(default, deserialize_with = "lenient_grounding")]
    grounding: Option<WireGrounding>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireQueryResponse {
    #[serde(default)]
    pub(crate) results: Vec<WireSearchResult>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireChatTurn<'a> {
    pub(crate) role: &'a str,
    pub(crate) content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireChatRequest<'a> {
    pub(crate) question: &'a str,
    pub(crate) conversation_history: Vec<WireChatTurn<'a>>,
}

impl<'a> WireChatRequest<'a> {
    pub(crate) fn new(question: &'a str, history: &'a [ChatTurnRecord]) -> Self {
        Self {
            question,
            conversation_history: history
                .iter()
                .map(|turn| WireChatTurn {
                    role: &turn.role,
                    content: &turn.content,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatSource {
    doc_id: String,
    chunk_id: WireId,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    page: Option<i64>,
    #[serde(default)]
    chunk_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatResponse {
    answer: String,
    #[serde(default)]
    sources: Vec<WireChatSource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireExtractResponse {
    #[serde(default)]
    pub(crate) extracted_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireStatusResponse {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

/// Error body of a failed request.
#[derive(Debug, Deserialize)]
pub(crate) struct WireErrorBody {
    pub(crate) detail: serde_json::Value,
}

pub(crate) fn document_record(wire: WireDocument) -> DocumentRecord {
    DocumentRecord {
        filename: wire
            .filename
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| wire.doc_id.clone()),
        doc_id: wire.doc_id,
        status: wire.status,
        num_chunks: wire.num_chunks,
    }
}

/// Convert a chunk list, keying chunks without an id by their position.
pub(crate) fn chunk_records(wire: Vec<WireChunk>) -> Vec<ChunkRecord> {
    wire.into_iter()
        .enumerate()
        .map(|(position, chunk)| ChunkRecord {
            key: chunk
                .chunk_id
                .map(WireId::into_key)
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| position.to_string()),
            text: sanitize_markup(chunk.text.as_deref().unwrap_or_default()),
            chunk_type: chunk_type_or_default(chunk.chunk_type),
            grounding: chunk.grounding.map(grounding_record),
        })
        .collect()
}

pub(crate) fn search_records(wire: WireQueryResponse) -> Vec<SearchHitRecord> {
    wire.results
        .into_iter()
        .map(|hit| SearchHitRecord {
            doc_id: hit.doc_id,
            chunk_key: hit.chunk_id.into_key(),
            page: page_index(hit.page),
            chunk_type: chunk_type_or_default(hit.chunk_type),
            text: sanitize_markup(&hit.text),
            score: hit.similarity_score.clamp(0.0, 1.0),
            grounding: hit.grounding.map(grounding_record),
        })
        .collect()
}

pub(crate) fn chat_record(wire: WireChatResponse) -> ChatAnswerRecord {
    ChatAnswerRecord {
        answer: sanitize_markup(&wire.answer),
        sources: wire
            .sources
            .into_iter()
            .map(|source| ChatSourceRecord {
                doc_id: source.doc_id,
                chunk_key: source.chunk_id.into_key(),
                filename: source.filename.filter(|name| !name.is_empty()),
                page: page_index(source.page),
                chunk_type: chunk_type_or_default(source.chunk_type),
            })
            .collect(),
    }
}

/// Server-supplied failure text, if the body carries a `detail`.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: WireErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn grounding_record(wire: WireGrounding) -> GroundingRecord {
    GroundingRecord {
        page: page_index(wire.page),
        bbox: wire.r#box.map(|b| BoxRecord {
            left: b.left,
            top: b.top,
            right: b.right,
            bottom: b.bottom,
        }),
    }
}

fn lenient_grounding<'de, D>(deserializer: D) -> Result<Option<WireGrounding>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(grounding_from_value))
}

fn lenient_page<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(page_from_value))
}

fn grounding_from_value(value: &Value) -> Option<WireGrounding> {
    let object = value.as_object()?;
    let page = match object.get("page") {
        None | Some(Value::Null) => None,
        Some(page) => Some(page_from_value(page)?),
    };
    let r#box = object
        .get("box")
        .or_else(|| object.get("bbox"))
        .and_then(box_from_value);
    Some(WireGrounding { page, r#box })
}

fn box_from_value(value: &Value) -> Option<WireBox> {
    let object = value.as_object()?;
    let edge = |name: &str| object.get(name).and_then(Value::as_f64);
    Some(WireBox {
        left: edge("left")?,
        top: edge("top")?,
        right: edge("right")?,
        bottom: edge("bottom")?,
    })
}

/// Integers, integral floats and numeric strings name a page.
fn page_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|page| page.fract() == 0.0 && page.abs() < i64::MAX as f64)
                .map(|page| page as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn page_index(page: Option<i64>) -> u32 {
    page.map_or(0, |page| u32::try_from(page.max(0)).unwrap_or(u32::MAX))
}

fn chunk_type_or_default(chunk_type: Option<String>) -> String {
    chunk_type
        .filter(|kind| !kind.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CHUNK_TYPE.to_string())
}
