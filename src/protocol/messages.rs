//! JSON request and response payloads.
//!
//! All payloads are UTF-8 JSON objects. Binary record fields (`key`,
//! `value`) travel as base64 strings; a string that is not valid base64 is
//! accepted as raw UTF-8 bytes so ad-hoc clients can skip encoding.
//! Requests tolerate missing fields, which decode to their zero values.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTopicRequest {
    pub topic: String,
    pub partitions: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTopicResponse {
    pub ok: bool,
}

/// A record as carried on the wire; `key` and `value` are base64 strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireRecord {
    pub key: String,
    pub value: String,
    pub ts: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProduceRequest {
    pub topic: String,
    /// Target partition; `-1` routes the batch by the first record's key hash.
    pub partition: i32,
    pub records: Vec<WireRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceResponse {
    pub topic: String,
    pub partition: i32,
    pub base_offset: i64,
    pub num_records: usize,
    pub high_watermark: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchRequest {
    pub topic: String,
    pub partition: i32,
    /// `-1` means "latest"; offsets past the high watermark are clamped.
    pub offset: i64,
    /// Accepted but ignored in this iteration; reserved for bounded reads.
    pub max_bytes: i32,
    /// Accepted but ignored in this iteration; reserved for long-poll.
    pub max_wait_ms: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub offset: i64,
    pub key: String,
    pub value: String,
    pub ts: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub records: Vec<FetchedRecord>,
    pub high_watermark: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitRequest {
    pub topic: String,
    pub partition: i32,
    pub group: String,
    /// Next offset the group intends to read.
    pub offset: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Decodes a wire `key`/`value` field, treating invalid base64 as raw bytes.
pub fn decode_binary(field: &str) -> Bytes {
    if field.is_empty() {
        return Bytes::new();
    }
    match BASE64.decode(field) {
        Ok(decoded) => Bytes::from(decoded),
        Err(_) => Bytes::copy_from_slice(field.as_bytes()),
    }
}

/// Encodes record bytes for the wire.
pub fn encode_binary(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
