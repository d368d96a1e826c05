//! Request handlers.
//!
//! Dispatches decoded frames to the typed CreateTopic, Produce, Fetch,
//! Commit, and Heartbeat operations, validating inputs and mapping logical
//! failures to stable wire error codes. A logical failure produces an error
//! frame and leaves the connection open; only the transport layer closes
//! connections.

use crate::metrics::BrokerMetrics;
use crate::offsets::OffsetStore;
use crate::protocol::frame::{Frame, RequestType};
use crate::protocol::messages::{
    self, CommitRequest, CommitResponse, CreateTopicRequest, CreateTopicResponse, ErrorBody,
    ErrorResponse, FetchRequest, FetchResponse, FetchedRecord, ProduceRequest, ProduceResponse,
};
use crate::storage::Record;
use crate::topic_manager::TopicManager;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tracing::debug;

/// Malformed frame, unknown type byte, invalid JSON, or a semantic
/// validation failure.
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
/// The referenced topic does not exist, or an explicit partition index is
/// out of range.
pub const UNKNOWN_TOPIC_OR_PARTITION: &str = "UNKNOWN_TOPIC_OR_PARTITION";
/// Reserved for a future strict fetch mode; never emitted - fetch offsets
/// past the high watermark are clamped instead.
pub const OFFSET_OUT_OF_RANGE: &str = "OFFSET_OUT_OF_RANGE";
/// Response marshalling failure or an unexpected internal condition.
pub const INTERNAL_IO_ERROR: &str = "INTERNAL_IO_ERROR";

/// A logical request failure. The `code` is the wire contract; `message`
/// is free-form diagnostic text.
#[derive(Debug)]
pub struct RequestError {
    pub code: &'static str,
    pub message: String,
}

impl RequestError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_REQUEST,
            message: message.into(),
        }
    }

    pub fn unknown_topic_or_partition(message: impl Into<String>) -> Self {
        Self {
            code: UNKNOWN_TOPIC_OR_PARTITION,
            message: message.into(),
        }
    }
}

/// Validates requests and executes them against the shared broker state.
pub struct MessageHandler {
    topics: Arc<TopicManager>,
    offsets: OffsetStore,
    metrics: Arc<BrokerMetrics>,
}

impl MessageHandler {
    pub fn new(metrics: Arc<BrokerMetrics>) -> Self {
        Self {
            topics: Arc::new(TopicManager::new()),
            offsets: OffsetStore::new(),
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<BrokerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn topics(&self) -> Arc<TopicManager> {
        Arc::clone(&self.topics)
    }

    pub fn offsets(&self) -> &OffsetStore {
        &self.offsets
    }

    /// Dispatch one request frame and build the response frame.
    ///
    /// The response reuses the request's type byte whether the outcome is
    /// success or error. Every dispatched request bumps the per-type
    /// request counter; every error response bumps the per-code error
    /// counter.
    pub fn handle_frame(&self, frame: &Frame) -> Frame {
        let request_type = RequestType::from_u8(frame.frame_type);
        self.metrics
            .record_request(request_type.map_or("UNKNOWN", RequestType::metric_label));

        let result = match request_type {
            Some(RequestType::CreateTopic) => {
                decode(&frame.payload).and_then(|req| encode(self.handle_create_topic(req)?))
            }
            Some(RequestType::Produce) => {
                decode(&frame.payload).and_then(|req| encode(self.handle_produce(req)?))
            }
            Some(RequestType::Fetch) => {
                decode(&frame.payload).and_then(|req| encode(self.handle_fetch(req)?))
            }
            Some(RequestType::Commit) => {
                decode(&frame.payload).and_then(|req| encode(self.handle_commit(req)?))
            }
            // Heartbeat accepts any payload and keeps the connection alive.
            Some(RequestType::Heartbeat) => Ok(Bytes::from_static(br#"{"ok":true}"#)),
            None => Err(RequestError::invalid(format!(
                "unknown request type {}",
                frame.frame_type
            ))),
        };

        match result {
            Ok(payload) => Frame {
                frame_type: frame.frame_type,
                payload,
            },
            Err(err) => self.error_frame(frame.frame_type, err),
        }
    }

    /// Builds an error frame with the given type byte and records the error.
    pub fn error_frame(&self, frame_type: u8, err: RequestError) -> Frame {
        debug!(code = err.code, message = %err.message, "request failed");
        self.metrics.record_error(err.code);

        let body = ErrorResponse {
            error: ErrorBody {
                code: err.code.to_string(),
                message: err.message,
            },
        };
        // Serializing two plain strings cannot fail.
        let payload = serde_json::to_vec(&body).unwrap_or_default();
        Frame {
            frame_type,
            payload: Bytes::from(payload),
        }
    }

    fn handle_create_topic(
        &self,
        req: CreateTopicRequest,
    ) -> Result<CreateTopicResponse, RequestError> {
        if req.topic.is_empty() || req.partitions <= 0 {
            return Err(RequestError::invalid(
                "create topic requires a name and a positive partition count",
            ));
        }
        self.topics.create_topic(&req.topic, req.partitions as usize);
        Ok(CreateTopicResponse { ok: true })
    }

    fn handle_produce(&self, req: ProduceRequest) -> Result<ProduceResponse, RequestError> {
        if req.topic.is_empty() || req.records.is_empty() {
            return Err(RequestError::invalid(
                "produce requires a topic and at least one record",
            ));
        }

        let topic = self.topics.get_topic(&req.topic).ok_or_else(|| {
            RequestError::unknown_topic_or_partition(format!("unknown topic {:?}", req.topic))
        })?;

        // partition = -1 routes the whole batch by the first record's key,
        // so per-key ordering survives batching.
        let partition = if req.partition < 0 {
            let key = messages::decode_binary(&req.records[0].key);
            route_by_key(&key, topic.partition_count())
        } else {
            req.partition as usize
        };

        let log = topic.partition(partition).ok_or_else(|| {
            RequestError::unknown_topic_or_partition(format!(
                "partition {partition} out of range for topic {:?}",
                req.topic
            ))
        })?;

        let batch: Vec<Record> = req
            .records
            .iter()
            .map(|r| {
                Record::new(
                    messages::decode_binary(&r.key),
                    messages::decode_binary(&r.value),
                    r.ts,
                )
            })
            .collect();
        let num_records = batch.len();

        let base_offset = log.append(batch);
        let high_watermark = log.high_watermark();

        debug!(
            topic = %req.topic,
            partition,
            base_offset,
            num_records,
            "appended batch"
        );

        Ok(ProduceResponse {
            topic: req.topic,
            partition: partition as i32,
            base_offset,
            num_records,
            high_watermark,
        })
    }

    fn handle_fetch(&self, req: FetchRequest) -> Result<FetchResponse, RequestError> {
        if req.topic.is_empty() || req.partition < 0 {
            return Err(RequestError::invalid(
                "fetch requires a topic and a non-negative partition",
            ));
        }

        let topic = self.topics.get_topic(&req.topic).ok_or_else(|| {
            RequestError::unknown_topic_or_partition(format!("unknown topic {:?}", req.topic))
        })?;
        let log = topic.partition(req.partition as usize).ok_or_else(|| {
            RequestError::unknown_topic_or_partition(format!(
                "partition {} out of range for topic {:?}",
                req.partition, req.topic
            ))
        })?;

        // maxBytes and maxWaitMs are reserved; the range always reads to
        // the high watermark, with out-of-range offsets clamped.
        let (records, high_watermark) = log.fetch(req.offset, 0);
        let records = records
            .into_iter()
            .map(|r| FetchedRecord {
                offset: r.offset,
                key: messages::encode_binary(&r.key),
                value: messages::encode_binary(&r.value),
                ts: r.ts,
            })
            .collect();

        Ok(FetchResponse {
            records,
            high_watermark,
        })
    }

    fn handle_commit(&self, req: CommitRequest) -> Result<CommitResponse, RequestError> {
        if req.topic.is_empty() || req.partition < 0 || req.group.is_empty() || req.offset < 0 {
            return Err(RequestError::invalid(
                "commit requires a topic, group, non-negative partition and offset",
            ));
        }
        if self.topics.get_topic(&req.topic).is_none() {
            return Err(RequestError::unknown_topic_or_partition(format!(
                "unknown topic {:?}",
                req.topic
            )));
        }

        // The partition index is deliberately not checked against the
        // topic's partition count: a group may commit positions for
        // partitions it expects to exist.
        self.offsets
            .commit(&req.group, &req.topic, req.partition as u32, req.offset);

        Ok(CommitResponse { ok: true })
    }
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, RequestError> {
    serde_json::from_slice(payload)
        .map_err(|e| RequestError::invalid(format!("invalid JSON payload: {e}")))
}

fn encode<T: Serialize>(body: T) -> Result<Bytes, RequestError> {
    serde_json::to_vec(&body)
        .map(Bytes::from)
        .map_err(|e| RequestError {
            code: INTERNAL_IO_ERROR,
            message: format!("response marshalling failed: {e}"),
        })
}

/// Routes a batch to `SHA1(key)[0] mod partition_count`. SHA-1 is used
/// only for its stable, language-neutral byte distribution, not security.
fn route_by_key(key: &[u8], partition_count: usize) -> usize {
    let digest = Sha1::digest(key);
    digest[0] as usize % partition_count
}
