//! Wire protocol: frame envelope and JSON payload contracts.

pub mod frame;
pub mod messages;

pub use frame::{Frame, FrameCodec, RequestType, MAX_FRAME_SIZE};
pub use messages::{
    CommitRequest, CommitResponse, CreateTopicRequest, CreateTopicResponse, ErrorBody,
    ErrorResponse, FetchRequest, FetchResponse, FetchedRecord, ProduceRequest, ProduceResponse,
    WireRecord,
};
