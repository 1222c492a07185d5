//! Chunked document transfer: reassembly, wire protocol, and the async
//! service hosting both.

pub mod assembler;
pub mod protocol;
pub mod service;

pub use assembler::{AssembledDocument, ChunkAssembler, ChunkProgress, TransferMetadata};
pub use protocol::{DocumentReply, InitAck, TransferReply, TransferRequest};
pub use service::TransferService;
