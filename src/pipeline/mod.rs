//! 流水线处理模块：把传输层字节流解码为补全片段。
//!
//! # Pipeline
//!
//! ```text
//! Raw Bytes → SseDecoder → Result<StreamChunk>
//!     │           │
//!   HTTP      line framing, sentinel,
//!             schema validation
//! ```

pub mod decode;

pub use decode::SseDecoder;
