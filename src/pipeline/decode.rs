//! Streaming decoder (Bytes -> StreamChunk)
//!
//! Line-oriented SSE framing:
//! - bytes are buffered until a full `\n`-terminated line is available
//! - blank lines separate events, `:` lines are comments
//! - `data:` lines carry one JSON event, parsed by the response validator
//! - the `done_signal` payload (default "[DONE]") closes the sequence

use crate::client::error_classification::classify_transport;
use crate::protocol::validator::parse_stream_event;
use crate::protocol::ProtocolConfig;
use crate::transport::ByteStream;
use crate::types::StreamChunk;
use crate::{BoxStream, Error, ErrorContext, Result};
use futures::{stream, StreamExt};
use std::collections::VecDeque;

/// SSE decoder; prefix and sentinel come from [`ProtocolConfig`].
#[derive(Debug, Clone)]
pub struct SseDecoder {
    prefix: String,
    done_signal: String,
}

/// What one complete line means.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Skip,
    Data(&'a str),
    Done,
}

impl SseDecoder {
    pub fn new(prefix: impl Into<String>, done_signal: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            done_signal: done_signal.into(),
        }
    }

    pub fn from_config(cfg: &ProtocolConfig) -> Self {
        Self::new(cfg.data_prefix.clone(), cfg.done_signal.clone())
    }

    fn classify<'a>(&self, line: &'a str) -> Line<'a> {
        if line.is_empty() || line.starts_with(':') {
            return Line::Skip;
        }
        let Some(rest) = line.strip_prefix(self.prefix.as_str()) else {
            // event:, id:, retry: and unknown fields
            return Line::Skip;
        };
        let payload = rest.strip_prefix(' ').unwrap_or(rest).trim_end();
        if payload == self.done_signal {
            Line::Done
        } else if payload.is_empty() {
            Line::Skip
        } else {
            Line::Data(payload)
        }
    }

    /// Decode a transport byte stream into a lazy, forward-only chunk stream.
    ///
    /// The returned stream owns all buffering state; dropping it releases the
    /// underlying connection.
    pub fn decode(self, input: ByteStream) -> BoxStream<'static, StreamChunk> {
        let state = DecodeState {
            decoder: self,
            input,
            buf: Vec::new(),
            scanned: 0,
            pending: VecDeque::new(),
            saw_finish: false,
            input_done: false,
            finished: false,
        };

        Box::pin(stream::unfold(state, |mut st| async move {
            let item = st.next_item().await?;
            Some((item, st))
        }))
    }
}

struct DecodeState {
    decoder: SseDecoder,
    input: ByteStream,
    buf: Vec<u8>,
    /// Prefix of `buf` already known to contain no `\n`.
    scanned: usize,
    pending: VecDeque<Result<StreamChunk>>,
    saw_finish: bool,
    /// The byte stream returned `None`; it is never polled again.
    input_done: bool,
    finished: bool,
}

impl DecodeState {
    async fn next_item(&mut self) -> Option<Result<StreamChunk>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if let Ok(chunk) = &item {
                    self.saw_finish |= chunk.is_final();
                }
                return Some(item);
            }
            if self.finished {
                return None;
            }

            // Complete line in buffer?
            if let Some(rel) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
                let pos = self.scanned + rel;
                self.scanned = 0;
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.handle_line(&line);
                continue;
            }
            self.scanned = self.buf.len();

            if self.input_done {
                self.finished = true;
                if self.saw_finish {
                    return None;
                }
                return Some(Err(Error::network(
                    "stream closed before completion",
                    ErrorContext::new().with_source("stream_decoder"),
                )));
            }

            match self.input.next().await {
                Some(Ok(bytes)) => self.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    self.finished = true;
                    let err = classify_transport(&e);
                    return Some(Err(Error::network(
                        format!("stream interrupted: {}", err.message()),
                        ErrorContext::new().with_source("stream_decoder"),
                    )));
                }
                None => {
                    self.input_done = true;
                    // EOF: a trailing line without newline still counts.
                    if !self.buf.is_empty() {
                        let line = std::mem::take(&mut self.buf);
                        self.scanned = 0;
                        let line = line.strip_suffix(b"\r").unwrap_or(&line).to_vec();
                        self.handle_line(&line);
                    }
                }
            }
        }
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let line = match std::str::from_utf8(raw) {
            Ok(s) => s,
            Err(e) => {
                self.pending.push_back(Err(Error::validation_with_context(
                    format!("stream line is not valid UTF-8: {}", e),
                    ErrorContext::new().with_source("stream_decoder"),
                )));
                return;
            }
        };
        match self.decoder.classify(line) {
            Line::Skip => {}
            Line::Done => self.finished = true,
            Line::Data(payload) => match parse_stream_event(payload) {
                Ok(chunks) => self.pending.extend(chunks.into_iter().map(Ok)),
                Err(e) => self.pending.push_back(Err(e)),
            },
        }
    }
}
