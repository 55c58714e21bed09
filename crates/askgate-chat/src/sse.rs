use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use askgate_core::errors::GatewayError;

const DATA_PREFIX: &str = "data: ";

/// What became of one complete line pulled off the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A `data:` frame whose payload carried an answer fragment.
    Fragment(String),
    /// Blank frame, keep-alive, payload without an answer field, or a
    /// non-data framing line.
    Ignored,
    /// A `data:` frame whose payload failed to parse. Skipped, never
    /// fatal.
    Malformed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregatorState {
    Streaming,
    Ended,
    Errored,
}

/// Incremental reassembly of one answer from newline-delimited SSE
/// frames.
///
/// Chunk boundaries carry no meaning: a frame may arrive split across
/// chunks, and one chunk may complete zero, one, or many frames. The
/// carry-over buffer holds the trailing line fragment between chunks.
pub struct AnswerAggregator {
    buffer: String,
    answer: String,
    state: AggregatorState,
}

/// Decoded `data:` payload. Fields other than the answer fragment are
/// ignored.
#[derive(Deserialize)]
struct StreamFrame {
    answer: Option<String>,
}

impl Default for AnswerAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerAggregator {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            answer: String::new(),
            state: AggregatorState::Streaming,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// Fragments accumulated so far, in arrival order.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Feed one chunk of stream text. Returns the outcome of every line
    /// this chunk completed; an unterminated trailing line stays in the
    /// buffer for the next chunk.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<FrameOutcome> {
        debug_assert_eq!(self.state, AggregatorState::Streaming);
        self.buffer.push_str(chunk);

        let mut outcomes = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            outcomes.push(self.process_line(line));
        }
        outcomes
    }

    fn process_line(&mut self, line: &str) -> FrameOutcome {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return FrameOutcome::Ignored;
        };
        if payload.trim().is_empty() {
            return FrameOutcome::Ignored;
        }
        match serde_json::from_str::<StreamFrame>(payload) {
            Ok(StreamFrame {
                answer: Some(fragment),
            }) => {
                self.answer.push_str(&fragment);
                FrameOutcome::Fragment(fragment)
            }
            Ok(StreamFrame { answer: None }) => FrameOutcome::Ignored,
            Err(_) => {
                tracing::warn!(line_len = line.len(), "discarding malformed stream frame");
                FrameOutcome::Malformed
            }
        }
    }

    /// Stream end: resolve the final answer. A stream that ends
    /// mid-line loses that partial fragment.
    pub fn finish(mut self) -> String {
        self.state = AggregatorState::Ended;
        if !self.buffer.is_empty() {
            tracing::debug!(dropped = self.buffer.len(), "stream ended mid-line");
        }
        self.answer
    }

    /// Transport failure: aggregation stops and nothing accumulated is
    /// delivered.
    pub fn abort(&mut self) {
        self.state = AggregatorState::Errored;
    }
}

/// Drive a chunked transport stream through an aggregator and resolve
/// the reassembled answer. A transport error aborts aggregation — the
/// partial answer is discarded and the error propagates.
pub async fn aggregate<S, E>(stream: S) -> Result<String, GatewayError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);
    let mut aggregator = AnswerAggregator::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                aggregator.push_chunk(&text);
            }
            Err(e) => {
                aggregator.abort();
                return Err(GatewayError::StreamInterrupted(e.to_string()));
            }
        }
    }

    Ok(aggregator.finish())
}
