use crate::{CompletionChunk, CompletionError, StreamingResult};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;

/// Marker that prefixes payload lines, including its single space
const DATA_PREFIX: &str = "data: ";
/// Payload the provider sends to close the stream
const DONE_SENTINEL: &str = "[DONE]";

/// Meaning of one complete line of a provider stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Chunk(String),
    Done,
}

/// Line splitter for provider event streams
///
/// Bytes are buffered until a `\n` arrives so lines split across HTTP chunks (and
/// multi-byte characters split across them) come out whole. Parsing is lenient: no
/// input is ever rejected.
#[derive(Debug, Default)]
pub struct LineParser {
    buffer: Vec<u8>,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `bytes` and return every line completed by them, in order
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&raw[..newline_pos]);
            if let Some(parsed) = Self::parse_line(&line) {
                lines.push(parsed);
            }
        }
        lines
    }

    /// Flush an unterminated trailing line once the connection has closed
    pub fn finish(&mut self) -> Option<SseLine> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        Self::parse_line(&String::from_utf8_lossy(&raw))
    }

    /// Classify one line without its trailing `\n`
    ///
    /// - blank lines are skipped
    /// - `data: ` lines yield their payload, or `Done` for the `[DONE]` sentinel
    /// - any other line, `data:` without the space included, is passed through verbatim
    pub fn parse_line(line: &str) -> Option<SseLine> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return None;
        }

        match line.strip_prefix(DATA_PREFIX) {
            Some(payload) => {
                if payload.trim() == DONE_SENTINEL {
                    Some(SseLine::Done)
                } else {
                    Some(SseLine::Chunk(payload.to_string()))
                }
            }
            None => Some(SseLine::Chunk(line.to_string())),
        }
    }
}

/// Turn a provider byte stream into a stream of completion chunks
///
/// The returned stream owns `byte_stream`; dropping it closes the upstream
/// connection. It yields to the scheduler after every chunk.
pub fn chunk_stream<S, E>(byte_stream: S) -> StreamingResult
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut parser = LineParser::new();
        let mut chunk_count: usize = 0;

        'read: loop {
            match byte_stream.next().await {
                Some(Ok(bytes)) => {
                    for line in parser.feed(&bytes) {
                        match line {
                            SseLine::Chunk(data) => {
                                chunk_count += 1;
                                yield Ok(CompletionChunk::new(data));
                                tokio::task::yield_now().await;
                            }
                            SseLine::Done => {
                                tracing::debug!(chunk_count, "Provider sent end-of-stream sentinel");
                                break 'read;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(chunk_count, "Provider stream failed: {}", e);
                    yield Err(CompletionError::Transport(e.to_string()));
                    break 'read;
                }
                None => {
                    match parser.finish() {
                        Some(SseLine::Chunk(data)) => {
                            chunk_count += 1;
                            yield Ok(CompletionChunk::new(data));
                        }
                        Some(SseLine::Done) | None => {}
                    }
                    tracing::debug!(chunk_count, "Provider closed the stream");
                    break 'read;
                }
            }
        }
    })
}
