//! Bidirectional streaming binding: `POST /mcp/stream`.
//!
//! The request body is newline-delimited JSON arriving in arbitrary chunks;
//! the response body is newline-delimited JSON written as each line is
//! handled. Lines are processed strictly in order, one at a time.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use futures::StreamExt;
use gateway_auth::CredentialRecord;
use gateway_mcp::{Dispatcher, McpError, McpRequest, RequestId as McpRequestId};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::front::{Caller, RequestId};
use crate::state::AppState;

/// Content type of both directions.
pub const NDJSON: &str = "application/x-ndjson";

/// One output line: `{result}` or `{error}`, with the input id echoed.
#[derive(Debug, Serialize)]
struct OutputLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<McpRequestId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

impl OutputLine {
    fn result(id: Option<McpRequestId>, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<McpRequestId>, error: McpError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    fn encode(&self) -> Bytes {
        let mut line = serde_json::to_vec(self).unwrap_or_else(|_| {
            br#"{"error":{"code":-32603,"message":"Failed to encode response"}}"#.to_vec()
        });
        line.push(b'\n');
        Bytes::from(line)
    }
}

/// Longest accepted input line, in bytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One unit taken from a [`LineBuffer`].
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    /// A complete line without its terminator
    Complete(Vec<u8>),
    /// A line longer than the limit; its bytes are dropped
    TooLong,
}

/// Splits incoming chunks into complete lines.
///
/// Memory is bounded by the line limit plus one chunk. An oversized line is
/// reported once, then skipped up to its terminating newline.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    limit: usize,
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    /// Create a buffer with a custom line limit.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit,
            discarding: false,
        }
    }

    /// Append a chunk.
    pub fn extend(&mut self, mut chunk: &[u8]) {
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    chunk = &chunk[end + 1..];
                }
                None => return,
            }
        }
        self.pending.extend_from_slice(chunk);
    }

    /// Take the next complete line, or report an oversized one.
    pub fn next_line(&mut self) -> Option<Line> {
        match self.pending.iter().position(|b| *b == b'\n') {
            Some(end) if end > self.limit => {
                self.pending.drain(..=end);
                Some(Line::TooLong)
            }
            Some(end) => {
                let mut line: Vec<u8> = self.pending.drain(..=end).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                Some(Line::Complete(line))
            }
            None if self.pending.len() > self.limit => {
                self.pending.clear();
                self.discarding = true;
                Some(Line::TooLong)
            }
            None => None,
        }
    }

    /// Take whatever is left once the input has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.discarding || self.pending.is_empty() {
            self.pending.clear();
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

fn too_long() -> OutputLine {
    OutputLine::error(
        None,
        McpError::new(
            McpError::PARSE_ERROR,
            format!("Parse error: line exceeds {} bytes", MAX_LINE_BYTES),
        ),
    )
}

/// Handle one input line. Blank lines produce no output.
async fn process_line(
    dispatcher: &Dispatcher,
    credential: &CredentialRecord,
    correlation_id: &str,
    line: &[u8],
) -> Option<OutputLine> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let value: Value = match serde_json::from_slice(line) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Unparseable stream line");
            return Some(OutputLine::error(None, McpError::parse_error(e)));
        }
    };

    let request: McpRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(OutputLine::error(
                None,
                McpError::new(McpError::INVALID_REQUEST, format!("Invalid request: {}", e)),
            ));
        }
    };

    let output = match dispatcher
        .handle(&request, credential, Some(correlation_id))
        .await
    {
        Ok(result) => OutputLine::result(request.id, result),
        Err(e) => OutputLine::error(request.id, e.to_mcp_error()),
    };
    Some(output)
}

/// Stream responses for a newline-delimited request body.
pub async fn handle(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    body: Body,
) -> Response {
    let dispatcher: Arc<Dispatcher> = state.dispatcher.clone();
    let credential = caller.0;
    let correlation_id = request_id.0;

    let output = async_stream::stream! {
        let mut chunks = body.into_data_stream();
        let mut buffer = LineBuffer::default();

        loop {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    buffer.extend(&chunk);
                    while let Some(line) = buffer.next_line() {
                        let out = match line {
                            Line::Complete(line) => {
                                process_line(&dispatcher, &credential, &correlation_id, &line).await
                            }
                            Line::TooLong => {
                                warn!(limit = MAX_LINE_BYTES, "Oversized stream line dropped");
                                Some(too_long())
                            }
                        };
                        if let Some(out) = out {
                            yield Ok::<_, Infallible>(out.encode());
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Stream body failed");
                    let error = McpError::internal_error(format!("Stream error: {}", e));
                    yield Ok(OutputLine::error(None, error).encode());
                    break;
                }
                None => {
                    if let Some(line) = buffer.finish() {
                        if let Some(out) =
                            process_line(&dispatcher, &credential, &correlation_id, &line).await
                        {
                            yield Ok(out.encode());
                        }
                    }
                    break;
                }
            }
        }
    };

    let mut response = Body::from_stream(output).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_spans_chunks() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"{\"method\":");
        assert_eq!(buffer.next_line(), None);

        buffer.extend(b"\"tools/list\"}\r\n{\"method\"");
        assert_eq!(
            buffer.next_line(),
            Some(Line::Complete(b"{\"method\":\"tools/list\"}".to_vec()))
        );
        assert_eq!(buffer.next_line(), None);

        buffer.extend(b":\"initialize\"}");
        assert_eq!(buffer.finish().unwrap(), b"{\"method\":\"initialize\"}");
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_oversized_line_across_chunks_is_skipped() {
        let mut buffer = LineBuffer::with_limit(8);
        buffer.extend(b"{\"a\":\"01");
        assert_eq!(buffer.next_line(), None);

        buffer.extend(b"23456789");
        assert_eq!(buffer.next_line(), Some(Line::TooLong));
        assert_eq!(buffer.next_line(), None);

        // Rest of the oversized line is dropped, the next one survives
        buffer.extend(b"abcdef\"}");
        assert_eq!(buffer.next_line(), None);
        buffer.extend(b"\n{}\n");
        assert_eq!(buffer.next_line(), Some(Line::Complete(b"{}".to_vec())));
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_oversized_line_within_one_chunk() {
        let mut buffer = LineBuffer::with_limit(4);
        buffer.extend(b"0123456789\n{}\n");
        assert_eq!(buffer.next_line(), Some(Line::TooLong));
        assert_eq!(buffer.next_line(), Some(Line::Complete(b"{}".to_vec())));
    }

    #[test]
    fn test_unterminated_oversized_tail_is_dropped() {
        let mut buffer = LineBuffer::with_limit(4);
        buffer.extend(b"0123456789");
        assert_eq!(buffer.next_line(), Some(Line::TooLong));
        buffer.extend(b"more");
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_output_line_shapes() {
        let ok = OutputLine::result(Some(McpRequestId::Number(3)), serde_json::json!({"tools": []}));
        assert_eq!(&ok.encode()[..], b"{\"id\":3,\"result\":{\"tools\":[]}}\n");

        let err = OutputLine::error(None, McpError::parse_error("eof"));
        let decoded: Value = serde_json::from_slice(&err.encode()).unwrap();
        assert_eq!(decoded["error"]["code"], -32700);
        assert!(decoded.get("id").is_none());
    }
}
