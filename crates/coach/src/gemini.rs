//! Gemini `streamGenerateContent` transport over Server-Sent Events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use proto::{LlmError, Role};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, ChatSession, ChatTransport, FragmentStream, SessionConfig};
use crate::probe::CredentialStore;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_SSE_BUFFER_BYTES: usize = 4 * 1024 * 1024;
const MAX_SSE_PARSE_ERRORS: usize = 3;
const FRAGMENT_CHANNEL_CAPACITY: usize = 64;

// ── Request types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

// ── Response types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

/// What one SSE payload contributed.
#[derive(Debug, Default, PartialEq, Eq)]
struct ChunkOutcome {
    fragments: Vec<String>,
    finished: bool,
}

// ── Transport ──────────────────────────────────────────────────────────────────

/// Gemini streaming chat transport.
pub struct GeminiTransport {
    client: reqwest::Client,
    store: Arc<CredentialStore>,
    base_url: String,
    idle_timeout: Duration,
}

impl GeminiTransport {
    /// Creates a transport targeting the public Gemini API.
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self::with_base_url(store, DEFAULT_BASE_URL)
    }

    /// Creates a transport targeting a custom base URL (useful for proxies/tests).
    pub fn with_base_url(store: Arc<CredentialStore>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            store,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Overrides how long the stream may stay silent before failing.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:streamGenerateContent?alt=sse",
            self.base_url
        )
    }
}

#[async_trait]
impl ChatTransport for GeminiTransport {
    async fn create_session(&self, config: &SessionConfig) -> Result<ChatSession, LlmError> {
        // The latest selected key is bound on every creation.
        let key = self
            .store
            .current()
            .ok_or_else(|| LlmError::Unauthorized("API key not valid: no key selected".into()))?;
        let session = ChatSession::new(config.clone(), key);
        debug!(session = %session.id(), model = %config.model, "Gemini session created");
        Ok(session)
    }

    async fn send(&self, session: &ChatSession, text: &str) -> Result<FragmentStream, LlmError> {
        let request = build_request(session.system_instructions(), &session.history(), text);
        let url = self.stream_url(session.model());
        debug!(
            session = %session.id(),
            model = %session.model(),
            contents = %request.contents.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", session.credential())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = response.status();
        debug!(status = %status.as_u16(), "Gemini response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &body));
        }

        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let session = session.clone();
        let user_text = text.to_string();
        let idle_timeout = self.idle_timeout;
        tokio::spawn(async move {
            match pump_sse(Box::pin(response.bytes_stream()), &tx, idle_timeout).await {
                Ok(reply) => session.record_exchange(user_text, reply),
                Err(e) => {
                    debug!(error = %e, "Gemini stream failed");
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Ok(receiver_stream(rx))
    }
}

// ── Conversion helpers ─────────────────────────────────────────────────────────

/// Builds the request body from the session history plus the new user text.
fn build_request(system_instructions: &str, history: &[ChatMessage], text: &str) -> GenerateRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|m| Content {
            role: Some(gemini_role(m.role)),
            parts: vec![TextPart {
                text: m.content.clone(),
            }],
        })
        .collect();
    contents.push(Content {
        role: Some("user"),
        parts: vec![TextPart {
            text: text.to_string(),
        }],
    });

    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![TextPart {
                text: system_instructions.to_string(),
            }],
        },
        contents,
    }
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Maps an HTTP failure (or an in-stream error object) onto the error taxonomy.
fn classify_http_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.chars().take(500).collect());
    classify_message(status, message)
}

fn classify_message(status: u16, message: String) -> LlmError {
    let lower = message.to_lowercase();
    match status {
        429 => LlmError::RateLimit,
        401 | 403 => LlmError::Unauthorized(message),
        404 => LlmError::NotFound(message),
        _ if lower.contains("api key not valid")
            || lower.contains("api_key_invalid")
            || lower.contains("permission") =>
        {
            LlmError::Unauthorized(message)
        }
        _ if lower.contains("not found") => LlmError::NotFound(message),
        _ => LlmError::Api(format!("HTTP {status}: {message}")),
    }
}

/// Parses one SSE `data:` payload.
fn parse_chunk(data: &str) -> Result<ChunkOutcome, serde_json::Error> {
    let chunk: StreamChunk = serde_json::from_str(data)?;
    let mut outcome = ChunkOutcome::default();
    for candidate in chunk.candidates {
        if let Some(content) = candidate.content {
            outcome.fragments.extend(
                content
                    .parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .filter(|t| !t.is_empty()),
            );
        }
        if candidate.finish_reason.is_some() {
            outcome.finished = true;
        }
    }
    Ok(outcome)
}

/// Returns the blocking reason when a finish reason is not a normal stop.
fn finish_error(data: &str) -> Option<String> {
    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    chunk
        .candidates
        .into_iter()
        .filter_map(|c| c.finish_reason)
        .find(|r| !matches!(r.as_str(), "STOP" | "MAX_TOKENS" | "FINISH_REASON_UNSPECIFIED"))
}

/// Extracts the in-stream error object, classified.
fn embedded_error(data: &str) -> Option<LlmError> {
    let envelope: ApiErrorEnvelope = serde_json::from_str(data).ok()?;
    let message = envelope
        .error
        .message
        .unwrap_or_else(|| "unknown error".to_string());
    Some(classify_message(envelope.error.code.unwrap_or(500), message))
}

// ── SSE processing ─────────────────────────────────────────────────────────────

/// Finds the earliest blank-line event boundary, returning (offset, length).
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|p| (p, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn drain_next_sse_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let (pos, len) = find_event_boundary(buffer)?;
    let event = buffer[..pos].to_vec();
    buffer.drain(..pos + len);
    Some(event)
}

/// Joins the `data:` lines of one event. `None` when the event carries no data.
fn extract_sse_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data).trim_end_matches('\r'))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Forwards the fragments of an SSE body in arrival order and returns the full reply.
async fn pump_sse<S, B, E>(
    mut stream: S,
    tx: &mpsc::Sender<Result<String, LlmError>>,
    idle_timeout: Duration,
) -> Result<String, LlmError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut buffer: Vec<u8> = Vec::new();
    let mut reply = String::new();
    let mut parse_errors = 0usize;
    let mut eof = false;

    loop {
        if !eof {
            let Ok(next) = tokio::time::timeout(idle_timeout, stream.next()).await else {
                return Err(LlmError::Stream("Stream idle timeout".to_string()));
            };
            match next {
                Some(chunk) => {
                    let chunk = chunk.map_err(|e| LlmError::Connection(e.to_string()))?;
                    buffer.extend_from_slice(chunk.as_ref());
                    if buffer.len() > MAX_SSE_BUFFER_BYTES {
                        return Err(LlmError::Stream(
                            "SSE buffer exceeded maximum size (4 MiB)".to_string(),
                        ));
                    }
                }
                None => {
                    eof = true;
                    // Flush a trailing event that lacks the final blank line.
                    if !buffer.iter().all(u8::is_ascii_whitespace) {
                        buffer.extend_from_slice(b"\n\n");
                    }
                }
            }
        }

        while let Some(event) = drain_next_sse_event(&mut buffer) {
            let event = std::str::from_utf8(&event).map_err(|_| {
                LlmError::Stream("Received invalid UTF-8 from SSE stream".to_string())
            })?;
            let Some(data) = extract_sse_data(event) else {
                continue;
            };
            if data == "[DONE]" {
                return Ok(reply);
            }
            if let Some(err) = embedded_error(&data) {
                return Err(err);
            }

            match parse_chunk(&data) {
                Ok(outcome) => {
                    parse_errors = 0;
                    for fragment in outcome.fragments {
                        reply.push_str(&fragment);
                        if tx.send(Ok(fragment)).await.is_err() {
                            return Err(LlmError::Stream("Fragment receiver dropped".to_string()));
                        }
                    }
                    if outcome.finished {
                        return match finish_error(&data) {
                            Some(reason) => {
                                Err(LlmError::Api(format!("Response blocked: {reason}")))
                            }
                            None => Ok(reply),
                        };
                    }
                }
                Err(e) => {
                    parse_errors = parse_errors.saturating_add(1);
                    warn!(%e, payload_bytes = data.len(), "Invalid Gemini SSE payload");
                    if parse_errors >= MAX_SSE_PARSE_ERRORS {
                        return Err(LlmError::InvalidResponse(format!(
                            "Invalid stream payload: {e}"
                        )));
                    }
                }
            }
        }

        if eof {
            return Err(LlmError::Stream(
                "Connection closed before stream completed".to_string(),
            ));
        }
    }
}

/// Adapts the fragment channel into a `FragmentStream`.
fn receiver_stream(rx: mpsc::Receiver<Result<String, LlmError>>) -> FragmentStream {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config() -> SessionConfig {
        SessionConfig {
            model: "gemini-2.5-flash".to_string(),
            system_instructions: "You are Pro-Bot.".to_string(),
        }
    }

    fn sse(text: &str, finish: Option<&str>) -> String {
        let finish = finish
            .map(|f| format!(r#","finishReason":"{f}""#))
            .unwrap_or_default();
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":{}}}]}}{finish}}}]}}\r\n\r\n",
            serde_json::to_string(text).expect("encode text")
        )
    }

    async fn collect(
        chunks: Vec<&'static [u8]>,
    ) -> (Result<String, LlmError>, Vec<Result<String, LlmError>>) {
        let (tx, mut rx) = mpsc::channel(16);
        let stream = futures_util::stream::iter(
            chunks
                .into_iter()
                .map(Ok::<&'static [u8], std::io::Error>),
        );
        let result = pump_sse(stream, &tx, Duration::from_secs(5)).await;
        drop(tx);
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        (result, items)
    }

    // ── request conversion ─────────────────────────────────────────────────────

    #[test]
    fn build_request_maps_history_roles_and_appends_user_text() {
        let history = vec![
            ChatMessage::user("What is a coin flip?"),
            ChatMessage::assistant("Heads or tails, 50/50!"),
        ];
        let request = build_request("You are Pro-Bot.", &history, "And a die?");
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You are Pro-Bot.");
        assert!(json["systemInstruction"].get("role").is_none());
        let contents = json["contents"].as_array().expect("contents");
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "And a die?");
    }

    // ── error classification ───────────────────────────────────────────────────

    #[test]
    fn classify_invalid_key_as_unauthorized() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_http_error(400, body);
        assert!(matches!(err, LlmError::Unauthorized(ref m) if m.contains("API key not valid")));
    }

    #[test]
    fn classify_not_found_and_permission_errors() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found."}}"#;
        assert!(matches!(classify_http_error(404, body), LlmError::NotFound(_)));
        assert!(matches!(
            classify_http_error(403, "forbidden"),
            LlmError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_http_error(400, "caller does not have permission"),
            LlmError::Unauthorized(_)
        ));
    }

    #[test]
    fn classify_rate_limit_and_generic_errors() {
        assert_eq!(classify_http_error(429, "slow down"), LlmError::RateLimit);
        let err = classify_http_error(500, "boom");
        assert_eq!(err, LlmError::Api("HTTP 500: boom".to_string()));
        assert!(!err.is_credential_invalidated());
    }

    // ── SSE framing ────────────────────────────────────────────────────────────

    #[test]
    fn extract_sse_data_joins_data_lines_and_skips_comments() {
        assert_eq!(extract_sse_data(": keep-alive"), None);
        assert_eq!(
            extract_sse_data("event: message\ndata: {\"a\":1}"),
            Some("{\"a\":1}".to_string())
        );
        assert_eq!(
            extract_sse_data("data:first\r\ndata: second"),
            Some("first\nsecond".to_string())
        );
    }

    #[test]
    fn drain_next_sse_event_handles_lf_and_crlf_boundaries() {
        let mut buffer = b"data: a\r\n\r\ndata: b\n\ndata: c".to_vec();
        assert_eq!(drain_next_sse_event(&mut buffer), Some(b"data: a".to_vec()));
        assert_eq!(drain_next_sse_event(&mut buffer), Some(b"data: b".to_vec()));
        assert_eq!(drain_next_sse_event(&mut buffer), None);
        assert_eq!(buffer, b"data: c".to_vec());
    }

    #[test]
    fn parse_chunk_skips_thought_parts_and_detects_finish() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"thinking","thought":true},{"text":"Hello"}]},"finishReason":"STOP"}]}"#;
        let outcome = parse_chunk(data).expect("parse");
        assert_eq!(outcome.fragments, vec!["Hello".to_string()]);
        assert!(outcome.finished);
        assert_eq!(finish_error(data), None);
    }

    #[test]
    fn finish_error_reports_blocking_reasons() {
        let data = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(finish_error(data).as_deref(), Some("SAFETY"));
    }

    // ── stream pumping ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn pump_sse_forwards_fragments_in_order_across_chunk_splits() {
        let first = sse("The chance ", None);
        let second = sse("is 1 in 6.", Some("STOP"));
        let body: &'static str = Box::leak(format!("{first}{second}").into_boxed_str());
        let split = first.len() - 5;
        let (result, items) = collect(vec![
            body[..split].as_bytes(),
            body[split..].as_bytes(),
        ])
        .await;

        assert_eq!(result, Ok("The chance is 1 in 6.".to_string()));
        assert_eq!(
            items,
            vec![Ok("The chance ".to_string()), Ok("is 1 in 6.".to_string())]
        );
    }

    #[tokio::test]
    async fn pump_sse_flushes_trailing_event_without_blank_line() {
        let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"done\"}]},\"finishReason\":\"STOP\"}]}";
        let (result, items) = collect(vec![body.as_bytes()]).await;
        assert_eq!(result, Ok("done".to_string()));
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn pump_sse_reports_premature_eof() {
        let body: &'static str = Box::leak(sse("partial", None).into_boxed_str());
        let (result, items) = collect(vec![body.as_bytes()]).await;
        assert!(matches!(result, Err(LlmError::Stream(ref m)) if m.contains("closed")));
        assert_eq!(items, vec![Ok("partial".to_string())]);
    }

    #[tokio::test]
    async fn pump_sse_classifies_embedded_error_object() {
        let body = "data: {\"error\":{\"code\":404,\"message\":\"Requested entity was not found.\"}}\n\n";
        let (result, items) = collect(vec![body.as_bytes()]).await;
        assert!(matches!(result, Err(LlmError::NotFound(_))));
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn pump_sse_gives_up_after_repeated_invalid_payloads() {
        let body = "data: {nope\n\ndata: {nope\n\ndata: {nope\n\n";
        let (result, _) = collect(vec![body.as_bytes()]).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn pump_sse_times_out_on_idle_stream() {
        let (tx, _rx) = mpsc::channel(1);
        let stream = futures_util::stream::pending::<Result<Vec<u8>, std::io::Error>>();
        let result = pump_sse(stream, &tx, Duration::from_millis(20)).await;
        assert_eq!(
            result,
            Err(LlmError::Stream("Stream idle timeout".to_string()))
        );
    }

    // ── transport ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_session_requires_selected_key() {
        let transport = GeminiTransport::new(Arc::new(CredentialStore::new()));
        let err = transport
            .create_session(&config())
            .await
            .expect_err("no key selected");
        assert!(matches!(err, LlmError::Unauthorized(_)));

        let transport = GeminiTransport::new(Arc::new(CredentialStore::with_key(Some("k1"))));
        let session = transport.create_session(&config()).await.expect("session");
        assert_eq!(session.credential(), "k1");
    }

    #[test]
    fn stream_url_targets_model_with_sse() {
        let transport = GeminiTransport::with_base_url(
            Arc::new(CredentialStore::new()),
            "http://localhost:9000/",
        );
        assert_eq!(
            transport.stream_url("gemini-2.5-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    /// Serves exactly one HTTP response and returns the raw request it saw.
    async fn serve_once(
        status_line: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some((end, _)) = find_event_boundary(&request) {
                    let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let len = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn send_streams_fragments_and_records_history() {
        let body = format!("{}{}", sse("Two ", None), sse("outcomes!", Some("STOP")));
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", body).await;
        let transport = GeminiTransport::with_base_url(
            Arc::new(CredentialStore::with_key(Some("test-key"))),
            base_url,
        );
        let session = transport.create_session(&config()).await.expect("session");

        let stream = transport
            .send(&session, "How many sides does a coin have?")
            .await
            .expect("stream opens");
        let fragments: Vec<Result<String, LlmError>> = stream.collect().await;
        assert_eq!(
            fragments,
            vec![Ok("Two ".to_string()), Ok("outcomes!".to_string())]
        );

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], ChatMessage::assistant("Two outcomes!"));

        let request = server.await.expect("server task").to_lowercase();
        assert!(request.contains("x-goog-api-key: test-key"));
        assert!(request.contains(":streamgeneratecontent?alt=sse"));
    }

    #[tokio::test]
    async fn send_classifies_http_failure_at_open() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key."}}"#;
        let (base_url, _server) = serve_once("HTTP/1.1 400 Bad Request", body.to_string()).await;
        let transport = GeminiTransport::with_base_url(
            Arc::new(CredentialStore::with_key(Some("bad-key"))),
            base_url,
        );
        let session = transport.create_session(&config()).await.expect("session");
        let err = match transport.send(&session, "hi").await {
            Ok(_) => panic!("send should fail"),
            Err(e) => e,
        };
        assert!(err.is_credential_invalidated());
        assert!(session.history().is_empty());
    }
}
