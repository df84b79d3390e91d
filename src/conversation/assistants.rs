//! HTTP client for an OpenAI-compatible Assistants API.
//!
//! Runs are always created with `stream: true`. The response body is a
//! server-sent event stream:
//!
//! ```text
//! event: thread.run.requires_action
//! data: {"id":"run_1","thread_id":"thread_1","required_action":{...}}
//!
//! event: done
//! data: [DONE]
//! ```
//!
//! Frames are decoded incrementally since chunk boundaries carry no
//! meaning; a frame may span several chunks.

use crate::config::ServiceConfig;
use crate::conversation::error::ServiceError;
use crate::conversation::events::RunEvent;
use crate::conversation::service::{
    Assistant, AssistantDirectory, AssistantPage, ConversationService, RunEventStream, RunRequest,
};
use crate::tools::{ToolCallRequest, ToolOutput};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ASSISTANTS_BETA: &str = "assistants=v2";
const PAGE_LIMIT: u32 = 100;

/// Client for the hosted Assistants API.
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateRunBody<'a> {
    assistant_id: &'a str,
    #[serde(skip_serializing_if = "<[serde_json::Value]>::is_empty")]
    tools: &'a [serde_json::Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct SubmitToolOutputsBody<'a> {
    tool_outputs: &'a [ToolOutput],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct RunObject {
    #[serde(default)]
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    required_action: Option<RequiredAction>,
    #[serde(default)]
    last_error: Option<RunLastError>,
    #[serde(default)]
    incomplete_details: Option<IncompleteDetails>,
}

#[derive(Debug, Deserialize)]
struct RequiredAction {
    submit_tool_outputs: SubmitToolOutputsAction,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputsAction {
    tool_calls: Vec<RequiredToolCall>,
}

#[derive(Debug, Deserialize)]
struct RequiredToolCall {
    id: String,
    function: RequiredFunction,
}

#[derive(Debug, Deserialize)]
struct RequiredFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct RunLastError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct IncompleteDetails {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaObject {
    id: String,
    delta: MessageDeltaBody,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    id: String,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    #[serde(default)]
    value: String,
}

fn joined_text(content: &[MessageContent]) -> String {
    content
        .iter()
        .filter_map(|c| c.text.as_ref())
        .map(|t| t.value.as_str())
        .collect()
}

/// One server-sent event frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub(crate) event: Option<String>,
    pub(crate) data: String,
}

/// Incremental SSE decoder.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    current: SseFrame,
    has_data: bool,
}

impl SseDecoder {
    /// Feeds a chunk and returns every frame it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if self.current.event.is_some() || self.has_data {
                    frames.push(std::mem::take(&mut self.current));
                    self.has_data = false;
                }
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => self.current.event = Some(value.to_string()),
                "data" => {
                    if self.has_data {
                        self.current.data.push('\n');
                    }
                    self.current.data.push_str(value);
                    self.has_data = true;
                }
                _ => {}
            }
        }

        frames
    }
}

/// Result of interpreting one frame.
#[derive(Debug, PartialEq)]
pub(crate) enum Decoded {
    Event(RunEvent),
    Done,
}

fn parse_data<T: serde::de::DeserializeOwned>(event: &str, data: &str) -> Result<T, ServiceError> {
    serde_json::from_str(data)
        .map_err(|e| ServiceError::parse_error(format!("failed to parse '{}' event: {}", event, e)))
}

/// Maps a frame to a run event.
pub(crate) fn decode_frame(frame: &SseFrame) -> Result<Decoded, ServiceError> {
    let data = frame.data.trim();
    if data == "[DONE]" {
        return Ok(Decoded::Done);
    }
    let Some(event) = frame.event.as_deref() else {
        return Ok(Decoded::Event(RunEvent::Other {
            event: String::new(),
        }));
    };

    let decoded = match event {
        "done" => Decoded::Done,
        "error" => {
            let message = serde_json::from_str::<ApiErrorDetail>(data)
                .map(|detail| detail.message)
                .or_else(|_| serde_json::from_str::<ApiErrorResponse>(data).map(|r| r.error.message))
                .unwrap_or_else(|_| data.to_string());
            return Err(ServiceError::stream_error(message));
        }
        "thread.run.requires_action" => {
            let run: RunObject = parse_data(event, data)?;
            let tool_calls = run
                .required_action
                .map(|action| {
                    action
                        .submit_tool_outputs
                        .tool_calls
                        .into_iter()
                        .map(|call| {
                            ToolCallRequest::new(call.id, call.function.name, call.function.arguments)
                        })
                        .collect()
                })
                .unwrap_or_default();
            Decoded::Event(RunEvent::RequiresAction {
                run_id: run.id,
                thread_id: run.thread_id,
                tool_calls,
            })
        }
        "thread.run.completed" => {
            let run: RunObject = parse_data(event, data)?;
            Decoded::Event(RunEvent::RunCompleted { run_id: run.id })
        }
        "thread.run.failed" => {
            let run: RunObject = parse_data(event, data)?;
            let reason = run
                .last_error
                .map(|e| match e.code {
                    Some(code) => format!("{}: {}", code, e.message),
                    None => e.message,
                })
                .unwrap_or_else(|| "unknown error".to_string());
            Decoded::Event(RunEvent::RunFailed {
                run_id: run.id,
                reason,
            })
        }
        "thread.run.cancelled" => {
            let run: RunObject = parse_data(event, data)?;
            Decoded::Event(RunEvent::RunCancelled { run_id: run.id })
        }
        "thread.run.expired" => {
            let run: RunObject = parse_data(event, data)?;
            Decoded::Event(RunEvent::RunExpired { run_id: run.id })
        }
        "thread.run.incomplete" => {
            let run: RunObject = parse_data(event, data)?;
            let reason = run
                .incomplete_details
                .and_then(|d| d.reason)
                .unwrap_or_else(|| "unknown".to_string());
            Decoded::Event(RunEvent::RunIncomplete {
                run_id: run.id,
                reason,
            })
        }
        "thread.run.created" | "thread.run.queued" | "thread.run.in_progress"
        | "thread.run.cancelling" => {
            let run: RunObject = parse_data(event, data)?;
            Decoded::Event(RunEvent::RunStatus {
                run_id: run.id,
                thread_id: run.thread_id,
                status: run.status,
            })
        }
        "thread.message.delta" => {
            let delta: MessageDeltaObject = parse_data(event, data)?;
            Decoded::Event(RunEvent::MessageDelta {
                text: joined_text(&delta.delta.content),
                message_id: delta.id,
            })
        }
        "thread.message.completed" => {
            let message: MessageObject = parse_data(event, data)?;
            Decoded::Event(RunEvent::MessageCompleted {
                text: joined_text(&message.content),
                message_id: message.id,
            })
        }
        other => Decoded::Event(RunEvent::Other {
            event: other.to_string(),
        }),
    };
    Ok(decoded)
}

fn event_stream(response: reqwest::Response) -> RunEventStream {
    let mut bytes = response.bytes_stream();
    Box::pin(async_stream::stream! {
        let mut decoder = SseDecoder::default();
        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ServiceError::stream_error(format!("stream read error: {}", e)));
                    return;
                }
            };
            for frame in decoder.push(&chunk) {
                match decode_frame(&frame) {
                    Ok(Decoded::Event(event)) => yield Ok(event),
                    Ok(Decoded::Done) => return,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }
    })
}

impl AssistantsClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::network` if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tool-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Creates a client from the `[service]` configuration section.
    ///
    /// The API key is read from the environment variable the section names.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::invalid_config` if the key variable is unset.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::invalid_config(
                    config.api_key_env.clone(),
                    "environment variable is not set",
                )
            })?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<reqwest::Response, ServiceError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ServiceError::network(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::parse_error_response(response, resource).await);
        }
        Ok(response)
    }

    async fn parse_error_response(response: reqwest::Response, resource: &str) -> ServiceError {
        let status = response.status();
        let status_code = status.as_u16();

        if status_code == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return ServiceError::rate_limited(Duration::from_secs(retry_after));
        }
        if status_code == 404 {
            return ServiceError::not_found(resource);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            match api_error.error.error_type.as_deref() {
                Some("authentication_error" | "invalid_api_key") => {
                    ServiceError::authentication_failed(api_error.error.message)
                }
                _ => ServiceError::api_error(
                    status_code,
                    api_error.error.message,
                    api_error.error.error_type,
                ),
            }
        } else if status_code == 401 {
            ServiceError::authentication_failed(status.canonical_reason().unwrap_or("unauthorized"))
        } else {
            ServiceError::api_error(
                status_code,
                if error_body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error")
                } else {
                    &error_body
                },
                None,
            )
        }
    }

    /// Creates an empty thread and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` if the request fails.
    pub async fn create_thread(&self) -> Result<String, ServiceError> {
        let response = self
            .send(
                self.client
                    .post(self.endpoint("threads"))
                    .json(&serde_json::json!({})),
                "thread",
            )
            .await?;
        let thread: ThreadObject = response
            .json()
            .await
            .map_err(|e| ServiceError::parse_error(format!("failed to parse thread: {}", e)))?;
        Ok(thread.id)
    }

    /// Appends a user message to a thread.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` if the request fails.
    pub async fn create_message(&self, thread_id: &str, content: &str) -> Result<(), ServiceError> {
        self.send(
            self.client
                .post(self.endpoint(&format!("threads/{}/messages", thread_id)))
                .json(&serde_json::json!({ "role": "user", "content": content })),
            &format!("thread '{}'", thread_id),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationService for AssistantsClient {
    async fn create_run(
        &self,
        thread_id: &str,
        request: &RunRequest,
    ) -> Result<RunEventStream, ServiceError> {
        let body = CreateRunBody {
            assistant_id: &request.assistant_id,
            tools: &request.tools,
            instructions: request.instructions.as_deref(),
            stream: true,
        };
        tracing::debug!(thread_id, assistant_id = %request.assistant_id, "Creating run");
        let response = self
            .send(
                self.client
                    .post(self.endpoint(&format!("threads/{}/runs", thread_id)))
                    .json(&body),
                &format!("thread '{}'", thread_id),
            )
            .await?;
        Ok(event_stream(response))
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream, ServiceError> {
        let body = SubmitToolOutputsBody {
            tool_outputs: outputs,
            stream: true,
        };
        tracing::debug!(thread_id, run_id, count = outputs.len(), "Submitting tool outputs");
        let response = self
            .send(
                self.client
                    .post(self.endpoint(&format!(
                        "threads/{}/runs/{}/submit_tool_outputs",
                        thread_id, run_id
                    )))
                    .json(&body),
                &format!("run '{}'", run_id),
            )
            .await?;
        Ok(event_stream(response))
    }
}

#[async_trait]
impl AssistantDirectory for AssistantsClient {
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant, ServiceError> {
        let response = self
            .send(
                self.client
                    .get(self.endpoint(&format!("assistants/{}", assistant_id))),
                &format!("assistant '{}'", assistant_id),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::parse_error(format!("failed to parse assistant: {}", e)))
    }

    async fn list_assistants(&self, after: Option<&str>) -> Result<AssistantPage, ServiceError> {
        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }
        let response = self
            .send(
                self.client.get(self.endpoint("assistants")).query(&query),
                "assistants",
            )
            .await?;
        response.json().await.map_err(|e| {
            ServiceError::parse_error(format!("failed to parse assistant list: {}", e))
        })
    }
}
