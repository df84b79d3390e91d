//! The run resolution loop.
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            ▼                                          │
//!      ┌───────────┐  RequiresAction  ┌────────────────┐ │
//!  ──► │ Streaming │ ───────────────► │ ActionRequired │ │
//!      └───────────┘                  └────────────────┘ │
//!        │      │                             │ all calls resolved
//!        │      │ RunCompleted                ▼          │
//!        │      └──────────► Done      ┌────────────┐    │
//!        │                             │ Submitting │ ───┘
//!        └─ failed/cancelled/expired/  └────────────┘
//!           incomplete/closed ──► Failed
//! ```
//!
//! Each submission returns a fresh stream for the same run. The loop
//! replaces its stream and keeps going until a terminal event.

use crate::conversation::{ConversationService, RunEvent, RunEventStream, RunRequest};
use crate::run::error::RunError;
use crate::run::observer::RunObserver;
use crate::tools::executor;
use crate::tools::{ToolCallRequest, ToolCallResult, ToolDefinition, ToolOutput, ToolRegistry};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Default bound on tool output submissions per run.
pub const DEFAULT_MAX_SUBMISSIONS: usize = 16;

/// Limits and execution mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of tool output submissions before the run fails
    pub max_submissions: usize,
    /// Execute the calls of one batch concurrently
    pub parallel_tool_calls: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
            parallel_tool_calls: false,
        }
    }
}

impl RunConfig {
    /// Sets the submission bound.
    #[must_use]
    pub fn with_max_submissions(mut self, max_submissions: usize) -> Self {
        self.max_submissions = max_submissions;
        self
    }

    /// Enables or disables concurrent execution within a batch.
    #[must_use]
    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = parallel;
        self
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    /// Consuming events
    #[default]
    Streaming,
    /// Resolving a batch of tool calls
    ActionRequired,
    /// Submitting a batch of outputs
    Submitting,
    /// The run completed
    Done,
    /// The run ended in failure
    Failed,
}

/// State of one run, owned by the resolver while the run is live.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    run_id: Option<String>,
    thread_id: String,
    pending_action: Option<Vec<ToolCallRequest>>,
    terminal: bool,
    phase: RunPhase,
}

impl RunState {
    fn new(thread_id: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            ..Self::default()
        }
    }

    /// The run identifier, once the first run event arrived.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// The thread the run belongs to.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Calls awaiting outputs, if the run is paused.
    #[must_use]
    pub fn pending_action(&self) -> Option<&[ToolCallRequest]> {
        self.pending_action.as_deref()
    }

    /// Whether a terminal event was seen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn fail(&mut self) {
        self.terminal = true;
        self.phase = RunPhase::Failed;
        self.pending_action = None;
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Final state; always `Done`
    pub state: RunState,
    /// Number of tool output submissions made
    pub submissions: usize,
    /// Every submitted result, in submission order
    pub results: Vec<ToolCallResult>,
}

impl RunReport {
    /// The run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.state.run_id().unwrap_or_default()
    }
}

/// Drives runs to completion by resolving their tool calls.
#[derive(Debug, Clone)]
pub struct RunResolver {
    registry: Arc<ToolRegistry>,
    service: Arc<dyn ConversationService>,
    config: RunConfig,
}

impl RunResolver {
    /// Creates a resolver with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, service: Arc<dyn ConversationService>) -> Self {
        Self {
            registry,
            service,
            config: RunConfig::default(),
        }
    }

    /// Replaces the run configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Starts a run on a thread and resolves it.
    ///
    /// # Errors
    ///
    /// Returns a `RunError` if the run cannot be started or fails.
    pub async fn start(
        &self,
        thread_id: &str,
        request: &RunRequest,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport, RunError> {
        let stream = self.service.create_run(thread_id, request).await?;
        self.resolve(thread_id, stream, observer).await
    }

    /// Resolves a run from an already open event stream.
    ///
    /// Dropping the returned future abandons the run without submitting
    /// anything further.
    ///
    /// # Errors
    ///
    /// Returns a `RunError` when the run ends in any state other than
    /// completed, or when a pending call names an unregistered tool.
    pub async fn resolve(
        &self,
        thread_id: &str,
        mut stream: RunEventStream,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport, RunError> {
        let mut state = RunState::new(thread_id);
        let mut resolved: HashMap<String, String> = HashMap::new();
        let mut results = Vec::new();
        let mut submissions = 0usize;

        loop {
            let event = match stream.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    state.fail();
                    tracing::warn!(run_id = ?state.run_id, error = %e, "Run stream failed");
                    return Err(RunError::upstream(e));
                }
                None => {
                    state.fail();
                    tracing::warn!(run_id = ?state.run_id, "Run stream closed early");
                    return Err(RunError::stream_closed(state.run_id));
                }
            };

            if let Some(id) = event.run_id() {
                match &state.run_id {
                    None => state.run_id = Some(id.to_string()),
                    Some(current) if current != id => {
                        let message = format!(
                            "event for run '{}' arrived on the stream of run '{}'",
                            id, current
                        );
                        state.fail();
                        return Err(RunError::protocol(message));
                    }
                    Some(_) => {}
                }
            }

            let (run_id, tool_calls) = match event {
                RunEvent::RequiresAction {
                    run_id,
                    thread_id,
                    tool_calls,
                } => {
                    if thread_id != state.thread_id {
                        let message = format!(
                            "run '{}' requires action on thread '{}' but is bound to thread '{}'",
                            run_id, thread_id, state.thread_id
                        );
                        state.fail();
                        return Err(RunError::protocol(message));
                    }
                    (run_id, tool_calls)
                }
                terminal if terminal.is_terminal() => {
                    observer.on_event(&terminal);
                    return match terminal {
                        RunEvent::RunCompleted { run_id } => {
                            state.terminal = true;
                            state.phase = RunPhase::Done;
                            tracing::info!(run_id = %run_id, submissions, "Run completed");
                            Ok(RunReport {
                                state,
                                submissions,
                                results,
                            })
                        }
                        other => {
                            state.fail();
                            Err(terminal_error(other))
                        }
                    };
                }
                other => {
                    observer.on_event(&other);
                    continue;
                }
            };

            state.phase = RunPhase::ActionRequired;
            if tool_calls.is_empty() {
                state.fail();
                return Err(RunError::protocol(format!(
                    "run '{}' requires action but listed no tool calls",
                    run_id
                )));
            }
            tracing::debug!(run_id = %run_id, call_count = tool_calls.len(), "Run requires action");
            state.pending_action = Some(tool_calls);

            if submissions >= self.config.max_submissions {
                state.fail();
                tracing::warn!(run_id = %run_id, submissions, "Run exceeded the submission limit");
                return Err(RunError::continuation_limit(
                    run_id,
                    self.config.max_submissions,
                ));
            }

            let batch = match self
                .resolve_action(&run_id, state.pending_action.as_deref().unwrap_or_default(), &mut resolved)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    state.fail();
                    tracing::error!(run_id = %run_id, error = %e, "Run failed while resolving tool calls");
                    return Err(e);
                }
            };

            state.phase = RunPhase::Submitting;
            let outputs: Vec<ToolOutput> = batch.iter().map(ToolCallResult::to_tool_output).collect();
            stream = match self
                .service
                .submit_tool_outputs(&state.thread_id, &run_id, &outputs)
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    state.fail();
                    return Err(RunError::upstream(e));
                }
            };
            submissions += 1;
            state.pending_action = None;
            state.phase = RunPhase::Streaming;
            tracing::debug!(run_id = %run_id, output_count = outputs.len(), submissions, "Tool outputs submitted");

            observer.on_tool_results(&run_id, &batch);
            results.extend(batch);
        }
    }

    /// Resolves one batch of calls into results, one per distinct call id.
    ///
    /// Every tool name is looked up before anything executes, so an unknown
    /// name leaves the batch untouched. Ids already present in `resolved`
    /// reuse their recorded content instead of executing again.
    ///
    /// # Errors
    ///
    /// Returns an unknown tool `RunError` if any call names an unregistered
    /// tool.
    pub async fn resolve_action(
        &self,
        run_id: &str,
        calls: &[ToolCallRequest],
        resolved: &mut HashMap<String, String>,
    ) -> Result<Vec<ToolCallResult>, RunError> {
        let mut tools: Vec<Arc<ToolDefinition>> = Vec::with_capacity(calls.len());
        for call in calls {
            let tool = self
                .registry
                .require(&call.tool_name)
                .map_err(|e| RunError::unknown_tool(run_id, e))?;
            tools.push(Arc::clone(tool));
        }

        let mut seen = HashSet::new();
        let mut order = Vec::with_capacity(calls.len());
        let mut fresh = Vec::new();
        for (tool, call) in tools.into_iter().zip(calls) {
            if !seen.insert(call.call_id.as_str()) {
                tracing::warn!(run_id, call_id = %call.call_id, "Duplicate call id in batch");
                continue;
            }
            order.push(call.call_id.as_str());
            if resolved.contains_key(&call.call_id) {
                tracing::debug!(run_id, call_id = %call.call_id, "Reusing output for call id");
                continue;
            }
            fresh.push((tool, call));
        }

        let executed: Vec<ToolCallResult> = if self.config.parallel_tool_calls {
            futures::future::join_all(
                fresh
                    .iter()
                    .map(|(tool, call)| executor::resolve_call(tool, call)),
            )
            .await
        } else {
            let mut executed = Vec::with_capacity(fresh.len());
            for (tool, call) in &fresh {
                executed.push(executor::resolve_call(tool, call).await);
            }
            executed
        };

        for result in executed {
            resolved.insert(result.call_id, result.content);
        }

        Ok(order
            .into_iter()
            .filter_map(|call_id| {
                resolved.get(call_id).map(|content| ToolCallResult {
                    call_id: call_id.to_string(),
                    content: content.clone(),
                })
            })
            .collect())
    }
}

fn terminal_error(event: RunEvent) -> RunError {
    match event {
        RunEvent::RunFailed { run_id, reason } => RunError::run_failed(run_id, reason),
        RunEvent::RunCancelled { run_id } => RunError::cancelled(run_id),
        RunEvent::RunExpired { run_id } => RunError::expired(run_id),
        RunEvent::RunIncomplete { run_id, reason } => RunError::incomplete(run_id, reason),
        other => RunError::protocol(format!("unexpected terminal event {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ServiceError;
    use crate::run::observer::{MessageCollector, NoopObserver};
    use crate::schema::{Field, FieldType};
    use crate::tools::ToolConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Script = Vec<Result<RunEvent, ServiceError>>;

    #[derive(Debug, Default)]
    struct ScriptedService {
        streams: Mutex<VecDeque<Script>>,
        submissions: Mutex<Vec<Vec<ToolOutput>>>,
    }

    impl ScriptedService {
        fn new(streams: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                streams: Mutex::new(streams.into()),
                submissions: Mutex::default(),
            })
        }

        fn next_stream(&self) -> RunEventStream {
            let script = self.streams.lock().unwrap().pop_front().unwrap_or_default();
            Box::pin(futures::stream::iter(script))
        }

        fn submissions(&self) -> Vec<Vec<ToolOutput>> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConversationService for ScriptedService {
        async fn create_run(
            &self,
            _thread_id: &str,
            _request: &RunRequest,
        ) -> Result<RunEventStream, ServiceError> {
            Ok(self.next_stream())
        }

        async fn submit_tool_outputs(
            &self,
            _thread_id: &str,
            _run_id: &str,
            outputs: &[ToolOutput],
        ) -> Result<RunEventStream, ServiceError> {
            self.submissions.lock().unwrap().push(outputs.to_vec());
            Ok(self.next_stream())
        }
    }

    fn action(calls: &[(&str, &str, &str)]) -> Result<RunEvent, ServiceError> {
        Ok(RunEvent::RequiresAction {
            run_id: "run_1".into(),
            thread_id: "thread_1".into(),
            tool_calls: calls
                .iter()
                .map(|(id, name, args)| ToolCallRequest::new(*id, *name, *args))
                .collect(),
        })
    }

    fn completed() -> Result<RunEvent, ServiceError> {
        Ok(RunEvent::RunCompleted {
            run_id: "run_1".into(),
        })
    }

    fn registry(counter: Arc<AtomicUsize>) -> Arc<ToolRegistry> {
        let echo = ToolDefinition::builder(ToolConfig::new("echo", "Echoes text"))
            .field(Field::new("text", FieldType::String, "Text to echo"))
            .blocking(move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(args.get_str("text").unwrap_or_default()))
            })
            .build()
            .unwrap();
        let broken = ToolDefinition::builder(
            ToolConfig::new("broken", "Always fails").with_error_content("broken tool"),
        )
        .blocking(|_| Err(crate::tools::ToolError::execution_failed("broken", "boom")))
        .build()
        .unwrap();
        let mut builder = ToolRegistry::builder();
        builder.register(echo).unwrap();
        builder.register(broken).unwrap();
        Arc::new(builder.build())
    }

    fn resolver(service: Arc<ScriptedService>, counter: Arc<AtomicUsize>) -> RunResolver {
        RunResolver::new(registry(counter), service)
    }

    #[tokio::test]
    async fn completes_without_tool_calls() {
        let service = ScriptedService::new(vec![vec![
            Ok(RunEvent::MessageDelta {
                message_id: "m".into(),
                text: "hi".into(),
            }),
            Ok(RunEvent::MessageCompleted {
                message_id: "m".into(),
                text: "hi".into(),
            }),
            completed(),
        ]]);
        let mut collector = MessageCollector::new();
        let report = resolver(service.clone(), Arc::default())
            .start("thread_1", &RunRequest::new("asst_1"), &mut collector)
            .await
            .unwrap();

        assert_eq!(report.submissions, 0);
        assert_eq!(report.state.phase(), RunPhase::Done);
        assert_eq!(collector.messages(), ["hi".to_string()]);
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn submits_outputs_and_resumes() {
        let service = ScriptedService::new(vec![
            vec![action(&[
                ("call_1", "echo", r#"{"text": "one"}"#),
                ("call_2", "broken", "{}"),
            ])],
            vec![completed()],
        ]);
        let report = resolver(service.clone(), Arc::default())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap();

        assert_eq!(report.submissions, 1);
        assert_eq!(report.run_id(), "run_1");
        let submissions = service.submissions();
        assert_eq!(
            submissions[0],
            vec![
                ToolOutput {
                    tool_call_id: "call_1".into(),
                    output: "one".into()
                },
                ToolOutput {
                    tool_call_id: "call_2".into(),
                    output: "broken tool".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn unknown_tool_fails_before_executing_anything() {
        let counter = Arc::new(AtomicUsize::new(0));
        let service = ScriptedService::new(vec![vec![action(&[
            ("call_1", "echo", r#"{"text": "one"}"#),
            ("call_2", "ecko", "{}"),
        ])]]);
        let error = resolver(service.clone(), counter.clone())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();

        assert!(error.is_unknown_tool());
        assert!(error.to_string().contains("did you mean 'echo'"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn duplicate_call_ids_execute_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let service = ScriptedService::new(vec![
            vec![action(&[
                ("call_1", "echo", r#"{"text": "a"}"#),
                ("call_1", "echo", r#"{"text": "a"}"#),
            ])],
            vec![action(&[("call_1", "echo", r#"{"text": "a"}"#)])],
            vec![completed()],
        ]);
        let report = resolver(service.clone(), counter.clone())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(report.submissions, 2);
        let submissions = service.submissions();
        assert_eq!(submissions[0].len(), 1);
        assert_eq!(submissions[1][0].output, "a");
    }

    #[tokio::test]
    async fn parallel_batches_keep_request_order() {
        let service = ScriptedService::new(vec![
            vec![action(&[
                ("call_1", "echo", r#"{"text": "first"}"#),
                ("call_2", "echo", r#"{"text": "second"}"#),
                ("call_3", "echo", r#"{"text": "third"}"#),
            ])],
            vec![completed()],
        ]);
        resolver(service.clone(), Arc::default())
            .with_config(RunConfig::default().with_parallel_tool_calls(true))
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap();

        let outputs: Vec<String> = service.submissions()[0]
            .iter()
            .map(|o| o.output.clone())
            .collect();
        assert_eq!(outputs, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn cancellation_fails_without_submitting() {
        let service = ScriptedService::new(vec![vec![Ok(RunEvent::RunCancelled {
            run_id: "run_1".into(),
        })]]);
        let error = resolver(service.clone(), Arc::default())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(error.is_cancelled());
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn stream_ending_early_is_an_error() {
        let service = ScriptedService::new(vec![vec![Ok(RunEvent::RunStatus {
            run_id: "run_1".into(),
            thread_id: "thread_1".into(),
            status: "queued".into(),
        })]]);
        let error = resolver(service, Arc::default())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(
            error.kind(),
            crate::run::RunErrorKind::StreamClosed { run_id: Some(id) } if id == "run_1"
        ));
    }

    #[tokio::test]
    async fn continuation_limit_is_enforced() {
        let service = ScriptedService::new(vec![
            vec![action(&[("call_1", "echo", r#"{"text": "a"}"#)])],
            vec![action(&[("call_2", "echo", r#"{"text": "b"}"#)])],
            vec![completed()],
        ]);
        let counter = Arc::new(AtomicUsize::new(0));
        let error = resolver(service.clone(), counter.clone())
            .with_config(RunConfig::default().with_max_submissions(1))
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(
            error.kind(),
            crate::run::RunErrorKind::ContinuationLimit { limit: 1, .. }
        ));
        assert_eq!(service.submissions().len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn event_for_another_run_is_a_protocol_error() {
        let service = ScriptedService::new(vec![vec![
            Ok(RunEvent::RunStatus {
                run_id: "run_1".into(),
                thread_id: "thread_1".into(),
                status: "queued".into(),
            }),
            Ok(RunEvent::RunCompleted {
                run_id: "run_2".into(),
            }),
        ]]);
        let error = resolver(service.clone(), Arc::default())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(
            error.kind(),
            crate::run::RunErrorKind::Protocol { message }
                if message.contains("run_2") && message.contains("run_1")
        ));
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn action_for_another_thread_is_a_protocol_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let service = ScriptedService::new(vec![vec![action(&[(
            "call_1",
            "echo",
            r#"{"text": "a"}"#,
        )])]]);
        let error = resolver(service.clone(), counter.clone())
            .start("thread_9", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(
            error.kind(),
            crate::run::RunErrorKind::Protocol { message } if message.contains("thread_9")
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn upstream_error_surfaces() {
        let service = ScriptedService::new(vec![vec![Err(ServiceError::network("reset"))]]);
        let error = resolver(service, Arc::default())
            .start("thread_1", &RunRequest::new("asst_1"), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(error.is_upstream());
    }
}
