//! Run observers.
//!
//! The resolver reports what it sees through the [`RunObserver`] trait.
//! Every method has a no-op default, so an observer only implements the
//! callbacks it cares about.
//!
//! # Example
//!
//! ```rust
//! use tool_relay::run::RunObserver;
//!
//! #[derive(Default)]
//! struct Printer {
//!     chars: usize,
//! }
//!
//! impl RunObserver for Printer {
//!     fn on_text(&mut self, _message_id: &str, text: &str) {
//!         self.chars += text.len();
//!         print!("{}", text);
//!     }
//! }
//! ```

use crate::conversation::RunEvent;
use crate::tools::ToolCallResult;

/// Callbacks invoked while a run is resolved.
pub trait RunObserver: Send {
    /// Called for every event except `RequiresAction`.
    fn on_event(&mut self, event: &RunEvent) {
        if let RunEvent::MessageDelta { message_id, text } = event {
            self.on_text(message_id, text);
        }
    }

    /// Called for each streamed chunk of assistant text.
    fn on_text(&mut self, _message_id: &str, _text: &str) {}

    /// Called after a batch of outputs was accepted by the service.
    fn on_tool_results(&mut self, _run_id: &str, _results: &[ToolCallResult]) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Collects completed assistant messages in arrival order.
#[derive(Debug, Clone, Default)]
pub struct MessageCollector {
    messages: Vec<String>,
    partial: String,
}

impl MessageCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the completed messages.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Returns the text streamed since the last completed message.
    #[must_use]
    pub fn partial(&self) -> &str {
        &self.partial
    }
}

impl RunObserver for MessageCollector {
    fn on_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::MessageDelta { text, .. } => self.partial.push_str(text),
            RunEvent::MessageCompleted { text, .. } => {
                self.partial.clear();
                self.messages.push(text.clone());
            }
            _ => {}
        }
    }
}

/// Adapts a closure into an observer of every event.
pub struct FnObserver<F>(F);

impl<F> std::fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnObserver").finish_non_exhaustive()
    }
}

impl<F> RunObserver for FnObserver<F>
where
    F: FnMut(&RunEvent) + Send,
{
    fn on_event(&mut self, event: &RunEvent) {
        (self.0)(event);
    }
}

/// Wraps a closure as a [`RunObserver`].
#[must_use]
pub fn observer_fn<F>(f: F) -> FnObserver<F>
where
    F: FnMut(&RunEvent) + Send,
{
    FnObserver(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TextOnly(String);

    impl RunObserver for TextOnly {
        fn on_text(&mut self, _message_id: &str, text: &str) {
            self.0.push_str(text);
        }
    }

    #[test]
    fn default_on_event_routes_deltas_to_on_text() {
        let mut observer = TextOnly::default();
        observer.on_event(&RunEvent::MessageDelta {
            message_id: "m".into(),
            text: "Hel".into(),
        });
        observer.on_event(&RunEvent::RunCompleted { run_id: "r".into() });
        observer.on_event(&RunEvent::MessageDelta {
            message_id: "m".into(),
            text: "lo".into(),
        });
        assert_eq!(observer.0, "Hello");
    }

    #[test]
    fn collector_tracks_completed_messages() {
        let mut collector = MessageCollector::new();
        collector.on_event(&RunEvent::MessageDelta {
            message_id: "m".into(),
            text: "partial".into(),
        });
        assert_eq!(collector.partial(), "partial");
        collector.on_event(&RunEvent::MessageCompleted {
            message_id: "m".into(),
            text: "done".into(),
        });
        assert_eq!(collector.messages(), ["done".to_string()]);
        assert!(collector.partial().is_empty());
    }

    #[test]
    fn closure_observer_sees_events() {
        let mut seen = Vec::new();
        {
            let mut observer = observer_fn(|event: &RunEvent| seen.push(event.clone()));
            observer.on_event(&RunEvent::Other { event: "x".into() });
        }
        assert_eq!(seen.len(), 1);
    }
}
