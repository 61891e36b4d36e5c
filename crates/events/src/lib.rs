#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in slipway
//!
//! All user-facing progress goes through events - the phases emit, the CLI
//! renders. Nothing below the CLI prints directly, so operations stay
//! testable and output stays coherent when phases run concurrently.

pub mod events;
pub use events::{AppEvent, BuildEvent, DistEvent, GeneralEvent, PublishEvent};

use tokio::sync::mpsc::UnboundedSender;

/// Sender half of the application event channel
pub type EventSender = UnboundedSender<AppEvent>;

/// Receiver half of the application event channel
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Unified trait for emitting events
///
/// Implemented by anything that holds an `EventSender`, so phases can emit
/// without caring whether a channel is attached at all.
pub trait EventEmitter {
    /// Event sender for this emitter, if one is attached
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event; silently dropped when no receiver is attached
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if the receiver is gone the run is ending
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }
}

/// `EventSender` is itself an emitter, so raw senders can be passed where an
/// `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
