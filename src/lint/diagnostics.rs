//! Collection and post-processing of diagnostics.

use std::sync::{Mutex, PoisonError};

use super::message::{format_path, Message, Severity};

/// Thread-safe sink that concurrent checks push diagnostics into.
///
/// Push order carries no meaning; [`Diagnostics::finalize`] makes the
/// output deterministic.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Mutex<Vec<Message>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn push(&self, message: Message) {
        tracing::trace!(code = %message.code, path = ?message.path, "diagnostic");
        // A panicking check must not take the collected diagnostics with it.
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Promotes, filters and sorts everything collected so far.
    pub fn finalize(self, level: Severity, strict: bool) -> Vec<Message> {
        let mut messages = self
            .messages
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        if strict {
            promote_warnings(&mut messages);
        }
        let mut messages = filter_by_level(messages, level);
        sort_messages(&mut messages);
        messages
    }
}

/// Turns every warning into an error.
pub fn promote_warnings(messages: &mut [Message]) {
    for msg in messages.iter_mut() {
        if msg.severity == Severity::Warning {
            msg.severity = Severity::Error;
        }
    }
}

/// Keeps diagnostics at least as severe as `level`.
pub fn filter_by_level(messages: Vec<Message>, level: Severity) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|msg| msg.severity >= level)
        .collect()
}

/// Sorts diagnostics about the manifest itself first, then by formatted
/// path. Structural duplicates are dropped.
pub fn sort_messages(messages: &mut Vec<Message>) {
    messages.sort_by_cached_key(|msg| {
        (
            !is_package_level(msg),
            format_path(&msg.path),
            msg.code,
            msg.severity,
            msg.args.clone(),
        )
    });
    messages.dedup();
}

fn is_package_level(msg: &Message) -> bool {
    msg.path.len() <= 1
}
