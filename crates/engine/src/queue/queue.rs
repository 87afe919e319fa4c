// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single in-memory queue.
//!
//! All state lives behind one mutex; every mutating step holds it.
//! Long polling parks on a `Notify` that `send` fires, with the waiter
//! enabled before the state lock is released so a send between walk
//! and wait cannot be missed.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use lws_core::{Clock, MessageAttr};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::sync::Notify;
use uuid::Uuid;

/// How long a FIFO dedup-id suppresses duplicate sends.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(300);

/// A message owned by a queue.
#[derive(Debug, Clone)]
pub struct Message {
    pub message_id: String,
    pub body: String,
    pub attributes: HashMap<String, MessageAttr>,
    pub receipt_handle: Option<String>,
    pub receive_count: u32,
    pub sent_epoch_ms: u64,
    pub group_id: Option<String>,
    pub dedup_id: Option<String>,
    /// Invisible until this instant; `None` means visible now.
    pub(crate) visible_at: Option<Instant>,
}

/// What a receive hands back to the caller.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    pub attributes: HashMap<String, MessageAttr>,
    pub receive_count: u32,
    pub sent_epoch_ms: u64,
}

#[derive(Debug, Clone)]
struct DedupEntry {
    expires_at: Instant,
    message_id: String,
}

#[derive(Default)]
struct QueueState {
    messages: Vec<Message>,
    dedup: HashMap<String, DedupEntry>,
}

/// One queue: attributes, message vector, wake primitive.
pub struct Queue<C: Clock> {
    name: String,
    visibility_timeout: Duration,
    fifo: bool,
    content_dedup: bool,
    max_receive_count: u32,
    dlq_target: Option<String>,
    tags: HashMap<String, String>,
    clock: C,
    state: Mutex<QueueState>,
    notify: Notify,
}

/// Visible / in-flight / delayed message counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueCounts {
    pub visible: usize,
    pub in_flight: usize,
    pub delayed: usize,
}

impl<C: Clock> Queue<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        visibility_timeout: Duration,
        fifo: bool,
        content_dedup: bool,
        max_receive_count: u32,
        dlq_target: Option<String>,
        tags: HashMap<String, String>,
        clock: C,
    ) -> Self {
        Self {
            name,
            visibility_timeout,
            fifo,
            content_dedup,
            max_receive_count,
            dlq_target,
            tags,
            clock,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fifo(&self) -> bool {
        self.fifo
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    pub fn dlq_target(&self) -> Option<&str> {
        self.dlq_target.as_deref()
    }

    pub fn max_receive_count(&self) -> u32 {
        self.max_receive_count
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// Enqueue a message and return its message id. A FIFO duplicate
    /// inside the dedup window returns the previously recorded id
    /// without appending.
    pub fn send(
        &self,
        body: String,
        attributes: HashMap<String, MessageAttr>,
        delay: Duration,
        group_id: Option<String>,
        dedup_id: Option<String>,
    ) -> String {
        let mut state = self.state.lock();
        let now = self.clock.now();

        let dedup_id = self.resolve_dedup_id(&body, dedup_id);
        if let Some(id) = &dedup_id {
            if let Some(entry) = state.dedup.get(id) {
                if now < entry.expires_at {
                    return entry.message_id.clone();
                }
            }
        }

        let message_id = Uuid::new_v4().to_string();
        let message = Message {
            message_id: message_id.clone(),
            body,
            attributes,
            receipt_handle: None,
            receive_count: 0,
            sent_epoch_ms: self.clock.epoch_ms(),
            group_id,
            dedup_id: dedup_id.clone(),
            visible_at: (!delay.is_zero()).then(|| now + delay),
        };
        state.messages.push(message);

        if let Some(id) = dedup_id {
            state.dedup.insert(
                id,
                DedupEntry { expires_at: now + DEDUP_WINDOW, message_id: message_id.clone() },
            );
        }

        self.notify.notify_waiters();
        message_id
    }

    /// Receive up to `max` visible messages, long-polling for up to
    /// `wait`. A zero wait does one walk and returns immediately.
    /// Messages past the receive threshold move to `dlq` instead of
    /// being returned.
    pub async fn receive(
        &self,
        max: usize,
        wait: Duration,
        dlq: Option<&Queue<C>>,
    ) -> Vec<ReceivedMessage> {
        let deadline = (!wait.is_zero()).then(|| self.clock.now() + wait);

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            {
                let mut state = self.state.lock();
                self.purge_dedup(&mut state);
                let messages = self.collect_visible(&mut state, max, dlq);
                if !messages.is_empty() {
                    return messages;
                }
                // Register before releasing the lock so a concurrent
                // send cannot slip between walk and wait.
                notified.as_mut().enable();
            }

            let Some(deadline) = deadline else {
                return Vec::new();
            };
            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining.is_zero() {
                return Vec::new();
            }
            if tokio::time::timeout(remaining, notified).await.is_err() {
                // Final walk after the wait expires.
                let mut state = self.state.lock();
                return self.collect_visible(&mut state, max, dlq);
            }
        }
    }

    /// Remove the message carrying this receipt handle. A mismatch is
    /// a silent no-op, as on the real cloud.
    pub fn delete(&self, receipt_handle: &str) {
        let mut state = self.state.lock();
        state.messages.retain(|m| m.receipt_handle.as_deref() != Some(receipt_handle));
    }

    /// Drop every message and dedup entry.
    pub fn purge(&self) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.dedup.clear();
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.state.lock();
        let now = self.clock.now();
        let mut counts = QueueCounts { visible: 0, in_flight: 0, delayed: 0 };
        for message in &state.messages {
            let invisible = message.visible_at.is_some_and(|at| at > now);
            if !invisible {
                counts.visible += 1;
            } else if message.receipt_handle.is_some() {
                counts.in_flight += 1;
            } else {
                counts.delayed += 1;
            }
        }
        counts
    }

    // -- internals (called under the state lock) ------------------------

    fn collect_visible(
        &self,
        state: &mut QueueState,
        max: usize,
        dlq: Option<&Queue<C>>,
    ) -> Vec<ReceivedMessage> {
        let now = self.clock.now();
        let blocked = self.blocked_groups(state, now);
        let mut result = Vec::new();
        let mut to_dlq = Vec::new();

        for message in &mut state.messages {
            if result.len() >= max {
                break;
            }
            if message.visible_at.is_some_and(|at| at > now) {
                continue;
            }
            if self.fifo {
                if let Some(group) = &message.group_id {
                    if blocked.contains(group.as_str()) {
                        continue;
                    }
                }
            }
            if self.routes_to_dlq(message) && dlq.is_some() {
                to_dlq.push(message.message_id.clone());
                continue;
            }
            message.receive_count += 1;
            let receipt = Uuid::new_v4().to_string();
            message.receipt_handle = Some(receipt.clone());
            message.visible_at = Some(now + self.visibility_timeout);
            result.push(ReceivedMessage {
                message_id: message.message_id.clone(),
                receipt_handle: receipt,
                body: message.body.clone(),
                attributes: message.attributes.clone(),
                receive_count: message.receive_count,
                sent_epoch_ms: message.sent_epoch_ms,
            });
        }

        if let Some(dlq) = dlq {
            for id in to_dlq {
                if let Some(pos) = state.messages.iter().position(|m| m.message_id == id) {
                    let mut message = state.messages.remove(pos);
                    message.visible_at = None;
                    message.receipt_handle = None;
                    dlq.accept_redriven(message);
                }
            }
        }

        result
    }

    /// Groups with any in-flight message at the start of the walk.
    fn blocked_groups(&self, state: &QueueState, now: Instant) -> HashSet<String> {
        let mut groups = HashSet::new();
        if self.fifo {
            for message in &state.messages {
                if let Some(group) = &message.group_id {
                    if message.visible_at.is_some_and(|at| at > now) {
                        groups.insert(group.clone());
                    }
                }
            }
        }
        groups
    }

    fn routes_to_dlq(&self, message: &Message) -> bool {
        self.dlq_target.is_some()
            && self.max_receive_count > 0
            && message.receive_count >= self.max_receive_count
    }

    /// Append a message redriven from a source queue. Acquired under
    /// the source queue's lock; redrive chains are acyclic by
    /// configuration, so the two locks never invert.
    fn accept_redriven(&self, message: Message) {
        let mut state = self.state.lock();
        state.messages.push(message);
        self.notify.notify_waiters();
    }

    fn resolve_dedup_id(&self, body: &str, explicit: Option<String>) -> Option<String> {
        if !self.fifo {
            return None;
        }
        if explicit.is_some() {
            return explicit;
        }
        if self.content_dedup {
            let digest = Sha256::digest(body.as_bytes());
            return Some(format!("{digest:x}"));
        }
        None
    }

    fn purge_dedup(&self, state: &mut QueueState) {
        let now = self.clock.now();
        state.dedup.retain(|_, entry| entry.expires_at > now);
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
