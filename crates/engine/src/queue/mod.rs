// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue engine: owns every queue and routes dead-letter redrives.
//!
//! Dead-letter targets are stored by name and resolved against the
//! live queue map on every receive, so re-creating a target queue
//! re-links the chain without touching the source.

mod queue;

pub use queue::{Message, Queue, QueueCounts, ReceivedMessage, DEDUP_WINDOW};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lws_config::QueueSpec;
use lws_core::{arn, Clock, EngineError, MessageAttr};
use md5::{Digest, Md5};
use parking_lot::RwLock;

/// Arguments to a send operation.
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub body: String,
    pub attributes: HashMap<String, MessageAttr>,
    pub delay: Duration,
    pub group_id: Option<String>,
    pub dedup_id: Option<String>,
}

/// What a send reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub message_id: String,
    pub md5_of_body: String,
}

/// A queue's reported attributes.
#[derive(Debug, Clone)]
pub struct QueueAttributes {
    pub name: String,
    pub arn: String,
    pub counts: QueueCounts,
    pub visibility_timeout: Duration,
    pub fifo: bool,
    pub max_receive_count: u32,
    pub dlq_target: Option<String>,
}

pub struct QueueEngine<C: Clock> {
    clock: C,
    queues: RwLock<HashMap<String, Arc<Queue<C>>>>,
}

impl<C: Clock> QueueEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, queues: RwLock::new(HashMap::new()) }
    }

    /// Build the engine with every configured queue created.
    pub fn from_config(specs: &[QueueSpec], clock: C) -> Self {
        let engine = Self::new(clock);
        for spec in specs {
            // Config is validated before engines start; a duplicate
            // here would already have been rejected.
            let _ = engine.create(spec.clone());
        }
        engine
    }

    pub fn create(&self, spec: QueueSpec) -> Result<String, EngineError> {
        if spec.fifo != spec.name.ends_with(".fifo") {
            return Err(EngineError::validation(
                "FIFO queues must end in '.fifo' and only FIFO queues may",
            ));
        }
        let mut queues = self.queues.write();
        if queues.contains_key(&spec.name) {
            return Err(EngineError::already_exists("queue", spec.name));
        }
        let (max_receive_count, dlq_target) = match &spec.redrive {
            Some(redrive) => (redrive.max_receive_count, Some(redrive.target.clone())),
            None => (0, None),
        };
        let queue = Queue::new(
            spec.name.clone(),
            Duration::from_secs(spec.visibility_timeout_secs),
            spec.fifo,
            spec.content_based_dedup,
            max_receive_count,
            dlq_target,
            spec.tags,
            self.clock.clone(),
        );
        queues.insert(spec.name.clone(), Arc::new(queue));
        Ok(spec.name)
    }

    /// Remove a queue. In-flight messages are dropped with it.
    pub fn destroy(&self, name: &str) -> Result<(), EngineError> {
        match self.queues.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("queue", name)),
        }
    }

    pub fn purge(&self, name: &str) -> Result<(), EngineError> {
        self.get(name)?.purge();
        Ok(())
    }

    pub fn attributes(&self, name: &str) -> Result<QueueAttributes, EngineError> {
        let queue = self.get(name)?;
        Ok(QueueAttributes {
            name: queue.name().to_string(),
            arn: arn::queue(queue.name()),
            counts: queue.counts(),
            visibility_timeout: queue.visibility_timeout(),
            fifo: queue.is_fifo(),
            max_receive_count: queue.max_receive_count(),
            dlq_target: queue.dlq_target().map(str::to_string),
        })
    }

    pub fn list(&self, prefix: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = self
            .queues
            .read()
            .keys()
            .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn exists(&self, name: &str) -> bool {
        self.queues.read().contains_key(name)
    }

    pub fn send(&self, name: &str, request: SendRequest) -> Result<SendOutcome, EngineError> {
        let queue = self.get(name)?;
        if queue.is_fifo() && request.group_id.is_none() {
            return Err(EngineError::validation(
                "MessageGroupId is required for FIFO queues",
            ));
        }
        let md5_of_body = format!("{:x}", Md5::digest(request.body.as_bytes()));
        let message_id = queue.send(
            request.body,
            request.attributes,
            request.delay,
            request.group_id,
            request.dedup_id,
        );
        Ok(SendOutcome { message_id, md5_of_body })
    }

    pub async fn receive(
        &self,
        name: &str,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, EngineError> {
        let queue = self.get(name)?;
        let dlq = queue.dlq_target().and_then(|target| self.queues.read().get(target).cloned());
        Ok(queue.receive(max.max(1), wait, dlq.as_deref()).await)
    }

    pub fn delete(&self, name: &str, receipt_handle: &str) -> Result<(), EngineError> {
        self.get(name)?.delete(receipt_handle);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Arc<Queue<C>>, EngineError> {
        self.queues
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found("queue", name))
    }
}
