// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store engine: buckets of byte objects with lexicographic
//! listing, tagging, policies, and notification fan-out.

mod notify;

pub use notify::{match_event_glob, NotificationHandler, NotificationSub, ObjectEvent};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lws_config::BucketSpec;
use lws_core::{Clock, EngineError};
use md5::{Digest, Md5};
use parking_lot::RwLock;

const DEFAULT_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[]}"#;
const DEFAULT_NOTIFICATION_XML: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><NotificationConfiguration/>";

/// A stored object with its metadata.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub tags: HashMap<String, String>,
    pub etag: String,
    pub last_modified_ms: u64,
}

/// A listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: usize,
    pub etag: String,
    pub last_modified_ms: u64,
}

/// Arguments to a put operation.
#[derive(Debug, Clone, Default)]
pub struct PutObjectRequest {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub tags: HashMap<String, String>,
}

#[derive(Default)]
struct Bucket {
    objects: BTreeMap<String, StoredObject>,
    tags: HashMap<String, String>,
    policy: Option<String>,
    notification_xml: Option<String>,
    subscriptions: Vec<NotificationSub>,
    created_ms: u64,
}

pub struct ObjectStoreEngine<C: Clock> {
    clock: C,
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl<C: Clock> ObjectStoreEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, buckets: RwLock::new(HashMap::new()) }
    }

    pub fn from_config(specs: &[BucketSpec], clock: C) -> Self {
        let engine = Self::new(clock);
        for spec in specs {
            let _ = engine.create_bucket(&spec.name);
            if let Some(bucket) = engine.buckets.write().get_mut(&spec.name) {
                bucket.tags = spec.tags.clone();
            }
        }
        engine
    }

    // -- Bucket lifecycle ---------------------------------------------------

    pub fn create_bucket(&self, name: &str) -> Result<(), EngineError> {
        let mut buckets = self.buckets.write();
        if buckets.contains_key(name) {
            return Err(EngineError::already_exists("bucket", name));
        }
        buckets.insert(
            name.to_string(),
            Bucket { created_ms: self.clock.epoch_ms(), ..Bucket::default() },
        );
        Ok(())
    }

    /// Remove a bucket and everything in it.
    pub fn delete_bucket(&self, name: &str) -> Result<(), EngineError> {
        match self.buckets.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("bucket", name)),
        }
    }

    /// Creation time in epoch-ms, or NotFound.
    pub fn head_bucket(&self, name: &str) -> Result<u64, EngineError> {
        let buckets = self.buckets.read();
        let bucket = buckets.get(name).ok_or_else(|| EngineError::not_found("bucket", name))?;
        Ok(bucket.created_ms)
    }

    pub fn list_buckets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.read().keys().cloned().collect();
        names.sort();
        names
    }

    // -- Objects ------------------------------------------------------------

    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        request: PutObjectRequest,
    ) -> Result<String, EngineError> {
        let etag = format!("{:x}", Md5::digest(&request.body));
        let size = request.body.len();
        let subscriptions = {
            let mut buckets = self.buckets.write();
            let bucket_state =
                buckets.get_mut(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
            bucket_state.objects.insert(
                key.to_string(),
                StoredObject {
                    body: request.body,
                    content_type: request.content_type,
                    headers: request.headers,
                    tags: request.tags,
                    etag: etag.clone(),
                    last_modified_ms: self.clock.epoch_ms(),
                },
            );
            bucket_state.subscriptions.clone()
        };
        notify::dispatch(
            &subscriptions,
            ObjectEvent {
                event_type: "ObjectCreated:Put".to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                size,
                epoch_ms: self.clock.epoch_ms(),
            },
        );
        Ok(etag)
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, EngineError> {
        let buckets = self.buckets.read();
        let bucket_state =
            buckets.get(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
        bucket_state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found("object", key))
    }

    /// Metadata only; same lookup semantics as get.
    pub fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectSummary, EngineError> {
        let object = self.get_object(bucket, key)?;
        Ok(ObjectSummary {
            key: key.to_string(),
            size: object.body.len(),
            etag: object.etag,
            last_modified_ms: object.last_modified_ms,
        })
    }

    /// Delete is idempotent; the removal event fires only when the
    /// object existed.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<(), EngineError> {
        let (existed, subscriptions) = {
            let mut buckets = self.buckets.write();
            let bucket_state =
                buckets.get_mut(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
            (bucket_state.objects.remove(key).is_some(), bucket_state.subscriptions.clone())
        };
        if existed {
            notify::dispatch(
                &subscriptions,
                ObjectEvent {
                    event_type: "ObjectRemoved:Delete".to_string(),
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    size: 0,
                    epoch_ms: self.clock.epoch_ms(),
                },
            );
        }
        Ok(())
    }

    pub fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<String, EngineError> {
        let source = self.get_object(source_bucket, source_key)?;
        let etag = source.etag.clone();
        let size = source.body.len();
        let subscriptions = {
            let mut buckets = self.buckets.write();
            let bucket_state = buckets
                .get_mut(dest_bucket)
                .ok_or_else(|| EngineError::not_found("bucket", dest_bucket))?;
            bucket_state.objects.insert(
                dest_key.to_string(),
                StoredObject { last_modified_ms: self.clock.epoch_ms(), ..source },
            );
            bucket_state.subscriptions.clone()
        };
        notify::dispatch(
            &subscriptions,
            ObjectEvent {
                event_type: "ObjectCreated:Copy".to_string(),
                bucket: dest_bucket.to_string(),
                key: dest_key.to_string(),
                size,
                epoch_ms: self.clock.epoch_ms(),
            },
        );
        Ok(etag)
    }

    /// Lexicographically ordered listing, optionally under a prefix.
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectSummary>, EngineError> {
        let buckets = self.buckets.read();
        let bucket_state =
            buckets.get(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
        Ok(bucket_state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len(),
                etag: object.etag.clone(),
                last_modified_ms: object.last_modified_ms,
            })
            .collect())
    }

    // -- Bucket metadata ----------------------------------------------------

    pub fn put_bucket_tagging(
        &self,
        bucket: &str,
        tags: HashMap<String, String>,
    ) -> Result<(), EngineError> {
        self.with_bucket_mut(bucket, |state| state.tags = tags)
    }

    pub fn get_bucket_tagging(&self, bucket: &str) -> Result<HashMap<String, String>, EngineError> {
        let buckets = self.buckets.read();
        let bucket_state =
            buckets.get(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
        Ok(bucket_state.tags.clone())
    }

    pub fn delete_bucket_tagging(&self, bucket: &str) -> Result<(), EngineError> {
        self.with_bucket_mut(bucket, |state| state.tags.clear())
    }

    pub fn put_bucket_policy(&self, bucket: &str, policy: String) -> Result<(), EngineError> {
        self.with_bucket_mut(bucket, |state| state.policy = Some(policy))
    }

    pub fn get_bucket_policy(&self, bucket: &str) -> Result<String, EngineError> {
        let buckets = self.buckets.read();
        let bucket_state =
            buckets.get(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
        Ok(bucket_state.policy.clone().unwrap_or_else(|| DEFAULT_POLICY.to_string()))
    }

    pub fn put_notification_configuration(
        &self,
        bucket: &str,
        config_xml: String,
    ) -> Result<(), EngineError> {
        self.with_bucket_mut(bucket, |state| state.notification_xml = Some(config_xml))
    }

    pub fn get_notification_configuration(&self, bucket: &str) -> Result<String, EngineError> {
        let buckets = self.buckets.read();
        let bucket_state =
            buckets.get(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
        Ok(bucket_state
            .notification_xml
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTIFICATION_XML.to_string()))
    }

    // -- Notifications ------------------------------------------------------

    /// Register a notification handler for events on a bucket.
    pub fn register_notification(
        &self,
        bucket: &str,
        event_glob: &str,
        prefix: &str,
        suffix: &str,
        handler: NotificationHandler,
    ) -> Result<(), EngineError> {
        self.with_bucket_mut(bucket, |state| {
            state.subscriptions.push(NotificationSub {
                event_glob: event_glob.to_string(),
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                handler,
            })
        })
    }

    fn with_bucket_mut(
        &self,
        bucket: &str,
        mutate: impl FnOnce(&mut Bucket),
    ) -> Result<(), EngineError> {
        let mut buckets = self.buckets.write();
        let bucket_state =
            buckets.get_mut(bucket).ok_or_else(|| EngineError::not_found("bucket", bucket))?;
        mutate(bucket_state);
        Ok(())
    }
}

// Subscriptions clone into dispatch; the handler is shared.
impl Clone for NotificationSub {
    fn clone(&self) -> Self {
        Self {
            event_glob: self.event_glob.clone(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
