// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration document model.
//!
//! Field defaults mirror the original loader's: a service left out of
//! the document is enabled on its default port with no declared
//! resources.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default port per service, used when the document names a service
/// without a port (or not at all).
pub fn default_port(service: &str) -> u16 {
    match service {
        "sqs" => 4576,
        "sns" => 4575,
        "dynamodb" => 4569,
        "s3" => 4572,
        "events" => 4587,
        "stepfunctions" => 4585,
        "cognito-idp" => 4590,
        "ssm" => 4583,
        "secretsmanager" => 4584,
        "sts" => 4592,
        _ => 0,
    }
}

/// All services the emulator can expose, in supervisor start order.
pub const SERVICES: &[&str] = &[
    "sqs",
    "sns",
    "dynamodb",
    "s3",
    "events",
    "stepfunctions",
    "cognito-idp",
    "ssm",
    "secretsmanager",
    "sts",
];

/// The resolved configuration fed to the emulator at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmulatorConfig {
    #[serde(default)]
    pub global: GlobalOptions,

    /// Per-service enablement and port overrides, keyed by service name.
    #[serde(default)]
    pub services: HashMap<String, ServiceSettings>,

    #[serde(default)]
    pub queues: Vec<QueueSpec>,
    #[serde(default)]
    pub tables: Vec<TableSpec>,
    #[serde(default)]
    pub buckets: Vec<BucketSpec>,
    #[serde(default)]
    pub topics: Vec<TopicSpec>,
    #[serde(default)]
    pub buses: Vec<BusSpec>,
    #[serde(default)]
    pub state_machines: Vec<StateMachineSpec>,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    #[serde(default)]
    pub event_source_mappings: Vec<EventSourceMappingSpec>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub secrets: Vec<SecretSpec>,
    #[serde(default)]
    pub identity: IdentitySpec,
}

impl EmulatorConfig {
    /// Effective (enabled, port) for a service.
    pub fn service(&self, name: &str) -> ServiceSettings {
        match self.services.get(name) {
            Some(s) => ServiceSettings {
                enabled: s.enabled,
                port: if s.port == 0 { default_port(name) } else { s.port },
            },
            None => ServiceSettings { enabled: true, port: default_port(name) },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 0 means "use the service default".
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalOptions {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Artificial delay applied to read-after-write visibility, ms.
    #[serde(default)]
    pub consistency_delay_ms: u64,
    /// Strict mode rejects requests the real cloud would reject but a
    /// lenient emulator could absorb.
    #[serde(default)]
    pub strict: bool,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self { log_level: default_log_level(), consistency_delay_ms: 0, strict: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSpec {
    pub name: String,
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
    #[serde(default)]
    pub fifo: bool,
    #[serde(default)]
    pub content_based_dedup: bool,
    #[serde(default)]
    pub redrive: Option<RedrivePolicySpec>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

fn default_visibility_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedrivePolicySpec {
    pub target: String,
    #[serde(default = "default_max_receive_count")]
    pub max_receive_count: u32,
}

fn default_max_receive_count() -> u32 {
    5
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    pub name: String,
    pub partition_key: KeyAttributeSpec,
    #[serde(default)]
    pub sort_key: Option<KeyAttributeSpec>,
    #[serde(default)]
    pub indexes: Vec<TableIndexSpec>,
    /// Presence enables the change stream.
    #[serde(default)]
    pub stream_view: Option<StreamView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyAttributeSpec {
    pub name: String,
    /// "S" or "N"
    #[serde(default = "default_key_type")]
    pub attr_type: String,
}

fn default_key_type() -> String {
    "S".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableIndexSpec {
    pub name: String,
    pub partition_key: KeyAttributeSpec,
    #[serde(default)]
    pub sort_key: Option<KeyAttributeSpec>,
}

/// What a change record carries for each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamView {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOld,
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketSpec {
    pub name: String,
    #[serde(default)]
    pub notifications: Vec<BucketNotificationSpec>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketNotificationSpec {
    /// Event glob, e.g. `ObjectCreated:*`.
    #[serde(default = "default_event_glob")]
    pub events: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    pub function: String,
}

fn default_event_glob() -> String {
    "ObjectCreated:*".to_string()
}

// ---------------------------------------------------------------------------
// Topics and buses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicSpec {
    pub name: String,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionSpec {
    /// "queue" or "compute"
    pub protocol: String,
    pub endpoint: String,
    #[serde(default)]
    pub filter_policy: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusSpec {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub pattern: Option<serde_json::Value>,
    /// `rate(N unit)` or `cron(...)`.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Compute function names, dispatched in declaration order.
    #[serde(default)]
    pub targets: Vec<String>,
}

// ---------------------------------------------------------------------------
// State machines and functions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    #[default]
    Standard,
    Express,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateMachineSpec {
    pub name: String,
    #[serde(default)]
    pub workflow_type: WorkflowType,
    /// The state-language definition document.
    pub definition: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default = "default_handler")]
    pub handler: String,
    #[serde(default = "default_function_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_runtime() -> String {
    "nodejs20.x".to_string()
}

fn default_handler() -> String {
    "index.handler".to_string()
}

fn default_function_timeout() -> u64 {
    30
}

fn default_memory_mb() -> u32 {
    128
}

// ---------------------------------------------------------------------------
// Event-source mappings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventSourceKind {
    Queue,
    TableStream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSourceMappingSpec {
    pub kind: EventSourceKind,
    /// Queue name or table name, depending on `kind`.
    pub source: String,
    pub function: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_batch_size() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Parameters and secrets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretSpec {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySpec {
    /// "disabled", "audit", or "enforce".
    #[serde(default = "default_identity_mode")]
    pub mode: String,
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    #[serde(default = "default_identity_name")]
    pub default_identity: String,
    #[serde(default = "default_user_pool_id")]
    pub user_pool_id: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Per-service mode overrides.
    #[serde(default)]
    pub services: HashMap<String, String>,
    #[serde(default)]
    pub identities: Vec<IdentityUserSpec>,
    /// Resource policies keyed by service name.
    #[serde(default)]
    pub resource_policies: HashMap<String, serde_json::Value>,
}

impl Default for IdentitySpec {
    fn default() -> Self {
        Self {
            mode: default_identity_mode(),
            identity_header: default_identity_header(),
            default_identity: default_identity_name(),
            user_pool_id: default_user_pool_id(),
            client_id: default_client_id(),
            services: HashMap::new(),
            identities: Vec::new(),
            resource_policies: HashMap::new(),
        }
    }
}

fn default_identity_mode() -> String {
    "disabled".to_string()
}

fn default_identity_header() -> String {
    "X-Lws-Identity".to_string()
}

fn default_identity_name() -> String {
    "admin-user".to_string()
}

fn default_user_pool_id() -> String {
    "local_pool".to_string()
}

fn default_client_id() -> String {
    "local_client".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityUserSpec {
    pub name: String,
    /// Inline policy documents.
    #[serde(default)]
    pub policies: Vec<serde_json::Value>,
    /// Optional permissions boundary.
    #[serde(default)]
    pub boundary: Option<serde_json::Value>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
