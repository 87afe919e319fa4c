// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration validation.
//!
//! Runs once, before any engine starts. Rejections here are cheaper
//! and clearer than the runtime faults they prevent, most notably a
//! dead-letter chain that routes back into itself.

use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;
use crate::model::{EmulatorConfig, EventSourceKind};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_IDENTITY_MODES: &[&str] = &["disabled", "audit", "enforce"];

pub fn validate(config: &EmulatorConfig) -> Result<(), ConfigError> {
    validate_global(config)?;
    validate_ports(config)?;
    validate_queues(config)?;
    validate_unique_names(config)?;
    validate_references(config)?;
    validate_identity(config)?;
    Ok(())
}

fn validate_global(config: &EmulatorConfig) -> Result<(), ConfigError> {
    let level = config.global.log_level.as_str();
    if !VALID_LOG_LEVELS.contains(&level) {
        return Err(ConfigError::invalid(
            "global.log_level",
            format!("'{level}' is not one of {}", VALID_LOG_LEVELS.join(", ")),
        ));
    }
    Ok(())
}

fn validate_ports(config: &EmulatorConfig) -> Result<(), ConfigError> {
    let mut seen: HashMap<u16, String> = HashMap::new();
    for name in crate::model::SERVICES {
        let settings = config.service(name);
        if !settings.enabled {
            continue;
        }
        if settings.port < 1024 {
            return Err(ConfigError::invalid(
                format!("services.{name}.port"),
                format!("port {} is below 1024", settings.port),
            ));
        }
        if let Some(other) = seen.insert(settings.port, name.to_string()) {
            return Err(ConfigError::invalid(
                format!("services.{name}.port"),
                format!("port {} already used by {other}", settings.port),
            ));
        }
    }
    Ok(())
}

fn validate_queues(config: &EmulatorConfig) -> Result<(), ConfigError> {
    for queue in &config.queues {
        if queue.fifo != queue.name.ends_with(".fifo") {
            return Err(ConfigError::invalid(
                format!("queues.{}", queue.name),
                "FIFO queues must end in '.fifo' and only FIFO queues may",
            ));
        }
        if queue.content_based_dedup && !queue.fifo {
            return Err(ConfigError::invalid(
                format!("queues.{}", queue.name),
                "content_based_dedup requires fifo = true",
            ));
        }
    }
    validate_redrive_chains(config)
}

/// Walk each queue's dead-letter chain; a revisit is a cycle.
fn validate_redrive_chains(config: &EmulatorConfig) -> Result<(), ConfigError> {
    let targets: HashMap<&str, &str> = config
        .queues
        .iter()
        .filter_map(|q| q.redrive.as_ref().map(|r| (q.name.as_str(), r.target.as_str())))
        .collect();

    for queue in &config.queues {
        let Some(redrive) = &queue.redrive else { continue };
        if !config.queues.iter().any(|q| q.name == redrive.target) {
            return Err(ConfigError::UnknownReference {
                location: format!("queues.{}.redrive", queue.name),
                resource: "queue",
                name: redrive.target.clone(),
            });
        }
        let mut visited = HashSet::new();
        let mut current = queue.name.as_str();
        while let Some(next) = targets.get(current) {
            if !visited.insert(current) {
                return Err(ConfigError::RedriveCycle(queue.name.clone()));
            }
            current = next;
        }
        if visited.contains(current) {
            return Err(ConfigError::RedriveCycle(queue.name.clone()));
        }
    }
    Ok(())
}

fn validate_unique_names(config: &EmulatorConfig) -> Result<(), ConfigError> {
    check_unique("queue", config.queues.iter().map(|q| q.name.as_str()))?;
    check_unique("table", config.tables.iter().map(|t| t.name.as_str()))?;
    check_unique("bucket", config.buckets.iter().map(|b| b.name.as_str()))?;
    check_unique("topic", config.topics.iter().map(|t| t.name.as_str()))?;
    check_unique("bus", config.buses.iter().map(|b| b.name.as_str()))?;
    check_unique("state machine", config.state_machines.iter().map(|m| m.name.as_str()))?;
    check_unique("function", config.functions.iter().map(|f| f.name.as_str()))?;
    check_unique("parameter", config.parameters.iter().map(|p| p.name.as_str()))?;
    check_unique("secret", config.secrets.iter().map(|s| s.name.as_str()))?;
    Ok(())
}

fn check_unique<'a>(
    resource: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate { resource, name: name.to_string() });
        }
    }
    Ok(())
}

fn validate_references(config: &EmulatorConfig) -> Result<(), ConfigError> {
    let functions: HashSet<&str> = config.functions.iter().map(|f| f.name.as_str()).collect();
    let queues: HashSet<&str> = config.queues.iter().map(|q| q.name.as_str()).collect();
    let tables: HashSet<&str> = config.tables.iter().map(|t| t.name.as_str()).collect();

    for mapping in &config.event_source_mappings {
        let location = format!("event_source_mappings ({} -> {})", mapping.source, mapping.function);
        if !functions.contains(mapping.function.as_str()) {
            return Err(ConfigError::UnknownReference {
                location,
                resource: "function",
                name: mapping.function.clone(),
            });
        }
        match mapping.kind {
            EventSourceKind::Queue if !queues.contains(mapping.source.as_str()) => {
                return Err(ConfigError::UnknownReference {
                    location,
                    resource: "queue",
                    name: mapping.source.clone(),
                });
            }
            EventSourceKind::TableStream if !tables.contains(mapping.source.as_str()) => {
                return Err(ConfigError::UnknownReference {
                    location,
                    resource: "table",
                    name: mapping.source.clone(),
                });
            }
            _ => {}
        }
        if mapping.batch_size == 0 {
            return Err(ConfigError::invalid(location, "batch_size must be at least 1"));
        }
    }

    for bucket in &config.buckets {
        for notification in &bucket.notifications {
            if !functions.contains(notification.function.as_str()) {
                return Err(ConfigError::UnknownReference {
                    location: format!("buckets.{}.notifications", bucket.name),
                    resource: "function",
                    name: notification.function.clone(),
                });
            }
        }
    }

    for topic in &config.topics {
        for sub in &topic.subscriptions {
            match sub.protocol.as_str() {
                "queue" if !queues.contains(sub.endpoint.as_str()) => {
                    return Err(ConfigError::UnknownReference {
                        location: format!("topics.{}.subscriptions", topic.name),
                        resource: "queue",
                        name: sub.endpoint.clone(),
                    });
                }
                "compute" if !functions.contains(sub.endpoint.as_str()) => {
                    return Err(ConfigError::UnknownReference {
                        location: format!("topics.{}.subscriptions", topic.name),
                        resource: "function",
                        name: sub.endpoint.clone(),
                    });
                }
                "queue" | "compute" => {}
                other => {
                    return Err(ConfigError::invalid(
                        format!("topics.{}.subscriptions", topic.name),
                        format!("unsupported protocol '{other}'"),
                    ));
                }
            }
        }
    }

    for bus in &config.buses {
        for rule in &bus.rules {
            if let Some(schedule) = &rule.schedule {
                if !schedule.starts_with("rate(") && !schedule.starts_with("cron(") {
                    return Err(ConfigError::invalid(
                        format!("buses.{}.rules.{}.schedule", bus.name, rule.name),
                        format!("'{schedule}' is neither rate(...) nor cron(...)"),
                    ));
                }
            }
            for target in &rule.targets {
                if !functions.contains(target.as_str()) {
                    return Err(ConfigError::UnknownReference {
                        location: format!("buses.{}.rules.{}", bus.name, rule.name),
                        resource: "function",
                        name: target.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn validate_identity(config: &EmulatorConfig) -> Result<(), ConfigError> {
    let mode = config.identity.mode.as_str();
    if !VALID_IDENTITY_MODES.contains(&mode) {
        return Err(ConfigError::invalid(
            "identity.mode",
            format!("'{mode}' is not one of {}", VALID_IDENTITY_MODES.join(", ")),
        ));
    }
    for (service, mode) in &config.identity.services {
        if !VALID_IDENTITY_MODES.contains(&mode.as_str()) {
            return Err(ConfigError::invalid(
                format!("identity.services.{service}"),
                format!("'{mode}' is not one of {}", VALID_IDENTITY_MODES.join(", ")),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
