// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-bus engine: buses, rules, pattern routing, scheduled rules.
//!
//! The `default` bus always exists and cannot be deleted. Rules with a
//! schedule expression are owned by the scheduler tasks this engine
//! spawns at start.

pub mod pattern;
pub mod schedule;

pub use pattern::match_pattern;
pub use schedule::{parse_schedule, Schedule};

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use lws_config::{BusSpec, RuleSpec};
use lws_core::{arn, iso8601_secs, Clock, EngineError};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::fabric::Fabric;

/// One entry of a put-events call.
#[derive(Debug, Clone, Default)]
pub struct PutEventsEntry {
    pub source: String,
    pub detail_type: String,
    /// JSON-encoded detail document.
    pub detail: String,
    pub bus_name: Option<String>,
}

/// Per-entry result of a put-events call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutEventsResult {
    pub event_id: String,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub pattern: Option<Value>,
    pub schedule: Option<String>,
    pub enabled: bool,
    pub targets: Vec<String>,
}

struct Bus {
    arn: String,
    rules: IndexMap<String, Rule>,
}

pub struct BusEngine<C: Clock> {
    clock: C,
    fabric: Arc<Fabric<C>>,
    buses: RwLock<HashMap<String, Bus>>,
}

impl<C: Clock> BusEngine<C> {
    pub fn new(clock: C, fabric: Arc<Fabric<C>>) -> Self {
        let engine = Self { clock, fabric, buses: RwLock::new(HashMap::new()) };
        engine.ensure_default_bus();
        engine
    }

    pub fn from_config(
        specs: &[BusSpec],
        clock: C,
        fabric: Arc<Fabric<C>>,
    ) -> Result<Self, EngineError> {
        let engine = Self::new(clock, fabric);
        for spec in specs {
            engine.create_bus(&spec.name);
            for rule in &spec.rules {
                engine.put_rule(&spec.name, rule.clone())?;
            }
        }
        Ok(engine)
    }

    fn ensure_default_bus(&self) {
        let mut buses = self.buses.write();
        buses.entry("default".to_string()).or_insert_with(|| Bus {
            arn: arn::event_bus("default"),
            rules: IndexMap::new(),
        });
    }

    /// Create a bus; idempotent. Returns the bus arn.
    pub fn create_bus(&self, name: &str) -> String {
        let mut buses = self.buses.write();
        buses
            .entry(name.to_string())
            .or_insert_with(|| Bus { arn: arn::event_bus(name), rules: IndexMap::new() })
            .arn
            .clone()
    }

    pub fn delete_bus(&self, name: &str) -> Result<(), EngineError> {
        if name == "default" {
            return Err(EngineError::validation("the default event bus cannot be deleted"));
        }
        match self.buses.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("bus", name)),
        }
    }

    pub fn describe_bus(&self, name: &str) -> Result<(String, String), EngineError> {
        let buses = self.buses.read();
        let bus = buses.get(name).ok_or_else(|| EngineError::not_found("bus", name))?;
        Ok((name.to_string(), bus.arn.clone()))
    }

    pub fn list_buses(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buses.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Create or replace a rule. Returns the rule arn.
    pub fn put_rule(&self, bus_name: &str, spec: RuleSpec) -> Result<String, EngineError> {
        if let Some(schedule) = &spec.schedule {
            parse_schedule(schedule)?;
        }
        let mut buses = self.buses.write();
        let bus =
            buses.get_mut(bus_name).ok_or_else(|| EngineError::not_found("bus", bus_name))?;
        let rule_arn = arn::rule(&spec.name);
        bus.rules.insert(
            spec.name.clone(),
            Rule {
                name: spec.name,
                pattern: spec.pattern,
                schedule: spec.schedule,
                enabled: spec.enabled,
                targets: spec.targets,
            },
        );
        Ok(rule_arn)
    }

    pub fn delete_rule(&self, bus_name: &str, rule_name: &str) -> Result<(), EngineError> {
        let mut buses = self.buses.write();
        let bus =
            buses.get_mut(bus_name).ok_or_else(|| EngineError::not_found("bus", bus_name))?;
        match bus.rules.shift_remove(rule_name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("rule", rule_name)),
        }
    }

    pub fn list_rules(&self, bus_name: &str) -> Result<Vec<Rule>, EngineError> {
        let buses = self.buses.read();
        let bus = buses.get(bus_name).ok_or_else(|| EngineError::not_found("bus", bus_name))?;
        Ok(bus.rules.values().cloned().collect())
    }

    /// Publish entries; every entry gets an event id whether or not
    /// any rule matched.
    pub fn put_events(&self, entries: Vec<PutEventsEntry>) -> Vec<PutEventsResult> {
        entries
            .into_iter()
            .map(|entry| {
                let event_id = Uuid::new_v4().to_string();
                let bus_name = entry.bus_name.clone().unwrap_or_else(|| "default".to_string());
                let envelope = self.event_envelope(&entry, &event_id);
                let matched = self.route(&bus_name, &envelope);
                tracing::debug!(event_id = %event_id, bus = %bus_name, matched, "event routed");
                PutEventsResult { event_id }
            })
            .collect()
    }

    /// Publish hook for other engines (object store, tables).
    pub fn publish_internal(
        &self,
        source: &str,
        detail_type: &str,
        detail: Value,
        bus_name: Option<&str>,
    ) -> String {
        let results = self.put_events(vec![PutEventsEntry {
            source: source.to_string(),
            detail_type: detail_type.to_string(),
            detail: detail.to_string(),
            bus_name: bus_name.map(str::to_string),
        }]);
        results.into_iter().next().map(|r| r.event_id).unwrap_or_default()
    }

    fn route(&self, bus_name: &str, envelope: &Value) -> usize {
        let rules: Vec<Rule> = {
            let buses = self.buses.read();
            match buses.get(bus_name) {
                Some(bus) => bus.rules.values().cloned().collect(),
                None => return 0,
            }
        };
        let mut matched = 0;
        for rule in rules {
            let Some(rule_pattern) = &rule.pattern else { continue };
            if !rule.enabled || !match_pattern(rule_pattern, envelope) {
                continue;
            }
            matched += 1;
            for target in &rule.targets {
                self.dispatch_target(target, envelope.clone());
            }
        }
        matched
    }

    fn dispatch_target(&self, target: &str, event: Value) {
        let function = arn::leaf_name(target).to_string();
        let fabric = self.fabric.clone();
        tokio::spawn(async move {
            if let Err(err) = fabric.compute.invoke(&function, event).await {
                tracing::error!(function = %function, error = %err, "bus target dispatch failed");
            }
        });
    }

    fn event_envelope(&self, entry: &PutEventsEntry, event_id: &str) -> Value {
        let detail: Value = serde_json::from_str(&entry.detail).unwrap_or_else(|_| json!({}));
        json!({
            "version": "0",
            "id": event_id,
            "source": entry.source,
            "account": arn::ACCOUNT,
            "time": iso8601_secs(self.clock.epoch_ms()),
            "region": arn::REGION,
            "resources": [],
            "detail-type": entry.detail_type,
            "detail": detail,
        })
    }

    /// Spawn one scheduler task per enabled rule carrying a schedule
    /// expression.
    pub fn start_scheduler(
        self: Arc<Self>,
        cancel: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let scheduled: Vec<(Rule, Schedule)> = {
            let buses = self.buses.read();
            buses
                .values()
                .flat_map(|bus| bus.rules.values())
                .filter(|rule| rule.enabled)
                .filter_map(|rule| {
                    let expression = rule.schedule.as_ref()?;
                    // put_rule validated this; config-seeded rules were
                    // validated by lws-config.
                    let schedule = parse_schedule(expression).ok()?;
                    Some((rule.clone(), schedule))
                })
                .collect()
        };
        scheduled
            .into_iter()
            .map(|(rule, schedule)| {
                spawn_scheduled_rule(self.clone(), rule, schedule, cancel.clone())
            })
            .collect()
    }

    fn scheduled_event_envelope(&self, rule: &Rule) -> Value {
        json!({
            "version": "0",
            "id": Uuid::new_v4().to_string(),
            "source": "aws.events",
            "account": arn::ACCOUNT,
            "time": iso8601_secs(self.clock.epoch_ms()),
            "region": arn::REGION,
            "resources": [arn::rule(&rule.name)],
            "detail-type": "Scheduled Event",
            "detail": {},
        })
    }
}

fn spawn_scheduled_rule<C: Clock>(
    engine: Arc<BusEngine<C>>,
    rule: Rule,
    schedule: Schedule,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(rule = %rule.name, "scheduled rule started");
        loop {
            let Some(delay) = schedule.next_delay() else {
                tracing::warn!(rule = %rule.name, "schedule has no next fire time");
                break;
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            let envelope = engine.scheduled_event_envelope(&rule);
            for target in &rule.targets {
                engine.dispatch_target(target, envelope.clone());
            }
        }
        tracing::debug!(rule = %rule.name, "scheduled rule stopped");
    })
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
