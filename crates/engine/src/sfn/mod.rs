// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-machine engine: definitions, executions, and tracking.
//!
//! Standard workflows run in the background and are polled through
//! describe/list; express workflows can additionally run synchronously
//! with the caller.

pub mod definition;
mod exec;
pub mod path;

pub use definition::Definition;
pub use exec::{ExecError, ExecOptions, Executor};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use lws_config::{StateMachineSpec, WorkflowType};
use lws_core::{arn, Clock, EngineError};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use crate::compute::ComputeEngine;

/// Oldest executions beyond this are evicted.
pub const MAX_EXECUTION_HISTORY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::TimedOut => "TIMED_OUT",
            ExecutionStatus::Aborted => "ABORTED",
        }
    }
}

/// One tracked execution.
#[derive(Debug, Clone)]
pub struct Execution {
    pub arn: String,
    pub machine_name: String,
    pub name: String,
    pub status: ExecutionStatus,
    pub input: Value,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub cause: Option<String>,
    pub start_epoch_ms: u64,
    pub end_epoch_ms: Option<u64>,
}

struct Machine {
    name: String,
    arn: String,
    workflow_type: WorkflowType,
    definition: Definition,
}

pub struct StateMachineEngine<C: Clock> {
    clock: C,
    executor: Arc<Executor>,
    options: ExecOptions,
    machines: RwLock<HashMap<String, Arc<Machine>>>,
    executions: Arc<Mutex<IndexMap<String, Execution>>>,
}

impl<C: Clock> StateMachineEngine<C> {
    pub fn new(clock: C, compute: Arc<ComputeEngine>, options: ExecOptions) -> Self {
        Self {
            clock,
            executor: Arc::new(Executor::new(compute)),
            options,
            machines: RwLock::new(HashMap::new()),
            executions: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    pub fn from_config(
        specs: &[StateMachineSpec],
        clock: C,
        compute: Arc<ComputeEngine>,
        options: ExecOptions,
    ) -> Result<Self, EngineError> {
        let engine = Self::new(clock, compute, options);
        for spec in specs {
            engine.create_state_machine(&spec.name, spec.workflow_type, &spec.definition)?;
        }
        Ok(engine)
    }

    pub fn create_state_machine(
        &self,
        name: &str,
        workflow_type: WorkflowType,
        definition_doc: &Value,
    ) -> Result<String, EngineError> {
        let definition = Definition::parse(definition_doc)?;
        let mut machines = self.machines.write();
        if machines.contains_key(name) {
            return Err(EngineError::already_exists("state machine", name));
        }
        let machine_arn = arn::state_machine(name);
        machines.insert(
            name.to_string(),
            Arc::new(Machine {
                name: name.to_string(),
                arn: machine_arn.clone(),
                workflow_type,
                definition,
            }),
        );
        Ok(machine_arn)
    }

    pub fn list_state_machines(&self) -> Vec<(String, String)> {
        let mut machines: Vec<(String, String)> = self
            .machines
            .read()
            .values()
            .map(|m| (m.name.clone(), m.arn.clone()))
            .collect();
        machines.sort();
        machines
    }

    /// Start a background execution; returns the execution arn
    /// immediately.
    pub fn start_execution(
        &self,
        machine_name: &str,
        input: Value,
        execution_name: Option<String>,
    ) -> Result<String, EngineError> {
        let machine = self.get_machine(machine_name)?;
        let execution_arn = self.register(&machine, input.clone(), execution_name)?;

        let executor = self.executor.clone();
        let options = self.options.clone();
        let executions = self.executions.clone();
        let clock = self.clock.clone();
        let arn_for_task = execution_arn.clone();
        tokio::spawn(async move {
            let outcome = run_to_outcome(&executor, &machine, input, &options).await;
            finish(&executions, &arn_for_task, outcome, clock.epoch_ms());
        });

        Ok(execution_arn)
    }

    /// Run an express workflow synchronously; returns the finished
    /// execution record.
    pub async fn start_sync_execution(
        &self,
        machine_name: &str,
        input: Value,
        execution_name: Option<String>,
    ) -> Result<Execution, EngineError> {
        let machine = self.get_machine(machine_name)?;
        if machine.workflow_type != WorkflowType::Express {
            return Err(EngineError::validation(
                "synchronous execution requires an express workflow",
            ));
        }
        let execution_arn = self.register(&machine, input.clone(), execution_name)?;
        let outcome = run_to_outcome(&self.executor, &machine, input, &self.options).await;
        finish(&self.executions, &execution_arn, outcome, self.clock.epoch_ms());
        self.describe_execution(&execution_arn)
    }

    pub fn describe_execution(&self, execution_arn: &str) -> Result<Execution, EngineError> {
        self.executions
            .lock()
            .get(execution_arn)
            .cloned()
            .ok_or_else(|| EngineError::not_found("execution", execution_arn))
    }

    /// Most recent first, optionally limited to one machine.
    pub fn list_executions(&self, machine_name: Option<&str>) -> Vec<Execution> {
        let executions = self.executions.lock();
        let mut listed: Vec<Execution> = executions
            .values()
            .filter(|e| machine_name.is_none_or(|name| e.machine_name == name))
            .cloned()
            .collect();
        listed.reverse();
        listed
    }

    fn register(
        &self,
        machine: &Machine,
        input: Value,
        execution_name: Option<String>,
    ) -> Result<String, EngineError> {
        let name = execution_name.unwrap_or_else(|| Uuid::new_v4().to_string());
        let execution_arn = arn::execution(&machine.name, &name);
        let mut executions = self.executions.lock();
        if executions.contains_key(&execution_arn) {
            return Err(EngineError::already_exists("execution", execution_arn));
        }
        executions.insert(
            execution_arn.clone(),
            Execution {
                arn: execution_arn.clone(),
                machine_name: machine.name.clone(),
                name,
                status: ExecutionStatus::Running,
                input,
                output: None,
                error: None,
                cause: None,
                start_epoch_ms: self.clock.epoch_ms(),
                end_epoch_ms: None,
            },
        );
        while executions.len() > MAX_EXECUTION_HISTORY {
            executions.shift_remove_index(0);
        }
        Ok(execution_arn)
    }

    fn get_machine(&self, name: &str) -> Result<Arc<Machine>, EngineError> {
        self.machines
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found("state machine", name))
    }
}

enum Outcome {
    Succeeded(Value),
    Failed(ExecError),
    TimedOut,
}

async fn run_to_outcome(
    executor: &Executor,
    machine: &Machine,
    input: Value,
    options: &ExecOptions,
) -> Outcome {
    let run = executor.run(&machine.definition, input, options);
    let result = match machine.definition.timeout_seconds {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
            Ok(result) => result,
            Err(_) => return Outcome::TimedOut,
        },
        None => run.await,
    };
    match result {
        Ok(output) => Outcome::Succeeded(output),
        Err(err) => Outcome::Failed(err),
    }
}

/// Record a finished execution; the entry may have been evicted.
fn finish(
    executions: &Mutex<IndexMap<String, Execution>>,
    execution_arn: &str,
    outcome: Outcome,
    end_epoch_ms: u64,
) {
    let mut executions = executions.lock();
    let Some(execution) = executions.get_mut(execution_arn) else {
        return;
    };
    execution.end_epoch_ms = Some(end_epoch_ms);
    match outcome {
        Outcome::Succeeded(output) => {
            execution.status = ExecutionStatus::Succeeded;
            execution.output = Some(output);
        }
        Outcome::Failed(err) => {
            execution.status = ExecutionStatus::Failed;
            execution.error = Some(err.error);
            execution.cause = Some(err.cause);
        }
        Outcome::TimedOut => {
            execution.status = ExecutionStatus::TimedOut;
            execution.error = Some("States.Timeout".to_string());
        }
    }
}

#[cfg(test)]
#[path = "sfn_tests.rs"]
mod tests;
