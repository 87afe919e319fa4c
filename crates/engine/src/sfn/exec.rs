// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-machine executor.
//!
//! Walks a definition from `StartAt` to a terminal state, applying the
//! path pipeline at each step. Task/Parallel/Map failures consult the
//! state's Retry catalog, then its Catch catalog, then fail the run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{join_all, BoxFuture};
use futures_util::stream::{self, StreamExt};
use lws_core::{arn, EngineError};
use serde_json::{json, Value};

use super::definition::{
    CatchSpec, ChoiceRule, ChoiceState, Definition, MapState, ParallelState, RetrySpec, State,
    TaskState, WaitState, ERROR_WILDCARD,
};
use super::path::{apply_parameters, apply_path, apply_result_path, get_path};
use crate::compute::ComputeEngine;

/// Transition ceiling; a walk past this is a runaway definition.
const MAX_TRANSITIONS: usize = 10_000;

/// A failed run: error name plus human cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecError {
    pub error: String,
    pub cause: String,
}

impl ExecError {
    fn new(error: impl Into<String>, cause: impl Into<String>) -> Self {
        Self { error: error.into(), cause: cause.into() }
    }

    fn runtime(cause: impl Into<String>) -> Self {
        Self::new("States.Runtime", cause)
    }
}

/// Caller-tunable execution options.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Upper bound on any single wait or retry sleep. Tests pin this
    /// low to keep Wait states deterministic and fast.
    pub wait_ceiling: Option<Duration>,
}

impl ExecOptions {
    fn bounded(&self, wanted: Duration) -> Duration {
        match self.wait_ceiling {
            Some(ceiling) => wanted.min(ceiling),
            None => wanted,
        }
    }
}

pub struct Executor {
    compute: Arc<ComputeEngine>,
}

enum StepOutcome {
    /// Continue at the named state with the given value.
    Transition(String, Value),
    /// The walk reached a terminal state.
    Terminal(Value),
}

impl Executor {
    pub fn new(compute: Arc<ComputeEngine>) -> Self {
        Self { compute }
    }

    /// Run a definition to completion.
    pub async fn run(
        &self,
        definition: &Definition,
        input: Value,
        options: &ExecOptions,
    ) -> Result<Value, ExecError> {
        self.run_boxed(definition, input, options).await
    }

    fn run_boxed<'a>(
        &'a self,
        definition: &'a Definition,
        input: Value,
        options: &'a ExecOptions,
    ) -> BoxFuture<'a, Result<Value, ExecError>> {
        Box::pin(async move {
            let mut current = definition.start_at.clone();
            let mut value = input;
            for _ in 0..MAX_TRANSITIONS {
                let state = definition
                    .states
                    .get(&current)
                    .ok_or_else(|| ExecError::runtime(format!("unknown state '{current}'")))?;
                match self.step(state, value, options).await? {
                    StepOutcome::Transition(next, next_value) => {
                        current = next;
                        value = next_value;
                    }
                    StepOutcome::Terminal(output) => return Ok(output),
                }
            }
            Err(ExecError::runtime("transition limit exceeded"))
        })
    }

    fn step<'a>(
        &'a self,
        state: &'a State,
        input: Value,
        options: &'a ExecOptions,
    ) -> BoxFuture<'a, Result<StepOutcome, ExecError>> {
        Box::pin(async move {
            match state {
                State::Pass(pass) => {
                    let effective = apply_path(&input, &pass.input_path);
                    let effective = match &pass.parameters {
                        Some(template) => apply_parameters(template, &effective, &Value::Null)
                            .map_err(engine_to_exec)?,
                        None => effective,
                    };
                    let result = pass.result.clone().unwrap_or(effective);
                    let merged = apply_result_path(input, result, &pass.result_path)
                        .map_err(engine_to_exec)?;
                    let output = apply_path(&merged, &pass.output_path);
                    continue_to(pass.next.as_deref(), pass.end, output)
                }
                State::Task(task) => self.step_task(task, input, options).await,
                State::Choice(choice) => step_choice(choice, input),
                State::Wait(wait) => self.step_wait(wait, input, options).await,
                State::Parallel(parallel) => self.step_parallel(parallel, input, options).await,
                State::Map(map) => self.step_map(map, input, options).await,
                State::Succeed(succeed) => {
                    let effective = apply_path(&input, &succeed.input_path);
                    Ok(StepOutcome::Terminal(apply_path(&effective, &succeed.output_path)))
                }
                State::Fail(fail) => Err(ExecError {
                    error: fail.error.clone().unwrap_or_else(|| "States.Fail".to_string()),
                    cause: fail.cause.clone().unwrap_or_default(),
                }),
            }
        })
    }

    fn step_task<'a>(
        &'a self,
        task: &'a TaskState,
        input: Value,
        options: &'a ExecOptions,
    ) -> BoxFuture<'a, Result<StepOutcome, ExecError>> {
        Box::pin(async move {
            let effective = apply_path(&input, &task.input_path);
            let payload = match &task.parameters {
                Some(template) => {
                    apply_parameters(template, &effective, &Value::Null).map_err(engine_to_exec)?
                }
                None => effective,
            };

            let attempt = || {
                let payload = payload.clone();
                async move { self.invoke(task, payload).await }
            };
            let result =
                run_with_retries(&task.retry, options, attempt).await;

            match result {
                Ok(task_result) => {
                    let merged = apply_result_path(input, task_result, &task.result_path)
                        .map_err(engine_to_exec)?;
                    let output = apply_path(&merged, &task.output_path);
                    continue_to(task.next.as_deref(), task.end, output)
                }
                Err(err) => apply_catch(&task.catch, err, input),
            }
        })
    }

    async fn invoke(&self, task: &TaskState, payload: Value) -> Result<Value, ExecError> {
        let function = arn::leaf_name(&task.resource);
        let invocation = self.compute.invoke(function, payload);
        let result = match task.timeout_seconds {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), invocation).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Timeout(format!(
                        "task exceeded {secs}s"
                    ))),
                }
            }
            None => invocation.await,
        };
        result.map_err(|err| match err {
            EngineError::Timeout(cause) => ExecError::new("States.Timeout", cause),
            other => ExecError::new("States.TaskFailed", other.to_string()),
        })
    }

    fn step_wait<'a>(
        &'a self,
        wait: &'a WaitState,
        input: Value,
        options: &'a ExecOptions,
    ) -> BoxFuture<'a, Result<StepOutcome, ExecError>> {
        Box::pin(async move {
            let effective = apply_path(&input, &wait.input_path);
            let duration = wait_duration(wait, &effective)?;
            tokio::time::sleep(options.bounded(duration)).await;
            let output = apply_path(&effective, &wait.output_path);
            continue_to(wait.next.as_deref(), wait.end, output)
        })
    }

    fn step_parallel<'a>(
        &'a self,
        parallel: &'a ParallelState,
        input: Value,
        options: &'a ExecOptions,
    ) -> BoxFuture<'a, Result<StepOutcome, ExecError>> {
        Box::pin(async move {
            let effective = apply_path(&input, &parallel.input_path);

            let attempt = || {
                let effective = effective.clone();
                async move {
                    let branches = parallel
                        .branches
                        .iter()
                        .map(|branch| self.run_boxed(branch, effective.clone(), options));
                    let outputs: Result<Vec<Value>, ExecError> =
                        join_all(branches).await.into_iter().collect();
                    outputs.map(Value::Array)
                }
            };
            let result = run_with_retries(&parallel.retry, options, attempt).await;

            match result {
                Ok(outputs) => {
                    let merged = apply_result_path(input, outputs, &parallel.result_path)
                        .map_err(engine_to_exec)?;
                    let output = apply_path(&merged, &parallel.output_path);
                    continue_to(parallel.next.as_deref(), parallel.end, output)
                }
                Err(err) => apply_catch(&parallel.catch, err, input),
            }
        })
    }

    fn step_map<'a>(
        &'a self,
        map: &'a MapState,
        input: Value,
        options: &'a ExecOptions,
    ) -> BoxFuture<'a, Result<StepOutcome, ExecError>> {
        Box::pin(async move {
            let effective = apply_path(&input, &map.input_path);
            let items = match &map.items_path {
                Some(path) => get_path(&effective, path)
                    .ok_or_else(|| ExecError::runtime(format!("ItemsPath {path} not found")))?,
                None => effective.clone(),
            };
            let Value::Array(items) = items else {
                return Err(ExecError::runtime("Map items must be an array"));
            };
            let iterator = map.iterator().map_err(engine_to_exec)?;
            let concurrency = match map.max_concurrency {
                Some(0) | None => items.len().max(1),
                Some(limit) => limit,
            };

            let attempt = || {
                let items = items.clone();
                let effective = effective.clone();
                async move {
                    let runs: Vec<_> = items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| {
                            let item_input = match &map.parameters {
                                Some(template) => {
                                    let context = json!({
                                        "Map": { "Item": { "Value": item, "Index": index } }
                                    });
                                    apply_parameters(template, &effective, &context)
                                        .map_err(engine_to_exec)
                                }
                                None => Ok(item.clone()),
                            };
                            async move { self.run_boxed(iterator, item_input?, options).await }
                        })
                        .collect();
                    // `buffered` preserves input order in the output list.
                    let outputs: Vec<Result<Value, ExecError>> =
                        stream::iter(runs).buffered(concurrency).collect().await;
                    outputs.into_iter().collect::<Result<Vec<Value>, _>>().map(Value::Array)
                }
            };
            let result = run_with_retries(&map.retry, options, attempt).await;

            match result {
                Ok(outputs) => {
                    let merged = apply_result_path(input, outputs, &map.result_path)
                        .map_err(engine_to_exec)?;
                    let output = apply_path(&merged, &map.output_path);
                    continue_to(map.next.as_deref(), map.end, output)
                }
                Err(err) => apply_catch(&map.catch, err, input),
            }
        })
    }
}

/// Run an attempt through a retry catalog: on a matching error, sleep
/// `interval × backoff^n` (bounded) and try again, up to MaxAttempts
/// per retrier.
async fn run_with_retries<F, Fut>(
    retriers: &[RetrySpec],
    options: &ExecOptions,
    attempt: F,
) -> Result<Value, ExecError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Value, ExecError>>,
{
    let mut used: Vec<u32> = vec![0; retriers.len()];
    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let Some(index) = retriers
            .iter()
            .position(|r| error_matches(&r.error_equals, &err.error))
        else {
            return Err(err);
        };
        let retrier = &retriers[index];
        if used[index] >= retrier.max_attempts {
            return Err(err);
        }
        let backoff = retrier.backoff_rate.powi(used[index] as i32);
        let sleep_secs = retrier.interval_seconds as f64 * backoff;
        used[index] += 1;
        tokio::time::sleep(options.bounded(Duration::from_secs_f64(sleep_secs))).await;
    }
}

/// Route a failure through the catch catalog, or propagate it.
fn apply_catch(
    catchers: &[CatchSpec],
    err: ExecError,
    input: Value,
) -> Result<StepOutcome, ExecError> {
    let Some(catcher) =
        catchers.iter().find(|c| error_matches(&c.error_equals, &err.error))
    else {
        return Err(err);
    };
    let envelope = json!({ "Error": err.error, "Cause": err.cause });
    let value =
        apply_result_path(input, envelope, &catcher.result_path).map_err(engine_to_exec)?;
    Ok(StepOutcome::Transition(catcher.next.clone(), value))
}

fn error_matches(error_equals: &[String], error: &str) -> bool {
    error_equals.iter().any(|e| e == ERROR_WILDCARD || e == error)
}

fn continue_to(
    next: Option<&str>,
    end: bool,
    value: Value,
) -> Result<StepOutcome, ExecError> {
    if end {
        return Ok(StepOutcome::Terminal(value));
    }
    match next {
        Some(next) => Ok(StepOutcome::Transition(next.to_string(), value)),
        None => Err(ExecError::runtime("state has neither Next nor End")),
    }
}

// ---------------------------------------------------------------------------
// Choice evaluation
// ---------------------------------------------------------------------------

fn step_choice(choice: &ChoiceState, input: Value) -> Result<StepOutcome, ExecError> {
    let effective = apply_path(&input, &choice.input_path);
    for rule in &choice.choices {
        if eval_choice_rule(rule, &effective)? {
            let next = rule.next.clone().ok_or_else(|| {
                ExecError::runtime("top-level choice rule requires Next")
            })?;
            let output = apply_path(&effective, &choice.output_path);
            return Ok(StepOutcome::Transition(next, output));
        }
    }
    match &choice.default {
        Some(default) => {
            let output = apply_path(&effective, &choice.output_path);
            Ok(StepOutcome::Transition(default.clone(), output))
        }
        None => Err(ExecError::new(
            "States.NoChoiceMatched",
            "no choice rule matched and no Default was given",
        )),
    }
}

fn eval_choice_rule(rule: &ChoiceRule, value: &Value) -> Result<bool, ExecError> {
    if let Some(rules) = &rule.and {
        for sub in rules {
            if !eval_choice_rule(sub, value)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if let Some(rules) = &rule.or {
        for sub in rules {
            if eval_choice_rule(sub, value)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    if let Some(sub) = &rule.not {
        return Ok(!eval_choice_rule(sub, value)?);
    }

    let variable = rule
        .variable
        .as_deref()
        .ok_or_else(|| ExecError::runtime("choice rule requires Variable"))?;
    let actual = get_path(value, variable);

    if let Some(expected) = rule.is_present {
        return Ok(actual.is_some() == expected);
    }
    let Some(actual) = actual else {
        return Ok(false);
    };
    if let Some(expected) = rule.is_null {
        return Ok(actual.is_null() == expected);
    }
    if let Some(expected) = rule.is_numeric {
        return Ok(actual.is_number() == expected);
    }
    if let Some(expected) = rule.is_string {
        return Ok(actual.is_string() == expected);
    }
    if let Some(expected) = rule.is_boolean {
        return Ok(actual.is_boolean() == expected);
    }
    if let Some(expected) = &rule.boolean_equals {
        return Ok(actual.as_bool() == Some(*expected));
    }

    if let Some(expected) = &rule.string_equals {
        return Ok(actual.as_str() == Some(expected.as_str()));
    }
    for (candidate, check) in [
        (&rule.string_less_than, StringCheck::Lt),
        (&rule.string_greater_than, StringCheck::Gt),
        (&rule.string_less_than_equals, StringCheck::Le),
        (&rule.string_greater_than_equals, StringCheck::Ge),
    ] {
        if let Some(expected) = candidate {
            let Some(actual) = actual.as_str() else { return Ok(false) };
            return Ok(check.eval(actual, expected));
        }
    }

    for (candidate, check) in [
        (&rule.numeric_equals, NumberCheck::Eq),
        (&rule.numeric_less_than, NumberCheck::Lt),
        (&rule.numeric_greater_than, NumberCheck::Gt),
        (&rule.numeric_less_than_equals, NumberCheck::Le),
        (&rule.numeric_greater_than_equals, NumberCheck::Ge),
    ] {
        if let Some(expected) = candidate {
            let Some(actual) = actual.as_f64() else { return Ok(false) };
            return Ok(check.eval(actual, *expected));
        }
    }

    Err(ExecError::runtime("choice rule has no comparison operator"))
}

#[derive(Clone, Copy)]
enum StringCheck {
    Lt,
    Gt,
    Le,
    Ge,
}

impl StringCheck {
    fn eval(self, actual: &str, expected: &str) -> bool {
        match self {
            StringCheck::Lt => actual < expected,
            StringCheck::Gt => actual > expected,
            StringCheck::Le => actual <= expected,
            StringCheck::Ge => actual >= expected,
        }
    }
}

#[derive(Clone, Copy)]
enum NumberCheck {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl NumberCheck {
    fn eval(self, actual: f64, expected: f64) -> bool {
        match self {
            NumberCheck::Eq => actual == expected,
            NumberCheck::Lt => actual < expected,
            NumberCheck::Gt => actual > expected,
            NumberCheck::Le => actual <= expected,
            NumberCheck::Ge => actual >= expected,
        }
    }
}

// ---------------------------------------------------------------------------
// Wait durations
// ---------------------------------------------------------------------------

fn wait_duration(wait: &WaitState, effective: &Value) -> Result<Duration, ExecError> {
    if let Some(seconds) = wait.seconds {
        return Ok(Duration::from_secs(seconds));
    }
    if let Some(path) = &wait.seconds_path {
        let seconds = get_path(effective, path)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ExecError::runtime(format!("SecondsPath {path} not numeric")))?;
        return Ok(Duration::from_secs_f64(seconds.max(0.0)));
    }
    let timestamp = if let Some(timestamp) = &wait.timestamp {
        Some(timestamp.clone())
    } else if let Some(path) = &wait.timestamp_path {
        get_path(effective, path).and_then(|v| v.as_str().map(str::to_string))
    } else {
        None
    };
    match timestamp {
        Some(timestamp) => {
            let target: DateTime<Utc> = timestamp
                .parse()
                .map_err(|_| ExecError::runtime(format!("invalid timestamp '{timestamp}'")))?;
            Ok((target - Utc::now()).to_std().unwrap_or(Duration::ZERO))
        }
        None => Err(ExecError::runtime("Wait state has no duration")),
    }
}

fn engine_to_exec(err: EngineError) -> ExecError {
    ExecError::new("States.Runtime", err.to_string())
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
