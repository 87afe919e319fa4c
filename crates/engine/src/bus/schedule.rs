// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule expressions: `rate(N unit)` and `cron(...)`.
//!
//! Rate schedules tick on monotonic intervals; cron schedules evaluate
//! against wall-clock time on every fire.

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use lws_core::EngineError;

/// A parsed schedule expression.
#[derive(Debug, Clone)]
pub enum Schedule {
    Rate(Duration),
    Cron(Box<cron::Schedule>),
}

impl Schedule {
    /// Time until the next fire, from now.
    pub fn next_delay(&self) -> Option<Duration> {
        match self {
            Schedule::Rate(period) => Some(*period),
            Schedule::Cron(schedule) => {
                let next = schedule.upcoming(Utc).next()?;
                (next - Utc::now()).to_std().ok()
            }
        }
    }
}

/// Parse a schedule expression.
pub fn parse_schedule(expression: &str) -> Result<Schedule, EngineError> {
    if let Some(body) = strip_call(expression, "rate") {
        return parse_rate(body).map(Schedule::Rate);
    }
    if let Some(body) = strip_call(expression, "cron") {
        // The cloud's cron has no seconds field; the cron crate wants
        // one, so fires happen at second zero.
        let schedule = cron::Schedule::from_str(&format!("0 {body}"))
            .map_err(|e| EngineError::validation(format!("invalid cron expression: {e}")))?;
        return Ok(Schedule::Cron(Box::new(schedule)));
    }
    Err(EngineError::validation(format!(
        "schedule '{expression}' is neither rate(...) nor cron(...)"
    )))
}

fn strip_call<'a>(expression: &'a str, name: &str) -> Option<&'a str> {
    expression
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_rate(body: &str) -> Result<Duration, EngineError> {
    let mut parts = body.split_whitespace();
    let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(EngineError::validation(format!("invalid rate expression '{body}'")));
    };
    let value: u64 = value
        .parse()
        .map_err(|_| EngineError::validation(format!("invalid rate value '{value}'")))?;
    if value == 0 {
        return Err(EngineError::validation("rate value must be positive"));
    }
    let seconds = match unit {
        "second" | "seconds" => 1,
        "minute" | "minutes" => 60,
        "hour" | "hours" => 3600,
        "day" | "days" => 86_400,
        other => {
            return Err(EngineError::validation(format!("invalid rate unit '{other}'")));
        }
    };
    Ok(Duration::from_secs(value * seconds))
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
