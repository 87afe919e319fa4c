// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ARN construction for the fixed local account.
//!
//! The emulator runs as a single pretend account in a single pretend
//! region; every ARN it mints uses these constants.

/// Account id stamped into every generated ARN.
pub const ACCOUNT: &str = "000000000000";
/// Region stamped into every generated ARN.
pub const REGION: &str = "us-east-1";

pub fn queue(name: &str) -> String {
    format!("arn:aws:sqs:{REGION}:{ACCOUNT}:{name}")
}

pub fn topic(name: &str) -> String {
    format!("arn:aws:sns:{REGION}:{ACCOUNT}:{name}")
}

pub fn subscription(topic_name: &str, id: &str) -> String {
    format!("{}:{id}", topic(topic_name))
}

pub fn table(name: &str) -> String {
    format!("arn:aws:dynamodb:{REGION}:{ACCOUNT}:table/{name}")
}

pub fn table_stream(name: &str) -> String {
    format!("{}/stream", table(name))
}

pub fn bucket(name: &str) -> String {
    format!("arn:aws:s3:::{name}")
}

pub fn function(name: &str) -> String {
    format!("arn:aws:lambda:{REGION}:{ACCOUNT}:function:{name}")
}

pub fn event_bus(name: &str) -> String {
    format!("arn:aws:events:{REGION}:{ACCOUNT}:event-bus/{name}")
}

pub fn rule(name: &str) -> String {
    format!("arn:aws:events:{REGION}:{ACCOUNT}:rule/{name}")
}

pub fn state_machine(name: &str) -> String {
    format!("arn:aws:states:{REGION}:{ACCOUNT}:stateMachine:{name}")
}

pub fn execution(machine_name: &str, execution_name: &str) -> String {
    format!("arn:aws:states:{REGION}:{ACCOUNT}:execution:{machine_name}:{execution_name}")
}

pub fn parameter(name: &str) -> String {
    let trimmed = name.trim_start_matches('/');
    format!("arn:aws:ssm:{REGION}:{ACCOUNT}:parameter/{trimmed}")
}

pub fn secret(name: &str, suffix: &str) -> String {
    format!("arn:aws:secretsmanager:{REGION}:{ACCOUNT}:secret:{name}-{suffix}")
}

/// Last `:`-separated segment of an ARN, or the input unchanged when it
/// carries no colon. Cross-service targets name endpoints either way.
pub fn leaf_name(arn_or_name: &str) -> &str {
    match arn_or_name.rsplit_once(':') {
        Some((_, leaf)) => leaf,
        None => arn_or_name,
    }
}

#[cfg(test)]
#[path = "arn_tests.rs"]
mod tests;
