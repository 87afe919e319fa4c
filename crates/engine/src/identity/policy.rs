// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deny-overrides policy evaluation.
//!
//! An action is allowed when some identity or resource policy allows
//! it, the boundary (when present) also allows it, and nothing denies
//! it. Any explicit deny wins.

use serde_json::Value;

/// Final authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Everything one evaluation looks at.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub actions: &'a [String],
    pub identity_policies: &'a [Value],
    pub boundary: Option<&'a Value>,
    pub resource_policy: Option<&'a Value>,
}

/// Evaluate; returns the decision and a human-readable reason.
pub fn evaluate(ctx: &EvaluationContext<'_>) -> (Decision, String) {
    for action in ctx.actions {
        let mut docs: Vec<&Value> = ctx.identity_policies.iter().collect();
        docs.extend(ctx.boundary);
        docs.extend(ctx.resource_policy);
        for doc in &docs {
            if policy_has(doc, action, "Deny") {
                return (Decision::Deny, format!("explicit deny on {action}"));
            }
        }

        let allowed = ctx.identity_policies.iter().any(|doc| policy_has(doc, action, "Allow"))
            || ctx.resource_policy.is_some_and(|doc| policy_has(doc, action, "Allow"));
        if !allowed {
            return (Decision::Deny, format!("no policy allows {action}"));
        }
        if let Some(boundary) = ctx.boundary {
            if !policy_has(boundary, action, "Allow") {
                return (Decision::Deny, format!("permissions boundary excludes {action}"));
            }
        }
    }
    (Decision::Allow, "allowed".to_string())
}

/// Does a policy document carry a statement with this effect covering
/// the action?
fn policy_has(document: &Value, action: &str, effect: &str) -> bool {
    let Some(statements) = document.get("Statement").and_then(Value::as_array) else {
        return false;
    };
    statements.iter().any(|statement| {
        if statement.get("Effect").and_then(Value::as_str) != Some(effect) {
            return false;
        }
        match statement.get("Action") {
            Some(Value::String(pattern)) => action_matches(pattern, action),
            Some(Value::Array(patterns)) => patterns
                .iter()
                .filter_map(Value::as_str)
                .any(|pattern| action_matches(pattern, action)),
            _ => false,
        }
    })
}

/// `*`, exact, or trailing-`*` prefix match (`sqs:*`).
pub fn action_matches(pattern: &str, action: &str) -> bool {
    if pattern == "*" || pattern == action {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => action.starts_with(prefix),
        None => false,
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
