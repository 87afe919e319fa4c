// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Form-dialect decoding.
//!
//! Form services carry structured arguments as numbered entries:
//! `MessageAttribute.1.Name=color`, `MessageAttribute.1.Value.StringValue=red`.
//! [`numbered_entries`] reassembles those into per-index maps.

use std::collections::BTreeMap;

/// Decoded form or query parameters. Repeated keys keep the first
/// value, matching how the form services read them.
#[derive(Debug, Clone, Default)]
pub struct FormParams {
    entries: Vec<(String, String)>,
}

impl FormParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode an `application/x-www-form-urlencoded` body or query string.
pub fn decode_form(input: &str) -> FormParams {
    let entries = url::form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    FormParams { entries }
}

/// Collect numbered entries under `prefix` into per-index field maps,
/// in index order.
///
/// For `prefix = "MessageAttribute"`, a parameter
/// `MessageAttribute.2.Value.StringValue=x` lands in the second map
/// under the key `Value.StringValue`. Both the bare (`Prefix.N.field`)
/// and the `entry` (`Prefix.entry.N.field`) spellings are accepted.
pub fn numbered_entries(params: &FormParams, prefix: &str) -> Vec<BTreeMap<String, String>> {
    let mut by_index: BTreeMap<usize, BTreeMap<String, String>> = BTreeMap::new();
    let bare = format!("{prefix}.");
    let entry = format!("{prefix}.entry.");

    for (key, value) in params.iter() {
        let rest = match key.strip_prefix(&entry).or_else(|| key.strip_prefix(&bare)) {
            Some(rest) => rest,
            None => continue,
        };
        let Some((index_str, field)) = rest.split_once('.') else { continue };
        let Ok(index) = index_str.parse::<usize>() else { continue };
        by_index.entry(index).or_default().insert(field.to_string(), value.to_string());
    }

    by_index.into_values().collect()
}

/// Read dotted sub-keys of a single parameter group, e.g.
/// `RedrivePolicy.deadLetterTargetArn` under prefix `RedrivePolicy`.
pub fn nested_params(params: &FormParams, prefix: &str) -> BTreeMap<String, String> {
    let dotted = format!("{prefix}.");
    params
        .iter()
        .filter_map(|(k, v)| {
            k.strip_prefix(&dotted).map(|field| (field.to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
