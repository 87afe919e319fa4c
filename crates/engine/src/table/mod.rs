// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table engine: schema-keyed items, expressions, transactions, and
//! the change stream.
//!
//! Change records are emitted while the table's item lock is held, so
//! record order always matches mutation order for a table.

pub mod expression;
mod stream;

pub use expression::{apply_update, eval_condition, ExprContext};
pub use stream::{
    ChangeKind, ChangeRecord, StreamDispatcher, StreamSubscriber, BATCH_WINDOW, MAX_BATCH,
};

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use lws_config::{KeyAttributeSpec, StreamView, TableIndexSpec, TableSpec};
use lws_core::{arn, AttrValue, CancellationReason, Clock, EngineError, Item};
use parking_lot::{Mutex, RwLock};

/// Expression placeholders carried alongside an operation.
#[derive(Debug, Clone, Default)]
pub struct ExprParams {
    pub names: Option<HashMap<String, String>>,
    pub values: Option<HashMap<String, AttrValue>>,
}

impl ExprParams {
    pub fn ctx(&self) -> ExprContext<'_> {
        ExprContext::new(self.names.as_ref(), self.values.as_ref())
    }
}

/// One operation of a transactional write.
#[derive(Debug, Clone)]
pub enum TransactWriteOp {
    Put {
        table: String,
        item: Item,
        condition: Option<String>,
        params: ExprParams,
    },
    Update {
        table: String,
        key: Item,
        update: String,
        condition: Option<String>,
        params: ExprParams,
    },
    Delete {
        table: String,
        key: Item,
        condition: Option<String>,
        params: ExprParams,
    },
    ConditionCheck {
        table: String,
        key: Item,
        condition: String,
        params: ExprParams,
    },
}

impl TransactWriteOp {
    fn table(&self) -> &str {
        match self {
            TransactWriteOp::Put { table, .. }
            | TransactWriteOp::Update { table, .. }
            | TransactWriteOp::Delete { table, .. }
            | TransactWriteOp::ConditionCheck { table, .. } => table,
        }
    }
}

struct Table {
    name: String,
    partition_key: KeyAttributeSpec,
    sort_key: Option<KeyAttributeSpec>,
    indexes: Vec<TableIndexSpec>,
    stream_view: Option<StreamView>,
    items: Mutex<IndexMap<String, Item>>,
}

impl Table {
    fn from_spec(spec: TableSpec) -> Self {
        Self {
            name: spec.name,
            partition_key: spec.partition_key,
            sort_key: spec.sort_key,
            indexes: spec.indexes,
            stream_view: spec.stream_view,
            items: Mutex::new(IndexMap::new()),
        }
    }

    /// Composite storage key for a full item; validates the schema
    /// attributes are present with the declared types.
    fn key_of_item(&self, item: &Item) -> Result<String, EngineError> {
        let mut key = self.key_part(item, &self.partition_key)?;
        if let Some(sort) = &self.sort_key {
            key.push('\u{1f}');
            key.push_str(&self.key_part(item, sort)?);
        }
        Ok(key)
    }

    fn key_part(&self, item: &Item, attr: &KeyAttributeSpec) -> Result<String, EngineError> {
        let value = item.get(&attr.name).ok_or_else(|| {
            EngineError::validation(format!("missing key attribute {}", attr.name))
        })?;
        if value.type_name() != attr.attr_type {
            return Err(EngineError::validation(format!(
                "key attribute {} must be of type {}",
                attr.name, attr.attr_type
            )));
        }
        let rendered = match value {
            AttrValue::S(s) => s.clone(),
            AttrValue::N(n) => n.clone(),
            other => {
                return Err(EngineError::validation(format!(
                    "key attribute {} has unsupported type {}",
                    attr.name,
                    other.type_name()
                )))
            }
        };
        Ok(format!("{}\u{1e}{rendered}", value.type_name()))
    }

    /// The key attributes of an item, as a small item.
    fn keys_of(&self, item: &Item) -> Item {
        let mut keys = IndexMap::new();
        if let Some(value) = item.get(&self.partition_key.name) {
            keys.insert(self.partition_key.name.clone(), value.clone());
        }
        if let Some(sort) = &self.sort_key {
            if let Some(value) = item.get(&sort.name) {
                keys.insert(sort.name.clone(), value.clone());
            }
        }
        keys
    }

    fn sort_attribute(&self, index_name: Option<&str>) -> Result<Option<String>, EngineError> {
        match index_name {
            None => Ok(self.sort_key.as_ref().map(|k| k.name.clone())),
            Some(name) => {
                let index = self
                    .indexes
                    .iter()
                    .find(|ix| ix.name == name)
                    .ok_or_else(|| EngineError::not_found("index", name))?;
                Ok(index.sort_key.as_ref().map(|k| k.name.clone()))
            }
        }
    }
}

pub struct TableEngine<C: Clock> {
    clock: C,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    stream: Arc<StreamDispatcher>,
    /// Serializes transactional writes so all conditions of one
    /// transaction see a single logical checkpoint.
    transact: Mutex<()>,
}

impl<C: Clock> TableEngine<C> {
    pub fn new(clock: C, stream: Arc<StreamDispatcher>) -> Self {
        Self { clock, tables: RwLock::new(HashMap::new()), stream, transact: Mutex::new(()) }
    }

    pub fn from_config(specs: &[TableSpec], clock: C, stream: Arc<StreamDispatcher>) -> Self {
        let engine = Self::new(clock, stream);
        for spec in specs {
            let _ = engine.create_table(spec.clone());
        }
        engine
    }

    pub fn stream(&self) -> &Arc<StreamDispatcher> {
        &self.stream
    }

    pub fn create_table(&self, spec: TableSpec) -> Result<String, EngineError> {
        let mut tables = self.tables.write();
        if tables.contains_key(&spec.name) {
            return Err(EngineError::already_exists("table", spec.name));
        }
        let name = spec.name.clone();
        tables.insert(name.clone(), Arc::new(Table::from_spec(spec)));
        Ok(arn::table(&name))
    }

    pub fn delete_table(&self, name: &str) -> Result<(), EngineError> {
        match self.tables.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("table", name)),
        }
    }

    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stream_view(&self, table: &str) -> Option<StreamView> {
        self.tables.read().get(table).and_then(|t| t.stream_view)
    }

    pub fn put(&self, table: &str, item: Item) -> Result<(), EngineError> {
        let table = self.get(table)?;
        self.put_locked(&table, item)
    }

    fn put_locked(&self, table: &Table, item: Item) -> Result<(), EngineError> {
        let key = table.key_of_item(&item)?;
        let mut items = table.items.lock();
        let old = items.insert(key, item.clone());
        let kind = if old.is_some() { ChangeKind::Modify } else { ChangeKind::Insert };
        self.emit(table, kind, &item, Some(item.clone()), old);
        Ok(())
    }

    pub fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>, EngineError> {
        let table = self.get(table)?;
        let key = table.key_of_item(key)?;
        let item = table.items.lock().get(&key).cloned();
        Ok(item)
    }

    pub fn delete_item(&self, table: &str, key: &Item) -> Result<Option<Item>, EngineError> {
        let table = self.get(table)?;
        self.delete_locked(&table, key)
    }

    fn delete_locked(&self, table: &Table, key: &Item) -> Result<Option<Item>, EngineError> {
        let storage_key = table.key_of_item(key)?;
        let mut items = table.items.lock();
        let old = items.shift_remove(&storage_key);
        if let Some(old_item) = &old {
            self.emit(table, ChangeKind::Remove, old_item, None, Some(old_item.clone()));
        }
        Ok(old)
    }

    /// Apply an update expression, creating the item from its key
    /// attributes when absent. Returns the updated item.
    pub fn update_item(
        &self,
        table: &str,
        key: &Item,
        update: &str,
        params: &ExprParams,
    ) -> Result<Item, EngineError> {
        let table = self.get(table)?;
        self.update_locked(&table, key, update, params)
    }

    fn update_locked(
        &self,
        table: &Table,
        key: &Item,
        update: &str,
        params: &ExprParams,
    ) -> Result<Item, EngineError> {
        let storage_key = table.key_of_item(key)?;
        let mut items = table.items.lock();
        let old = items.get(&storage_key).cloned();
        let mut item = old.clone().unwrap_or_else(|| table.keys_of(key));
        apply_update(update, &mut item, &params.ctx())?;
        // The update may not rewrite key attributes.
        if table.key_of_item(&item)? != storage_key {
            return Err(EngineError::validation("update expression may not change key attributes"));
        }
        items.insert(storage_key, item.clone());
        let kind = if old.is_some() { ChangeKind::Modify } else { ChangeKind::Insert };
        self.emit(table, kind, &item, Some(item.clone()), old.clone());
        Ok(item)
    }

    /// Query by key condition; results sort by the applicable sort key.
    pub fn query(
        &self,
        table: &str,
        key_condition: &str,
        filter: Option<&str>,
        params: &ExprParams,
        index_name: Option<&str>,
    ) -> Result<Vec<Item>, EngineError> {
        let table = self.get(table)?;
        let sort_attr = table.sort_attribute(index_name)?;
        let ctx = params.ctx();
        let mut matched = Vec::new();
        for item in table.items.lock().values() {
            if !eval_condition(key_condition, item, &ctx)? {
                continue;
            }
            if let Some(filter) = filter {
                if !eval_condition(filter, item, &ctx)? {
                    continue;
                }
            }
            matched.push(item.clone());
        }
        if let Some(sort_attr) = sort_attr {
            matched.sort_by(|a, b| {
                match (a.get(&sort_attr), b.get(&sort_attr)) {
                    (Some(left), Some(right)) => expression::order_values(left, right)
                        .unwrap_or(std::cmp::Ordering::Equal),
                    _ => std::cmp::Ordering::Equal,
                }
            });
        }
        Ok(matched)
    }

    pub fn scan(
        &self,
        table: &str,
        filter: Option<&str>,
        params: &ExprParams,
    ) -> Result<Vec<Item>, EngineError> {
        let table = self.get(table)?;
        let ctx = params.ctx();
        let mut matched = Vec::new();
        for item in table.items.lock().values() {
            match filter {
                Some(filter) if !eval_condition(filter, item, &ctx)? => continue,
                _ => matched.push(item.clone()),
            }
        }
        Ok(matched)
    }

    pub fn batch_get(&self, table: &str, keys: &[Item]) -> Result<Vec<Item>, EngineError> {
        let mut found = Vec::new();
        for key in keys {
            if let Some(item) = self.get_item(table, key)? {
                found.push(item);
            }
        }
        Ok(found)
    }

    pub fn batch_write(
        &self,
        table: &str,
        puts: Vec<Item>,
        deletes: Vec<Item>,
    ) -> Result<(), EngineError> {
        for item in puts {
            self.put(table, item)?;
        }
        for key in deletes {
            self.delete_item(table, &key)?;
        }
        Ok(())
    }

    pub fn transact_get(
        &self,
        gets: &[(String, Item)],
    ) -> Result<Vec<Option<Item>>, EngineError> {
        let _guard = self.transact.lock();
        gets.iter().map(|(table, key)| self.get_item(table, key)).collect()
    }

    /// Evaluate every condition under one checkpoint; apply writes and
    /// emit change records only when all pass.
    pub fn transact_write(&self, ops: Vec<TransactWriteOp>) -> Result<(), EngineError> {
        let _guard = self.transact.lock();

        let mut reasons = Vec::with_capacity(ops.len());
        let mut any_failed = false;
        for op in &ops {
            let table = self.get(op.table())?;
            let passed = self.check_condition(&table, op)?;
            if passed {
                reasons.push(CancellationReason::None);
            } else {
                reasons.push(CancellationReason::ConditionalCheckFailed);
                any_failed = true;
            }
        }
        if any_failed {
            return Err(EngineError::TransactionCanceled { reasons });
        }

        for op in ops {
            let table = self.get(op.table())?;
            match op {
                TransactWriteOp::Put { item, .. } => self.put_locked(&table, item)?,
                TransactWriteOp::Update { key, update, params, .. } => {
                    self.update_locked(&table, &key, &update, &params)?;
                }
                TransactWriteOp::Delete { key, .. } => {
                    self.delete_locked(&table, &key)?;
                }
                TransactWriteOp::ConditionCheck { .. } => {}
            }
        }
        Ok(())
    }

    fn check_condition(&self, table: &Table, op: &TransactWriteOp) -> Result<bool, EngineError> {
        let (keyed, condition, params) = match op {
            TransactWriteOp::Put { item, condition, params, .. } => {
                (item, condition.as_deref(), params)
            }
            TransactWriteOp::Update { key, condition, params, .. } => {
                (key, condition.as_deref(), params)
            }
            TransactWriteOp::Delete { key, condition, params, .. } => {
                (key, condition.as_deref(), params)
            }
            TransactWriteOp::ConditionCheck { key, condition, params, .. } => {
                (key, Some(condition.as_str()), params)
            }
        };
        let Some(condition) = condition else {
            return Ok(true);
        };
        let storage_key = table.key_of_item(keyed)?;
        let existing = table.items.lock().get(&storage_key).cloned().unwrap_or_default();
        eval_condition(condition, &existing, &params.ctx())
    }

    fn emit(
        &self,
        table: &Table,
        kind: ChangeKind,
        keyed: &Item,
        new_image: Option<Item>,
        old_image: Option<Item>,
    ) {
        let Some(view) = table.stream_view else {
            return;
        };
        self.stream.emit(
            kind,
            &table.name,
            table.keys_of(keyed),
            new_image,
            old_image,
            view,
            self.clock.epoch_ms(),
        );
    }

    fn get(&self, name: &str) -> Result<Arc<Table>, EngineError> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found("table", name))
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
