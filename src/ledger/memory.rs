// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local implementation of the database contract.
//!
//! Mirrors the contract's observable behaviour closely enough to run the web
//! application without a sentinel, and pins the semantics the gateway tests
//! rely on:
//!
//! - `drop_table` on a missing table is a no-op returning `false`
//! - `get_value` on a missing field returns `null`
//! - `get_all_fields` on a missing record returns an empty object
//! - `insert_record` and `insert_records` merge into an existing record,
//!   overwriting only the fields they name
//! - a record exists only while it has at least one field, so removing its
//!   last field removes the record

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::method::{DbOperation, Fields};
use super::{LedgerClient, LedgerError};

type Table = BTreeMap<String, Fields>;

#[derive(Default)]
pub struct InMemoryLedger {
    tables: RwLock<BTreeMap<String, Table>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn table<'a>(tables: &'a BTreeMap<String, Table>, name: &str) -> Result<&'a Table, LedgerError> {
    tables
        .get(name)
        .ok_or_else(|| LedgerError::TableNotFound(name.to_string()))
}

fn merge_record(table: &mut Table, key: &str, fields: &Fields) {
    if fields.is_empty() {
        return;
    }
    table
        .entry(key.to_string())
        .or_default()
        .extend(fields.iter().map(|(name, value)| (name.clone(), value.clone())));
}

fn table_mut<'a>(
    tables: &'a mut BTreeMap<String, Table>,
    name: &str,
) -> Result<&'a mut Table, LedgerError> {
    tables
        .get_mut(name)
        .ok_or_else(|| LedgerError::TableNotFound(name.to_string()))
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn execute(&self, op: &DbOperation) -> Result<Value, LedgerError> {
        match op {
            DbOperation::CreateTable { table } => {
                let mut tables = self.tables.write().await;
                if tables.contains_key(table) {
                    return Err(LedgerError::TableExists(table.clone()));
                }
                tables.insert(table.clone(), Table::new());
                Ok(json!(true))
            }
            DbOperation::DropTable { table } => {
                let mut tables = self.tables.write().await;
                Ok(json!(tables.remove(table).is_some()))
            }
            DbOperation::TableSize { table: name } => {
                let tables = self.tables.read().await;
                Ok(json!(table(&tables, name)?.len()))
            }
            DbOperation::ListTables => {
                let tables = self.tables.read().await;
                Ok(json!(tables.keys().collect::<Vec<_>>()))
            }
            DbOperation::Insert(args) => {
                let mut tables = self.tables.write().await;
                let record = table_mut(&mut tables, &args.table)?
                    .entry(args.key.clone())
                    .or_default();
                if record.contains_key(&args.field) {
                    return Err(LedgerError::FieldExists {
                        key: args.key.clone(),
                        field: args.field.clone(),
                    });
                }
                record.insert(args.field.clone(), args.value.clone());
                Ok(json!(true))
            }
            DbOperation::Update(args) => {
                let mut tables = self.tables.write().await;
                let record = table_mut(&mut tables, &args.table)?
                    .get_mut(&args.key)
                    .ok_or_else(|| LedgerError::RecordNotFound {
                        table: args.table.clone(),
                        key: args.key.clone(),
                    })?;
                let slot = record
                    .get_mut(&args.field)
                    .ok_or_else(|| LedgerError::FieldNotFound {
                        key: args.key.clone(),
                        field: args.field.clone(),
                    })?;
                *slot = args.value.clone();
                Ok(json!(true))
            }
            DbOperation::GetValue(args) => {
                let tables = self.tables.read().await;
                let value = table(&tables, &args.table)?
                    .get(&args.key)
                    .and_then(|record| record.get(&args.field));
                Ok(json!(value))
            }
            DbOperation::RemoveField(args) => {
                let mut tables = self.tables.write().await;
                let target = table_mut(&mut tables, &args.table)?;
                let Some(record) = target.get_mut(&args.key) else {
                    return Ok(json!(false));
                };
                let removed = record.remove(&args.field).is_some();
                if record.is_empty() {
                    target.remove(&args.key);
                }
                Ok(json!(removed))
            }
            DbOperation::RemoveRecord(args) => {
                let mut tables = self.tables.write().await;
                let removed = table_mut(&mut tables, &args.table)?
                    .remove(&args.key)
                    .is_some();
                Ok(json!(removed))
            }
            DbOperation::GetAllFields(args) => {
                let tables = self.tables.read().await;
                let fields = table(&tables, &args.table)?
                    .get(&args.key)
                    .cloned()
                    .unwrap_or_default();
                Ok(json!(fields))
            }
            DbOperation::InsertRecord(args) => {
                let mut tables = self.tables.write().await;
                merge_record(table_mut(&mut tables, &args.table)?, &args.key, &args.fields);
                Ok(json!(true))
            }
            DbOperation::InsertRecords(args) => {
                let mut seen = HashSet::new();
                if let Some(dup) = args.records.iter().find(|r| !seen.insert(r.key.as_str())) {
                    return Err(LedgerError::DuplicateKey(dup.key.clone()));
                }

                let mut tables = self.tables.write().await;
                let target = table_mut(&mut tables, &args.table)?;
                for record in &args.records {
                    merge_record(target, &record.key, &record.fields);
                }
                Ok(json!(args.records.len()))
            }
            DbOperation::GetFields(args) => {
                let tables = self.tables.read().await;
                let record = table(&tables, &args.table)?.get(&args.key);
                let selected: Fields = args
                    .fields
                    .iter()
                    .filter_map(|name| {
                        record
                            .and_then(|r| r.get(name))
                            .map(|value| (name.clone(), value.clone()))
                    })
                    .collect();
                Ok(json!(selected))
            }
        }
    }
}
