// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Allow-listed database methods and their typed arguments.
//!
//! The gateway only ever dispatches a [`DbMethod`]. Each method owns exactly
//! one argument struct, and a request body is turned into a [`DbOperation`]
//! by deserializing into that struct. A missing or mistyped field is an
//! [`ArgumentError`], never a silently empty argument.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Field name → value map of one record.
pub type Fields = BTreeMap<String, String>;

/// Every operation the gateway is willing to forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum DbMethod {
    CreateTable,
    DropTable,
    TableSize,
    ListTables,
    Insert,
    Update,
    GetValue,
    RemoveField,
    RemoveRecord,
    GetAllFields,
    InsertRecord,
    InsertRecords,
    GetFields,
}

#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("invalid arguments for '{method}': {reason}")]
    Invalid { method: DbMethod, reason: String },
}

/// `create_table`, `drop_table`, `table_size`: `table_name`, falling back to `table`.
#[derive(Debug, Deserialize)]
struct TableNameBody {
    #[serde(default)]
    table_name: Option<String>,
    #[serde(default)]
    table: Option<String>,
}

/// `insert`, `update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValueArgs {
    pub table: String,
    pub key: String,
    pub field: String,
    pub value: String,
}

/// `get_value`, `remove_field`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldArgs {
    pub table: String,
    pub key: String,
    pub field: String,
}

/// `remove_record`, `get_all_fields`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordArgs {
    pub table: String,
    pub key: String,
}

/// Record fields as sent by clients: either `{ name: value }` or the
/// contract SDK's `[[name, value], ...]` pair list.
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldsBody {
    Map(Fields),
    Pairs(Vec<(String, String)>),
}

/// Later pairs win when a name repeats.
fn field_map<'de, D>(deserializer: D) -> Result<Fields, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FieldsBody::deserialize(deserializer)? {
        FieldsBody::Map(fields) => fields,
        FieldsBody::Pairs(pairs) => pairs.into_iter().collect(),
    })
}

/// `insert_record`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFieldsArgs {
    pub table: String,
    pub key: String,
    #[serde(deserialize_with = "field_map")]
    pub fields: Fields,
}

/// One entry of an `insert_records` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub key: String,
    #[serde(deserialize_with = "field_map")]
    pub fields: Fields,
}

/// `insert_records`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordsArgs {
    pub table: String,
    pub records: Vec<RecordEntry>,
}

/// `get_fields`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNamesArgs {
    pub table: String,
    pub key: String,
    pub fields: Vec<String>,
}

/// A fully resolved call against the database contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbOperation {
    CreateTable { table: String },
    DropTable { table: String },
    TableSize { table: String },
    ListTables,
    Insert(FieldValueArgs),
    Update(FieldValueArgs),
    GetValue(FieldArgs),
    RemoveField(FieldArgs),
    RemoveRecord(RecordArgs),
    GetAllFields(RecordArgs),
    InsertRecord(RecordFieldsArgs),
    InsertRecords(RecordsArgs),
    GetFields(FieldNamesArgs),
}

impl DbOperation {
    /// Extract the arguments `method` needs from a JSON request body.
    pub fn from_body(method: DbMethod, body: Value) -> Result<Self, ArgumentError> {
        if method == DbMethod::ListTables {
            return Ok(Self::ListTables);
        }
        if !body.is_object() {
            return Err(ArgumentError::NotAnObject);
        }

        let op = match method {
            DbMethod::CreateTable => Self::CreateTable {
                table: table_name(method, body)?,
            },
            DbMethod::DropTable => Self::DropTable {
                table: table_name(method, body)?,
            },
            DbMethod::TableSize => Self::TableSize {
                table: table_name(method, body)?,
            },
            DbMethod::ListTables => Self::ListTables,
            DbMethod::Insert => Self::Insert(args(method, body)?),
            DbMethod::Update => Self::Update(args(method, body)?),
            DbMethod::GetValue => Self::GetValue(args(method, body)?),
            DbMethod::RemoveField => Self::RemoveField(args(method, body)?),
            DbMethod::RemoveRecord => Self::RemoveRecord(args(method, body)?),
            DbMethod::GetAllFields => Self::GetAllFields(args(method, body)?),
            DbMethod::InsertRecord => Self::InsertRecord(args(method, body)?),
            DbMethod::InsertRecords => Self::InsertRecords(args(method, body)?),
            DbMethod::GetFields => Self::GetFields(args(method, body)?),
        };

        op.validate()?;
        Ok(op)
    }

    pub fn method(&self) -> DbMethod {
        match self {
            Self::CreateTable { .. } => DbMethod::CreateTable,
            Self::DropTable { .. } => DbMethod::DropTable,
            Self::TableSize { .. } => DbMethod::TableSize,
            Self::ListTables => DbMethod::ListTables,
            Self::Insert(_) => DbMethod::Insert,
            Self::Update(_) => DbMethod::Update,
            Self::GetValue(_) => DbMethod::GetValue,
            Self::RemoveField(_) => DbMethod::RemoveField,
            Self::RemoveRecord(_) => DbMethod::RemoveRecord,
            Self::GetAllFields(_) => DbMethod::GetAllFields,
            Self::InsertRecord(_) => DbMethod::InsertRecord,
            Self::InsertRecords(_) => DbMethod::InsertRecords,
            Self::GetFields(_) => DbMethod::GetFields,
        }
    }

    /// Positional arguments in contract call order.
    pub fn positional_args(&self) -> Value {
        match self {
            Self::CreateTable { table } | Self::DropTable { table } | Self::TableSize { table } => {
                json!([table])
            }
            Self::ListTables => json!([]),
            Self::Insert(a) | Self::Update(a) => json!([a.table, a.key, a.field, a.value]),
            Self::GetValue(a) | Self::RemoveField(a) => json!([a.table, a.key, a.field]),
            Self::RemoveRecord(a) | Self::GetAllFields(a) => json!([a.table, a.key]),
            Self::InsertRecord(a) => json!([a.table, a.key, a.fields]),
            Self::InsertRecords(a) => json!([a.table, a.records]),
            Self::GetFields(a) => json!([a.table, a.key, a.fields]),
        }
    }

    /// Names used to address tables, records and fields must be non-empty.
    fn validate(&self) -> Result<(), ArgumentError> {
        let method = self.method();
        let require = |what: &str, value: &str| {
            if value.is_empty() {
                Err(ArgumentError::Invalid {
                    method,
                    reason: format!("`{what}` must not be empty"),
                })
            } else {
                Ok(())
            }
        };

        match self {
            Self::CreateTable { table } | Self::DropTable { table } | Self::TableSize { table } => {
                require("table", table)
            }
            Self::ListTables => Ok(()),
            Self::Insert(a) | Self::Update(a) => {
                require("table", &a.table)?;
                require("key", &a.key)?;
                require("field", &a.field)
            }
            Self::GetValue(a) | Self::RemoveField(a) => {
                require("table", &a.table)?;
                require("key", &a.key)?;
                require("field", &a.field)
            }
            Self::RemoveRecord(a) | Self::GetAllFields(a) => {
                require("table", &a.table)?;
                require("key", &a.key)
            }
            Self::InsertRecord(a) => {
                require("table", &a.table)?;
                require("key", &a.key)
            }
            Self::InsertRecords(a) => {
                require("table", &a.table)?;
                a.records.iter().try_for_each(|r| require("key", &r.key))
            }
            Self::GetFields(a) => {
                require("table", &a.table)?;
                require("key", &a.key)
            }
        }
    }
}

fn args<T: DeserializeOwned>(method: DbMethod, body: Value) -> Result<T, ArgumentError> {
    serde_json::from_value(body).map_err(|e| ArgumentError::Invalid {
        method,
        reason: e.to_string(),
    })
}

fn table_name(method: DbMethod, body: Value) -> Result<String, ArgumentError> {
    let parsed: TableNameBody = args(method, body)?;
    parsed
        .table_name
        .filter(|t| !t.is_empty())
        .or(parsed.table)
        .ok_or_else(|| ArgumentError::Invalid {
            method,
            reason: "missing field `table_name` (or `table`)".to_string(),
        })
}
