//! Schema model values: tables, columns and foreign-key references.
//!
//! Every helper on [`Table`] is pure: it takes the current value and returns a
//! new one. Callers swap the result into the model with
//! [`SchemaModel::replace_table`](crate::schema::SchemaModel::replace_table).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canvas::CanvasPoint;
use crate::schema::SchemaError;

/// Position given to tables created by "add table".
pub const DEFAULT_POSITION: CanvasPoint = CanvasPoint { x: 50.0, y: 50.0 };

/// Type given to columns added from the editor.
pub const DEFAULT_COLUMN_TYPE: &str = "VARCHAR";

/// Stable table identifier, generated once on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    pub fn generate() -> Self {
        Self(format!("table-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TableId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named reference to `table(column)`. Not an ownership link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Canonical uppercase type name
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            primary_key: false,
            not_null: false,
            foreign_key: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef::new(table, column));
        self
    }

    pub fn flag(&self, flag: ColumnFlag) -> bool {
        match flag {
            ColumnFlag::PrimaryKey => self.primary_key,
            ColumnFlag::NotNull => self.not_null,
        }
    }

    fn set_flag(&mut self, flag: ColumnFlag, value: bool) {
        match flag {
            ColumnFlag::PrimaryKey => self.primary_key = value,
            ColumnFlag::NotNull => self.not_null = value,
        }
    }
}

/// Boolean column attributes that can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnFlag {
    PrimaryKey,
    NotNull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<Column>,
    pub position: CanvasPoint,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>, position: CanvasPoint) -> Self {
        Self {
            id: TableId::generate(),
            name: name.into(),
            columns,
            position,
        }
    }

    /// Table created by the "add table" action.
    pub fn starter(name: impl Into<String>) -> Self {
        Self::new(
            name,
            vec![
                Column::new("id", "INT").primary_key().not_null(),
                Column::new("created_at", "TIMESTAMP"),
            ],
            DEFAULT_POSITION,
        )
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_foreign_keys(&self) -> bool {
        self.columns.iter().any(|c| c.foreign_key.is_some())
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Same name, same columns in order. Ignores id and position.
    pub fn same_definition(&self, other: &Table) -> bool {
        self.name == other.name && self.columns == other.columns
    }

    pub fn renamed(&self, name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn moved_to(&self, position: CanvasPoint) -> Table {
        Table {
            position,
            ..self.clone()
        }
    }

    pub fn with_column_added(&self, column: Column) -> Table {
        let mut columns = self.columns.clone();
        columns.push(column);
        Table {
            columns,
            ..self.clone()
        }
    }

    pub fn with_column_replaced(&self, index: usize, column: Column) -> Result<Table, SchemaError> {
        self.map_column(index, |c| *c = column)
    }

    pub fn with_column_removed(&self, index: usize) -> Result<Table, SchemaError> {
        self.check_index(index)?;
        let mut columns = self.columns.clone();
        columns.remove(index);
        Ok(Table {
            columns,
            ..self.clone()
        })
    }

    pub fn with_flag_toggled(&self, index: usize, flag: ColumnFlag) -> Result<Table, SchemaError> {
        self.map_column(index, |c| {
            let current = c.flag(flag);
            c.set_flag(flag, !current);
        })
    }

    pub fn with_flag(&self, index: usize, flag: ColumnFlag, value: bool) -> Result<Table, SchemaError> {
        self.map_column(index, |c| c.set_flag(flag, value))
    }

    pub fn with_foreign_key(
        &self,
        index: usize,
        foreign_key: Option<ForeignKeyRef>,
    ) -> Result<Table, SchemaError> {
        self.map_column(index, |c| c.foreign_key = foreign_key)
    }

    /// Clears every foreign key that targets `table_name`. `None` if nothing changed.
    pub fn without_references_to(&self, table_name: &str) -> Option<Table> {
        if !self
            .columns
            .iter()
            .any(|c| c.foreign_key.as_ref().is_some_and(|fk| fk.table == table_name))
        {
            return None;
        }
        let columns = self
            .columns
            .iter()
            .map(|c| match &c.foreign_key {
                Some(fk) if fk.table == table_name => Column {
                    foreign_key: None,
                    ..c.clone()
                },
                _ => c.clone(),
            })
            .collect();
        Some(Table {
            columns,
            ..self.clone()
        })
    }

    fn check_index(&self, index: usize) -> Result<(), SchemaError> {
        if index < self.columns.len() {
            Ok(())
        } else {
            Err(SchemaError::ColumnIndex {
                table: self.name.clone(),
                index,
                len: self.columns.len(),
            })
        }
    }

    fn map_column(&self, index: usize, f: impl FnOnce(&mut Column)) -> Result<Table, SchemaError> {
        self.check_index(index)?;
        let mut columns = self.columns.clone();
        f(&mut columns[index]);
        Ok(Table {
            columns,
            ..self.clone()
        })
    }
}
