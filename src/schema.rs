//! The schema model: the single mutable source of truth for the editor.
//!
//! Every mutation validates a complete replacement value before swapping it in
//! and then recomputes the relationship projection, so readers never observe a
//! half-applied change.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::canvas::CanvasPoint;
use crate::model::{Column, ColumnFlag, ForeignKeyRef, Table, TableId};
use crate::relations::{self, Relationship};

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("No table with id `{0}`")]
    UnknownTable(TableId),
    #[error("Table id cannot change on replace (expected `{expected}`, got `{found}`)")]
    IdMismatch { expected: TableId, found: TableId },
    #[error("Table name cannot be empty")]
    EmptyTableName,
    #[error("A table named `{0}` already exists")]
    DuplicateTableName(String),
    #[error("Column name cannot be empty in table `{0}`")]
    EmptyColumnName(String),
    #[error("Column `{column}` appears more than once in table `{table}`")]
    DuplicateColumnName { table: String, column: String },
    #[error("Column index {index} out of range for table `{table}` ({len} columns)")]
    ColumnIndex {
        table: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaModel {
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from tables, validating names.
    pub fn from_tables(tables: Vec<Table>) -> Result<Self, SchemaError> {
        let mut model = Self::new();
        model.replace_all(tables)?;
        Ok(model)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.iter().find(|t| &t.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Append a starter table named `Table<N>`, `N` counting up from the
    /// table count until the name is free.
    pub fn add_table(&mut self) -> TableId {
        let names: HashSet<&str> = self.tables.iter().map(|t| t.name.as_str()).collect();
        let name = (self.tables.len() + 1..)
            .map(|n| format!("Table{}", n))
            .find(|candidate| !names.contains(candidate.as_str()))
            .unwrap_or_else(|| format!("Table{}", self.tables.len() + 1));

        let table = Table::starter(name);
        let id = table.id.clone();
        log::debug!("add table {} ({})", table.name, id);
        self.tables.push(table);
        self.recompute();
        id
    }

    /// Remove a table and clear every foreign key that named it.
    pub fn remove_table(&mut self, id: &TableId) -> Result<Table, SchemaError> {
        let index = self.index_of(id)?;
        let removed = self.tables.remove(index);

        for table in &mut self.tables {
            if let Some(cleared) = table.without_references_to(&removed.name) {
                *table = cleared;
            }
        }

        log::debug!("remove table {} ({})", removed.name, removed.id);
        self.recompute();
        Ok(removed)
    }

    /// Atomically replace a table with a new value of the same id.
    pub fn replace_table(&mut self, id: &TableId, table: Table) -> Result<(), SchemaError> {
        let index = self.index_of(id)?;
        if &table.id != id {
            return Err(SchemaError::IdMismatch {
                expected: id.clone(),
                found: table.id,
            });
        }
        validate_table(&table)?;
        if self
            .tables
            .iter()
            .any(|other| &other.id != id && other.name == table.name)
        {
            return Err(SchemaError::DuplicateTableName(table.name));
        }

        self.tables[index] = table;
        self.recompute();
        Ok(())
    }

    /// Replace the whole table set, e.g. after an import.
    pub fn replace_all(&mut self, tables: Vec<Table>) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        for table in &tables {
            validate_table(table)?;
            if !names.insert(table.name.as_str()) {
                return Err(SchemaError::DuplicateTableName(table.name.clone()));
            }
        }
        self.tables = tables;
        self.recompute();
        Ok(())
    }

    pub fn move_table(&mut self, id: &TableId, position: CanvasPoint) -> Result<(), SchemaError> {
        let moved = self.get(id)?.moved_to(position);
        self.replace_table(id, moved)
    }

    pub fn add_column(&mut self, id: &TableId, column: Column) -> Result<(), SchemaError> {
        let updated = self.get(id)?.with_column_added(column);
        self.replace_table(id, updated)
    }

    pub fn update_column(&mut self, id: &TableId, index: usize, column: Column) -> Result<(), SchemaError> {
        let updated = self.get(id)?.with_column_replaced(index, column)?;
        self.replace_table(id, updated)
    }

    pub fn remove_column(&mut self, id: &TableId, index: usize) -> Result<(), SchemaError> {
        let updated = self.get(id)?.with_column_removed(index)?;
        self.replace_table(id, updated)
    }

    pub fn toggle_flag(&mut self, id: &TableId, index: usize, flag: ColumnFlag) -> Result<(), SchemaError> {
        let updated = self.get(id)?.with_flag_toggled(index, flag)?;
        self.replace_table(id, updated)
    }

    pub fn set_foreign_key(
        &mut self,
        id: &TableId,
        index: usize,
        target: ForeignKeyRef,
    ) -> Result<(), SchemaError> {
        let updated = self.get(id)?.with_foreign_key(index, Some(target))?;
        self.replace_table(id, updated)
    }

    pub fn clear_foreign_key(&mut self, id: &TableId, index: usize) -> Result<(), SchemaError> {
        let updated = self.get(id)?.with_foreign_key(index, None)?;
        self.replace_table(id, updated)
    }

    fn get(&self, id: &TableId) -> Result<&Table, SchemaError> {
        self.table(id).ok_or_else(|| SchemaError::UnknownTable(id.clone()))
    }

    fn index_of(&self, id: &TableId) -> Result<usize, SchemaError> {
        self.tables
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| SchemaError::UnknownTable(id.clone()))
    }

    fn recompute(&mut self) {
        self.relationships = relations::resolve(&self.tables);
    }
}

fn validate_table(table: &Table) -> Result<(), SchemaError> {
    if table.name.trim().is_empty() {
        return Err(SchemaError::EmptyTableName);
    }
    let mut seen = HashSet::new();
    for column in &table.columns {
        if column.name.trim().is_empty() {
            return Err(SchemaError::EmptyColumnName(table.name.clone()));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateColumnName {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}
