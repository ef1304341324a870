//! Editing session for a single table.
//!
//! The editor works on a private copy. Nothing reaches the [`SchemaModel`]
//! until [`TableEditor::commit`], which goes through `replace_table` and so
//! gets the same validation as every other mutation.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Column, ColumnFlag, DEFAULT_COLUMN_TYPE, ForeignKeyRef, Table, TableId};
use crate::schema::{SchemaError, SchemaModel};

/// Types offered for a column, grouped by category.
pub const COLUMN_TYPES: &[(&str, &[&str])] = &[
    ("numeric", &["INT", "BIGINT", "DECIMAL", "FLOAT", "DOUBLE"]),
    ("text", &["VARCHAR", "TEXT", "CHAR"]),
    ("date", &["DATE", "TIMESTAMP", "TIME"]),
    ("binary", &["BLOB", "BINARY"]),
    ("boolean", &["BOOLEAN"]),
];

#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error("`{0}` is not a primary-key column of another table")]
    IllegalForeignKey(ForeignKeyRef),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone)]
pub struct TableEditor {
    original: Table,
    draft: Table,
}

impl TableEditor {
    pub fn open(model: &SchemaModel, id: &TableId) -> Result<Self, EditorError> {
        let table = model
            .table(id)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownTable(id.clone()))?;
        Ok(Self {
            original: table.clone(),
            draft: table,
        })
    }

    /// The working copy.
    pub fn table(&self) -> &Table {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.original
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.draft = self.draft.renamed(name);
    }

    /// Append a `VARCHAR` column with a fresh `column<N>` name and return its index.
    pub fn add_column(&mut self) -> usize {
        let names: HashSet<&str> = self.draft.columns.iter().map(|c| c.name.as_str()).collect();
        let mut n = self.draft.columns.len() + 1;
        while names.contains(format!("column{}", n).as_str()) {
            n += 1;
        }
        let column = Column::new(format!("column{}", n), DEFAULT_COLUMN_TYPE);
        self.draft = self.draft.with_column_added(column);
        self.draft.columns.len() - 1
    }

    pub fn update_column(&mut self, index: usize, column: Column) -> Result<(), EditorError> {
        self.draft = self.draft.with_column_replaced(index, column)?;
        Ok(())
    }

    pub fn remove_column(&mut self, index: usize) -> Result<(), EditorError> {
        self.draft = self.draft.with_column_removed(index)?;
        Ok(())
    }

    pub fn toggle_flag(&mut self, index: usize, flag: ColumnFlag) -> Result<(), EditorError> {
        self.draft = self.draft.with_flag_toggled(index, flag)?;
        Ok(())
    }

    /// Primary-key columns of every other table, in model order.
    pub fn foreign_key_targets(&self, model: &SchemaModel) -> Vec<ForeignKeyRef> {
        model
            .tables()
            .iter()
            .filter(|t| t.id != self.draft.id)
            .flat_map(|t| {
                t.primary_key_columns()
                    .map(|c| ForeignKeyRef::new(&t.name, &c.name))
            })
            .collect()
    }

    pub fn set_foreign_key(
        &mut self,
        model: &SchemaModel,
        index: usize,
        target: ForeignKeyRef,
    ) -> Result<(), EditorError> {
        if !self.foreign_key_targets(model).contains(&target) {
            return Err(EditorError::IllegalForeignKey(target));
        }
        self.draft = self.draft.with_foreign_key(index, Some(target))?;
        Ok(())
    }

    pub fn clear_foreign_key(&mut self, index: usize) -> Result<(), EditorError> {
        self.draft = self.draft.with_foreign_key(index, None)?;
        Ok(())
    }

    /// Write the working copy back. On error the model and the session are
    /// both unchanged, so the caller can fix the draft and retry.
    pub fn commit(&self, model: &mut SchemaModel) -> Result<(), EditorError> {
        // the table may have been dragged while the session was open
        let position = model
            .table(&self.draft.id)
            .map(|t| t.position)
            .unwrap_or(self.draft.position);
        model.replace_table(&self.draft.id, self.draft.moved_to(position))?;
        log::debug!("committed edit of table {}", self.draft.name);
        Ok(())
    }

    pub fn discard(self) {
        log::debug!("discarded edit of table {}", self.original.name);
    }
}
