//! Relationship projection derived from column foreign keys.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl Relationship {
    pub fn touches(&self, table_name: &str) -> bool {
        self.from_table == table_name || self.to_table == table_name
    }
}

/// Recompute the relationship set from scratch.
///
/// One record per column whose foreign key names a table present in `tables`,
/// in table order then column order. The result depends only on `tables`.
pub fn resolve(tables: &[Table]) -> Vec<Relationship> {
    let table_names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();

    tables
        .iter()
        .flat_map(|table| {
            let table_names = &table_names;
            table.columns.iter().filter_map(move |column| {
                let fk = column.foreign_key.as_ref()?;
                if !table_names.contains(fk.table.as_str()) {
                    return None;
                }
                Some(Relationship {
                    id: format!("rel-{}-{}", table.id, column.name),
                    from_table: table.name.clone(),
                    from_column: column.name.clone(),
                    to_table: fk.table.clone(),
                    to_column: fk.column.clone(),
                })
            })
        })
        .collect()
}
