//! Initial placement for imported tables.

use std::collections::{HashMap, HashSet};

use crate::measure::TableMetrics;
use crate::model::Table;

use super::CanvasPoint;

const ORIGIN: CanvasPoint = CanvasPoint::new(50.0, 50.0);
const GAP_X: f64 = 60.0;
const GAP_Y: f64 = 80.0;

/// Assign positions to `tables` in rows by foreign-key depth.
///
/// Referenced tables go on upper rows, each table one row below its deepest
/// parent. Tables caught in a cycle share a final row. Order within a row is
/// by name, so the result does not depend on input order.
pub fn arrange(tables: &mut [Table], metrics: &TableMetrics) {
    if tables.is_empty() {
        return;
    }

    let rows = arrangement(tables);
    let index_by_name: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.clone(), i))
        .collect();

    let mut y = ORIGIN.y;
    for row in rows {
        let mut x = ORIGIN.x;
        let mut row_height: f64 = 0.0;
        for name in row {
            let Some(&i) = index_by_name.get(&name) else {
                continue;
            };
            let size = metrics.table_size(&tables[i]);
            tables[i].position = CanvasPoint::new(x, y);
            x += size.width + GAP_X;
            row_height = row_height.max(size.height);
        }
        y += row_height + GAP_Y;
    }
}

/// Rows of table names, parents first.
fn arrangement(tables: &[Table]) -> Vec<Vec<String>> {
    let names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();

    // child -> parents (foreign-key targets), self references ignored
    let parents: HashMap<&str, HashSet<&str>> = tables
        .iter()
        .map(|t| {
            let deps = t
                .columns
                .iter()
                .filter_map(|c| c.foreign_key.as_ref())
                .map(|fk| fk.table.as_str())
                .filter(|target| *target != t.name && names.contains(target))
                .collect();
            (t.name.as_str(), deps)
        })
        .collect();

    let mut levels: HashMap<&str, usize> = parents
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(name, _)| (*name, 0))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (name, deps) in &parents {
            if levels.contains_key(name) {
                continue;
            }
            let parent_levels: Vec<usize> = deps.iter().filter_map(|p| levels.get(p).copied()).collect();
            if parent_levels.len() == deps.len() {
                let level = parent_levels.iter().max().copied().unwrap_or(0) + 1;
                levels.insert(*name, level);
                changed = true;
            }
        }
    }

    // circular dependencies
    let cycle_level = levels.values().copied().max().map_or(0, |m| m + 1);
    for name in &names {
        levels.entry(*name).or_insert(cycle_level);
    }

    let max_level = levels.values().copied().max().unwrap_or(0);
    let mut rows: Vec<Vec<String>> = vec![vec![]; max_level + 1];
    for (name, level) in &levels {
        rows[*level].push(name.to_string());
    }
    for row in &mut rows {
        row.sort();
    }
    rows.into_iter().filter(|r| !r.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, DEFAULT_POSITION};

    fn table(name: &str, refs: &[&str]) -> Table {
        let mut columns = vec![Column::new("id", "INT").primary_key()];
        for r in refs {
            columns.push(Column::new(format!("{}_id", r), "INT").references(*r, "id"));
        }
        Table::new(name, columns, DEFAULT_POSITION)
    }

    #[test]
    fn test_arrangement_levels() {
        let tables = vec![
            table("comments", &["posts", "users"]),
            table("posts", &["users"]),
            table("users", &[]),
            table("tags", &[]),
        ];
        let rows = arrangement(&tables);
        assert_eq!(
            rows,
            vec![
                vec!["tags".to_string(), "users".to_string()],
                vec!["posts".to_string()],
                vec!["comments".to_string()],
            ]
        );
    }

    #[test]
    fn test_cycle_goes_last() {
        let tables = vec![table("a", &["b"]), table("b", &["a"]), table("root", &[])];
        let rows = arrangement(&tables);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_arrange_positions_rows() {
        let metrics = TableMetrics::default();
        let mut tables = vec![table("posts", &["users"]), table("users", &[]), table("self_ref", &["self_ref"])];
        arrange(&mut tables, &metrics);

        let users = &tables[1];
        let self_ref = &tables[2];
        let posts = &tables[0];
        assert_eq!(self_ref.position, ORIGIN);
        assert_eq!(users.position.y, ORIGIN.y);
        assert!(users.position.x > self_ref.position.x);
        assert!(posts.position.y > users.position.y);
    }
}
