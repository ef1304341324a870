use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::canvas::CanvasSize;
use crate::model::Table;

/// Box metrics for a rendered table, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub min_table_width: f64,
    pub min_table_height: f64,
}

impl Default for TableMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 10.0,
            min_table_width: 200.0,
            min_table_height: 60.0,
        }
    }
}

impl TableMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Height of the draggable header strip.
    pub fn header_height(&self) -> f64 {
        self.line_height + self.header_padding * 2.0
    }

    pub fn table_size(&self, table: &Table) -> CanvasSize {
        let header_width = self.text_width(&table.name);

        // name + markers | type + "-> target.column"
        let max_col_width = table
            .columns
            .iter()
            .map(|c| {
                let mut type_text = c.typ.clone();
                if let Some(fk) = &c.foreign_key {
                    type_text.push_str(&format!(" -> {}", fk));
                }
                self.text_width(&c.name) + self.text_width(&type_text) + self.char_width * 4.0
            })
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_col_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_table_width);

        let body_height = if table.columns.is_empty() {
            0.0
        } else {
            table.columns.len() as f64 * self.line_height + self.padding_y * 2.0
        };
        let height = (self.header_height() + body_height).max(self.min_table_height);

        CanvasSize { width, height }
    }
}
