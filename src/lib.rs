pub mod canvas;
pub mod editor;
pub mod measure;
pub mod model;
pub mod relations;
pub mod schema;
pub mod sink;
pub mod sql;
pub mod workspace;

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use canvas::{PointerButton, PointerEvent, ScreenPoint, WheelEvent};
use editor::TableEditor;
use model::{Table, TableId};
use schema::SchemaModel;
use sink::{OutputSink, SinkError};
use sql::Dialect;
use workspace::{Report, Workspace, WorkspaceConfig};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn dialect_named(name: &str) -> Result<Dialect, String> {
    Dialect::from_str(name).ok_or_else(|| format!("Unknown dialect: {}", name))
}

/// Explicit dialect name, or a guess from the text when none is given.
fn resolve_dialect(dialect: Option<String>, text: &str) -> Result<Dialect, String> {
    match dialect {
        Some(name) => dialect_named(&name),
        None => Ok(Dialect::detect(text)),
    }
}

fn named_dialect(dialect: Option<String>) -> Result<Dialect, String> {
    dialect.map_or(Ok(Dialect::default()), |name| dialect_named(&name))
}

/// Accepts the `{ "tables": [...] }` shape returned by `parseSql`.
#[derive(Deserialize)]
struct TablesInput {
    tables: Vec<Table>,
}

fn model_from_json(json: &str) -> Result<SchemaModel, String> {
    let input: TablesInput = serde_json::from_str(json).map_err(|e| e.to_string())?;
    SchemaModel::from_tables(input.tables).map_err(|e| e.to_string())
}

/// Calls a JavaScript `(name, bytes) => void` function.
struct JsSink<'a> {
    save: &'a js_sys::Function,
}

impl OutputSink for JsSink<'_> {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError> {
        let data = js_sys::Uint8Array::from(bytes);
        self.save
            .call2(&JsValue::NULL, &JsValue::from_str(name), &data)
            .map_err(|e| SinkError::Rejected(e.as_string().unwrap_or_else(|| format!("{:?}", e))))?;
        Ok(())
    }
}

/// Parse SQL DDL into `{ tables, relationships, diagnostics }` JSON
#[wasm_bindgen(js_name = "parseSql")]
pub fn parse_sql(input: &str, dialect: Option<String>) -> Result<String, String> {
    let dialect = resolve_dialect(dialect, input)?;
    let parsed = sql::parse_sql(input, dialect).map_err(|e| e.to_string())?;
    let model = SchemaModel::from_tables(parsed.tables).map_err(|e| e.to_string())?;
    serde_json::to_string(&Report::new(&model, &parsed.diagnostics)).map_err(|e| e.to_string())
}

/// Generate SQL DDL from model JSON
#[wasm_bindgen(js_name = "generateSql")]
pub fn generate_sql(model: &str, dialect: Option<String>) -> Result<String, String> {
    let dialect = named_dialect(dialect)?;
    let model = model_from_json(model)?;
    sql::generate(model.tables(), dialect, chrono::Utc::now()).map_err(|e| e.to_string())
}

/// Generate SQL DDL from model JSON and pass `schema.sql` to `save(name, bytes)`
#[wasm_bindgen(js_name = "exportSql")]
pub fn export_sql(model: &str, dialect: Option<String>, save: &js_sys::Function) -> Result<usize, String> {
    let mut workspace = Workspace::new(WorkspaceConfig {
        dialect: named_dialect(dialect)?,
        ..Default::default()
    });
    *workspace.model_mut() = model_from_json(model)?;
    workspace
        .export(&mut JsSink { save }, chrono::Utc::now())
        .map_err(|e| e.to_string())
}

/// Interactive editing session for a canvas element.
#[wasm_bindgen]
pub struct SchemaCanvas {
    workspace: Workspace,
}

#[wasm_bindgen]
impl SchemaCanvas {
    /// `config` is optional JSON: `{ dialect, viewport: {...}, metrics: {...} }`
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<SchemaCanvas, String> {
        let config: WorkspaceConfig = match config {
            Some(json) => serde_json::from_str(&json).map_err(|e| e.to_string())?,
            None => WorkspaceConfig::default(),
        };
        config.validate().map_err(|e| e.to_string())?;
        Ok(Self {
            workspace: Workspace::new(config),
        })
    }

    pub fn dialect(&self) -> String {
        self.workspace.dialect().as_str().to_string()
    }

    #[wasm_bindgen(js_name = "setDialect")]
    pub fn set_dialect(&mut self, dialect: &str) -> Result<(), String> {
        self.workspace.set_dialect(dialect_named(dialect)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "beginImport")]
    pub fn begin_import(&mut self) -> u32 {
        self.workspace.begin_import().id()
    }

    /// Returns the report JSON for the new model
    #[wasm_bindgen(js_name = "finishImport")]
    pub fn finish_import(&mut self, ticket: u32, text: &str) -> Result<String, String> {
        let summary = self
            .workspace
            .finish_import(ticket.into(), text)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&Report::new(self.workspace.model(), &summary.diagnostics))
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "exportSql")]
    pub fn export_sql(&self, save: &js_sys::Function) -> Result<usize, String> {
        self.workspace
            .export(&mut JsSink { save }, chrono::Utc::now())
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "generateSql")]
    pub fn generate_sql(&self) -> Result<String, String> {
        self.workspace
            .generate(chrono::Utc::now())
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "addTable")]
    pub fn add_table(&mut self) -> String {
        self.workspace.add_table().to_string()
    }

    #[wasm_bindgen(js_name = "removeTable")]
    pub fn remove_table(&mut self, id: &str) -> Result<(), String> {
        self.workspace
            .remove_table(&TableId::from(id))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "renameTable")]
    pub fn rename_table(&mut self, id: &str, name: &str) -> Result<(), String> {
        let mut editor =
            TableEditor::open(self.workspace.model(), &TableId::from(id)).map_err(|e| e.to_string())?;
        editor.rename(name);
        editor
            .commit(self.workspace.model_mut())
            .map_err(|e| e.to_string())
    }

    /// Replace a table with an edited copy (table JSON, same id).
    #[wasm_bindgen(js_name = "replaceTable")]
    pub fn replace_table(&mut self, table: &str) -> Result<(), String> {
        let table: Table = serde_json::from_str(table).map_err(|e| e.to_string())?;
        let id = table.id.clone();
        self.workspace
            .model_mut()
            .replace_table(&id, table)
            .map_err(|e| e.to_string())
    }

    /// Legal foreign-key targets for a table, as `[{ table, column }]` JSON
    #[wasm_bindgen(js_name = "foreignKeyTargets")]
    pub fn foreign_key_targets(&self, id: &str) -> Result<String, String> {
        let editor =
            TableEditor::open(self.workspace.model(), &TableId::from(id)).map_err(|e| e.to_string())?;
        serde_json::to_string(&editor.foreign_key_targets(self.workspace.model()))
            .map_err(|e| e.to_string())
    }

    /// Returns true if a redraw is needed
    #[wasm_bindgen(js_name = "pointerDown")]
    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16) -> Result<bool, String> {
        let Some(button) = PointerButton::from_code(button) else {
            return Ok(false);
        };
        self.pointer(PointerEvent::Down {
            position: ScreenPoint::new(x, y),
            button,
        })
    }

    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<bool, String> {
        self.pointer(PointerEvent::Move {
            position: ScreenPoint::new(x, y),
        })
    }

    #[wasm_bindgen(js_name = "pointerUp")]
    pub fn pointer_up(&mut self) -> Result<bool, String> {
        self.pointer(PointerEvent::Up)
    }

    #[wasm_bindgen(js_name = "pointerLeave")]
    pub fn pointer_leave(&mut self) -> Result<bool, String> {
        self.pointer(PointerEvent::Leave)
    }

    /// Returns true if the zoom changed
    pub fn wheel(&mut self, delta_y: f64, modifier: bool, x: Option<f64>, y: Option<f64>) -> bool {
        let position = x.zip(y).map(|(x, y)| ScreenPoint::new(x, y));
        self.workspace.wheel(WheelEvent {
            delta_y,
            modifier,
            position,
        })
    }

    #[wasm_bindgen(js_name = "zoomIn")]
    pub fn zoom_in(&mut self) {
        self.workspace.viewport_mut().zoom_in();
    }

    #[wasm_bindgen(js_name = "zoomOut")]
    pub fn zoom_out(&mut self) {
        self.workspace.viewport_mut().zoom_out();
    }

    pub fn zoom(&self) -> f64 {
        self.workspace.viewport().zoom()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.workspace.resize(width, height);
    }

    /// Screen-space tables and edges for the current frame, as JSON
    pub fn scene(&self) -> Result<String, String> {
        serde_json::to_string(&self.workspace.scene()).map_err(|e| e.to_string())
    }

    /// Tables and relationships as JSON
    pub fn model(&self) -> Result<String, String> {
        serde_json::to_string(&Report::new(self.workspace.model(), &[])).map_err(|e| e.to_string())
    }
}

impl SchemaCanvas {
    fn pointer(&mut self, event: PointerEvent) -> Result<bool, String> {
        self.workspace.pointer(event).map_err(|e| e.to_string())
    }
}
