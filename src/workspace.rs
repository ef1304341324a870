//! The editing session: model, canvas state, import and export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::{
    CanvasViewport, DragController, PointerEvent, Scene, ViewportConfig, ViewportConfigError, WheelEvent,
};
use crate::measure::TableMetrics;
use crate::model::{Table, TableId};
use crate::relations::Relationship;
use crate::schema::{SchemaError, SchemaModel};
use crate::sink::{OutputSink, SinkError};
use crate::sql::{self, ClauseError, Dialect, GenerationError, ParseError};

/// Name of the exported file.
pub const EXPORT_FILE_NAME: &str = "schema.sql";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import was superseded by a newer one")]
    Superseded,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to generate SQL: {0}")]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Handle for one pending import. Only the most recently issued ticket can
/// complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTicket(u32);

impl ImportTicket {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl From<u32> for ImportTicket {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub tables: usize,
    pub relationships: usize,
    pub diagnostics: Vec<ClauseError>,
}

/// JSON view of a model and the clauses skipped while importing it.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub tables: &'a [Table],
    pub relationships: &'a [Relationship],
    pub diagnostics: Vec<String>,
}

impl<'a> Report<'a> {
    pub fn new(model: &'a SchemaModel, diagnostics: &[ClauseError]) -> Self {
        Self {
            tables: model.tables(),
            relationships: model.relationships(),
            diagnostics: diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub dialect: Dialect,
    pub viewport: ViewportConfig,
    pub metrics: TableMetrics,
}

impl WorkspaceConfig {
    pub fn validate(&self) -> Result<(), ViewportConfigError> {
        self.viewport.validate()
    }
}

#[derive(Debug, Default)]
pub struct Workspace {
    model: SchemaModel,
    dialect: Dialect,
    viewport: CanvasViewport,
    drag: DragController,
    metrics: TableMetrics,
    last_ticket: u32,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            model: SchemaModel::new(),
            dialect: config.dialect,
            viewport: CanvasViewport::new(config.viewport),
            drag: DragController::new(),
            metrics: config.metrics,
            last_ticket: 0,
        }
    }

    pub fn model(&self) -> &SchemaModel {
        &self.model
    }

    /// Direct model access, e.g. for committing a `TableEditor`.
    pub fn model_mut(&mut self) -> &mut SchemaModel {
        &mut self.model
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub fn viewport(&self) -> &CanvasViewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut CanvasViewport {
        &mut self.viewport
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn metrics(&self) -> &TableMetrics {
        &self.metrics
    }

    /// Start an import. Any ticket issued earlier becomes stale.
    pub fn begin_import(&mut self) -> ImportTicket {
        self.last_ticket = self.last_ticket.wrapping_add(1);
        ImportTicket(self.last_ticket)
    }

    /// Parse `text` and replace the whole model with the result.
    ///
    /// Nothing changes if the ticket is stale or parsing fails.
    pub fn finish_import(&mut self, ticket: ImportTicket, text: &str) -> Result<ImportSummary, ImportError> {
        if ticket.0 != self.last_ticket {
            log::info!("dropping import {} (latest is {})", ticket.0, self.last_ticket);
            return Err(ImportError::Superseded);
        }

        let parsed = sql::parse_sql_with_metrics(text, self.dialect, &self.metrics)?;
        self.model.replace_all(parsed.tables)?;
        self.drag = DragController::new();

        let summary = ImportSummary {
            tables: self.model.tables().len(),
            relationships: self.model.relationships().len(),
            diagnostics: parsed.diagnostics,
        };
        log::info!(
            "imported {} table(s), {} relationship(s), {} skipped clause(s)",
            summary.tables,
            summary.relationships,
            summary.diagnostics.len()
        );
        Ok(summary)
    }

    /// `begin_import` and `finish_import` in one step.
    pub fn import(&mut self, text: &str) -> Result<ImportSummary, ImportError> {
        let ticket = self.begin_import();
        self.finish_import(ticket, text)
    }

    pub fn generate(&self, now: DateTime<Utc>) -> Result<String, GenerationError> {
        sql::generate(self.model.tables(), self.dialect, now)
    }

    /// Generate DDL and hand it to `sink` as `schema.sql`.
    pub fn export(&self, sink: &mut dyn OutputSink, now: DateTime<Utc>) -> Result<usize, ExportError> {
        let text = self.generate(now)?;
        sink.save(EXPORT_FILE_NAME, text.as_bytes())?;
        log::info!("exported {} table(s) as {}", self.model.tables().len(), self.dialect);
        Ok(text.len())
    }

    pub fn add_table(&mut self) -> TableId {
        self.model.add_table()
    }

    pub fn remove_table(&mut self, id: &TableId) -> Result<Table, SchemaError> {
        self.model.remove_table(id)
    }

    /// Returns `true` if the model or viewport changed.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<bool, SchemaError> {
        self.drag
            .handle(event, &mut self.model, &mut self.viewport, &self.metrics)
    }

    pub fn wheel(&mut self, event: WheelEvent) -> bool {
        self.viewport.wheel(event)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
    }

    pub fn scene(&self) -> Scene {
        Scene::build(&self.model, &self.viewport, &self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasPoint, PointerButton, ScreenPoint};
    use crate::editor::TableEditor;
    use crate::sink::MemorySink;
    use chrono::TimeZone;
    use indoc::indoc;

    const PETS: &str = indoc! {"
        CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50) NOT NULL);
        CREATE TABLE pets (
            id INT PRIMARY KEY,
            owner_id INT,
            FOREIGN KEY (owner_id) REFERENCES users(id)
        );
    "};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_config_from_json_is_validated() {
        let config: WorkspaceConfig =
            serde_json::from_str(r#"{"viewport": {"minZoom": 3.0, "maxZoom": 1.0}}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ViewportConfigError::ZoomRange { .. })
        ));

        // constructing with it anyway stays within the configured bounds
        let mut ws = Workspace::new(config);
        ws.viewport_mut().zoom_in();
        assert_eq!(ws.viewport().zoom(), 3.0);
    }

    #[test]
    fn test_import_replaces_model() {
        let mut ws = Workspace::default();
        ws.add_table();
        let summary = ws.import(PETS).unwrap();
        assert_eq!(summary.tables, 2);
        assert_eq!(summary.relationships, 1);
        assert!(ws.model().table_by_name("Table1").is_none());

        let rel = &ws.model().relationships()[0];
        assert_eq!(
            (rel.from_table.as_str(), rel.from_column.as_str(), rel.to_table.as_str(), rel.to_column.as_str()),
            ("pets", "owner_id", "users", "id")
        );
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut ws = Workspace::default();
        let first = ws.begin_import();
        let second = ws.begin_import();

        ws.finish_import(second, "CREATE TABLE b (id INT);").unwrap();
        let err = ws.finish_import(first, PETS).unwrap_err();
        assert!(matches!(err, ImportError::Superseded));
        assert_eq!(ws.model().tables().len(), 1);
        assert_eq!(ws.model().tables()[0].name, "b");
    }

    #[test]
    fn test_failed_import_leaves_model_unchanged() {
        let mut ws = Workspace::default();
        ws.import(PETS).unwrap();
        let before = ws.model().clone();

        let err = ws.import("SELECT * FROM users;").unwrap_err();
        assert!(matches!(err, ImportError::Parse(ParseError::NoTableStatements)));
        assert_eq!(ws.model().tables(), before.tables());
    }

    #[test]
    fn test_export_writes_schema_sql() {
        let mut ws = Workspace::new(WorkspaceConfig {
            dialect: Dialect::MySQL,
            ..Default::default()
        });
        ws.import(PETS).unwrap();

        let mut sink = MemorySink::new();
        let written = ws.export(&mut sink, now()).unwrap();
        let bytes = sink.get(EXPORT_FILE_NAME).unwrap();
        assert_eq!(bytes.len(), written);

        let text = std::str::from_utf8(bytes).unwrap();
        assert!(text.contains("-- Dialect: MySQL"));
        assert!(text.contains("-- Generated at: 2024-01-02T03:04:05.000Z"));
        assert!(text.find("CREATE TABLE users").unwrap() < text.find("CREATE TABLE pets").unwrap());
    }

    struct FailingSink;

    impl OutputSink for FailingSink {
        fn save(&mut self, _name: &str, _bytes: &[u8]) -> Result<(), SinkError> {
            Err(SinkError::Rejected("disk full".to_string()))
        }
    }

    #[test]
    fn test_export_failures_are_reported() {
        let mut ws = Workspace::default();
        ws.import(PETS).unwrap();
        let before = ws.model().clone();

        let err = ws.export(&mut FailingSink, now()).unwrap_err();
        assert!(matches!(err, ExportError::Sink(_)));
        assert_eq!(err.to_string(), "Output rejected: disk full");
        assert_eq!(ws.model().tables(), before.tables());
    }

    #[test]
    fn test_pointer_drag_moves_table() {
        let mut ws = Workspace::default();
        let id = ws.add_table();
        ws.wheel(WheelEvent {
            delta_y: -1.0,
            modifier: true,
            position: Some(ScreenPoint::new(0.0, 0.0)),
        });
        let zoom = ws.viewport().zoom();

        let start = ws.model().table(&id).unwrap().position;
        let grab = ws.viewport().to_screen(CanvasPoint::new(start.x + 5.0, start.y + 5.0));
        ws.pointer(PointerEvent::Down {
            position: grab,
            button: PointerButton::Primary,
        })
        .unwrap();
        ws.pointer(PointerEvent::Move {
            position: ScreenPoint::new(grab.x + 22.0, grab.y - 11.0),
        })
        .unwrap();
        ws.pointer(PointerEvent::Up).unwrap();

        let end = ws.model().table(&id).unwrap().position;
        assert!((end.x - start.x - 22.0 / zoom).abs() < 1e-9);
        assert!((end.y - start.y + 11.0 / zoom).abs() < 1e-9);
        assert!(ws.drag().is_idle());
    }

    #[test]
    fn test_editor_commit_through_workspace() {
        let mut ws = Workspace::default();
        ws.import(PETS).unwrap();
        let pets = ws.model().table_by_name("pets").unwrap().id.clone();

        let mut editor = TableEditor::open(ws.model(), &pets).unwrap();
        editor.clear_foreign_key(1).unwrap();
        editor.commit(ws.model_mut()).unwrap();
        assert!(ws.model().relationships().is_empty());
    }

    #[test]
    fn test_report_json() {
        let mut ws = Workspace::default();
        let summary = ws
            .import("CREATE TABLE t (id INT PRIMARY KEY, broken, other_id INT REFERENCES t(id));")
            .unwrap();
        let json = serde_json::to_value(Report::new(ws.model(), &summary.diagnostics)).unwrap();
        assert_eq!(json["tables"][0]["name"], "t");
        assert_eq!(json["tables"][0]["columns"][0]["primaryKey"], true);
        assert_eq!(json["relationships"][0]["toTable"], "t");
        assert_eq!(json["diagnostics"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_table_updates_scene() {
        let mut ws = Workspace::default();
        ws.import(PETS).unwrap();
        assert_eq!(ws.scene().edges.len(), 1);

        let users = ws.model().table_by_name("users").unwrap().id.clone();
        ws.remove_table(&users).unwrap();
        let scene = ws.scene();
        assert_eq!(scene.tables.len(), 1);
        assert!(scene.edges.is_empty());
    }
}
