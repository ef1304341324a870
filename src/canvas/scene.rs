//! Screen-space projection of the model for the rendering host.

use std::collections::HashMap;

use serde::Serialize;

use crate::measure::TableMetrics;
use crate::model::{Table, TableId};
use crate::schema::SchemaModel;

use super::{CanvasPoint, CanvasRect, CanvasViewport, ScreenPoint, ScreenRect};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneTable {
    pub id: TableId,
    pub name: String,
    pub rect: ScreenRect,
    pub header_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEdge {
    pub relationship_id: String,
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub zoom: f64,
    pub tables: Vec<SceneTable>,
    pub edges: Vec<SceneEdge>,
}

impl Scene {
    pub fn build(model: &SchemaModel, viewport: &CanvasViewport, metrics: &TableMetrics) -> Self {
        let rects: HashMap<&str, CanvasRect> = model
            .tables()
            .iter()
            .map(|t| (t.name.as_str(), table_rect(t, metrics)))
            .collect();

        let tables = model
            .tables()
            .iter()
            .map(|t| SceneTable {
                id: t.id.clone(),
                name: t.name.clone(),
                rect: viewport.rect_to_screen(table_rect(t, metrics)),
                header_height: metrics.header_height() * viewport.zoom(),
            })
            .collect();

        let anchor_y = metrics.header_height() / 2.0;
        let edges = model
            .relationships()
            .iter()
            .filter_map(|rel| {
                let from_rect = rects.get(rel.from_table.as_str())?;
                let to_rect = rects.get(rel.to_table.as_str())?;
                let from = CanvasPoint::new(
                    from_rect.origin.x + from_rect.size.width,
                    from_rect.origin.y + anchor_y,
                );
                let to = CanvasPoint::new(to_rect.origin.x, to_rect.origin.y + anchor_y);
                Some(SceneEdge {
                    relationship_id: rel.id.clone(),
                    from: viewport.to_screen(from),
                    to: viewport.to_screen(to),
                })
            })
            .collect();

        Scene {
            zoom: viewport.zoom(),
            tables,
            edges,
        }
    }
}

fn table_rect(table: &Table, metrics: &TableMetrics) -> CanvasRect {
    CanvasRect {
        origin: table.position,
        size: metrics.table_size(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    fn model() -> SchemaModel {
        SchemaModel::from_tables(vec![
            Table::new(
                "users",
                vec![Column::new("id", "INT").primary_key()],
                CanvasPoint::new(0.0, 0.0),
            ),
            Table::new(
                "posts",
                vec![Column::new("author_id", "INT").references("users", "id")],
                CanvasPoint::new(400.0, 100.0),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_scene_follows_viewport() {
        let model = model();
        let metrics = TableMetrics::default();
        let mut vp = CanvasViewport::default();
        vp.pan_by(10.0, 20.0);
        vp.zoom_by(2.0, ScreenPoint::new(0.0, 0.0));

        let scene = Scene::build(&model, &vp, &metrics);
        assert_eq!(scene.tables.len(), 2);
        let posts = &scene.tables[1];
        assert_eq!(posts.rect.x, vp.to_screen(CanvasPoint::new(400.0, 100.0)).x);
        assert_eq!(posts.rect.width, metrics.table_size(&model.tables()[1]).width * 2.0);

        assert_eq!(scene.edges.len(), 1);
        let edge = &scene.edges[0];
        let expected_to = vp.to_screen(CanvasPoint::new(0.0, metrics.header_height() / 2.0));
        assert_eq!(edge.to, expected_to);
        assert!(edge.from.x > expected_to.x);
    }

    #[test]
    fn test_scene_json() {
        let scene = Scene::build(&model(), &CanvasViewport::default(), &TableMetrics::default());
        let json = serde_json::to_value(&scene).unwrap();
        assert!(json["edges"][0]["relationshipId"].is_string());
        assert_eq!(json["tables"][0]["name"], "users");
    }
}
