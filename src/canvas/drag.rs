//! Pointer state machine: dragging tables and panning the canvas.

use crate::measure::TableMetrics;
use crate::model::TableId;
use crate::schema::{SchemaError, SchemaModel};

use super::{CanvasPoint, CanvasRect, CanvasSize, CanvasViewport, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    /// Wheel button; starts a pan
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        position: ScreenPoint,
        button: PointerButton,
    },
    Move {
        position: ScreenPoint,
    },
    Up,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    DraggingTable {
        table_id: TableId,
        /// Pointer canvas position minus table top-left at grab time
        grab_offset: CanvasPoint,
    },
    Panning {
        last: ScreenPoint,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// Feed one pointer event. Returns `true` if the model or viewport changed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        model: &mut SchemaModel,
        viewport: &mut CanvasViewport,
        metrics: &TableMetrics,
    ) -> Result<bool, SchemaError> {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_down(position, button, model, viewport, metrics);
                Ok(false)
            }
            PointerEvent::Move { position } => self.pointer_move(position, model, viewport),
            PointerEvent::Up | PointerEvent::Leave => {
                self.state = DragState::Idle;
                Ok(false)
            }
        }
    }

    fn pointer_down(
        &mut self,
        position: ScreenPoint,
        button: PointerButton,
        model: &SchemaModel,
        viewport: &CanvasViewport,
        metrics: &TableMetrics,
    ) {
        // a gesture is already in progress
        if !self.is_idle() {
            return;
        }

        match button {
            PointerButton::Primary => {
                let pointer = viewport.to_canvas(position);
                if let Some(table_id) = header_hit(model, metrics, pointer) {
                    let Some(table) = model.table(&table_id) else {
                        return;
                    };
                    let grab_offset = pointer.offset_from(table.position);
                    log::debug!("start dragging {}", table.name);
                    self.state = DragState::DraggingTable {
                        table_id,
                        grab_offset,
                    };
                }
            }
            PointerButton::Middle => {
                self.state = DragState::Panning { last: position };
            }
            PointerButton::Secondary => {}
        }
    }

    fn pointer_move(
        &mut self,
        position: ScreenPoint,
        model: &mut SchemaModel,
        viewport: &mut CanvasViewport,
    ) -> Result<bool, SchemaError> {
        match &mut self.state {
            DragState::Idle => Ok(false),
            DragState::Panning { last } => {
                viewport.pan_by(position.x - last.x, position.y - last.y);
                *last = position;
                Ok(true)
            }
            DragState::DraggingTable {
                table_id,
                grab_offset,
            } => {
                let target = viewport.to_canvas(position).offset_from(*grab_offset);
                match model.move_table(table_id, target) {
                    Ok(()) => Ok(true),
                    Err(SchemaError::UnknownTable(_)) => {
                        self.state = DragState::Idle;
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

/// Topmost table whose header strip contains `pointer`.
fn header_hit(model: &SchemaModel, metrics: &TableMetrics, pointer: CanvasPoint) -> Option<TableId> {
    model
        .tables()
        .iter()
        .rev()
        .find(|table| {
            let header = CanvasRect {
                origin: table.position,
                size: CanvasSize {
                    width: metrics.table_size(table).width,
                    height: metrics.header_height(),
                },
            };
            header.contains(pointer)
        })
        .map(|table| table.id.clone())
}
