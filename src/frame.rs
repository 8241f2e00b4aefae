use crate::entities::{AgentKind, Progress};
use crate::landscape::{Cell, Position};
use crate::status::{FinishedReason, Milestone, StatusNote};
use serde::Serialize;

/// Everything a renderer needs to draw one tick.
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    /// Number of grid rows.
    pub rows: usize,
    /// Number of grid columns.
    pub cols: usize,
    /// Terrain tags in row-major order.
    pub cells: Vec<Cell>,
    /// The agents in collection order.
    pub agents: Vec<AgentView>,
    /// Meters, counts and the narrative note.
    pub status: Status,
    /// Events that fired during this tick.
    pub milestones: Vec<Milestone>,
    /// Whether the run has finished.
    pub finished: bool,
    /// The reason the run finished. `None` while it is still going.
    pub finished_reason: Option<FinishedReason>,
}

impl Frame {
    /// The terrain tag at (row, col), if it is on the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }
}

/// Represents an agent in a frame.
#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    pub id: String,
    pub position: Position,
    pub kind: AgentKind,
    pub infected: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Status {
    pub tick: usize,
    pub agents: usize,
    pub medics: usize,
    pub infected: usize,
    pub wall_health: i32,
    pub vaccine_progress: f32,
    /// `None` until a scavenger has been selected.
    pub scavenger_health: Option<i32>,
    /// `None` unless a living scavenger is on the board.
    pub scavenger_progress: Option<Progress>,
    pub note: StatusNote,
}
