//! Error types for the outbreak simulation.

use thiserror::Error;

/// Result type alias using [`SimulationError`].
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Top-level error type for the simulation.
///
/// Rejected moves are not errors: the engine simply does not commit them.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The grid is larger than the fixed board capacity.
    #[error("Grid of {rows}x{cols} exceeds the board capacity of {max_rows}x{max_cols}")]
    GridTooLarge {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
        /// Maximum rows.
        max_rows: usize,
        /// Maximum columns.
        max_cols: usize,
    },

    /// The grid cannot hold the city wall, the gate and the research facility.
    #[error("Grid of {rows}x{cols} is too small, the layout needs at least {min_rows}x{min_cols}")]
    GridTooSmall {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
        /// Minimum rows.
        min_rows: usize,
        /// Minimum columns.
        min_cols: usize,
    },

    /// Initial agents plus reinforcements would not fit in the agent arena.
    #[error("{agents} agents plus {reinforcements} reinforcements exceed the capacity of {capacity}")]
    PopulationExceedsCapacity {
        /// Requested initial agents.
        agents: usize,
        /// Agents spawned when the infection worsens.
        reinforcements: usize,
        /// Arena capacity.
        capacity: usize,
    },

    /// Medics are drawn from the city dwellers and must fit among them.
    #[error("Cannot make {medics} medics out of {city_dwellers} city dwellers")]
    TooManyMedics {
        /// Requested medics.
        medics: usize,
        /// Agents placed inside the city.
        city_dwellers: usize,
    },

    /// No eligible cell was left for a placement.
    #[error("No free cell left to place {0}")]
    NoFreeCell(&'static str),

    /// `update` was called before `start`.
    #[error("Simulation has not started! Call `start` to start the simulation.")]
    NotStarted,

    /// `update` was called after the run finished.
    #[error("Simulation is finished! Call `start` to start a new run.")]
    AlreadyFinished,

    /// A renderer failed to write a frame.
    #[error("Failed to render frame: {0}")]
    Render(#[from] std::io::Error),
}
