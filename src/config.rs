use crate::error::{Result, SimulationError};
use std::time::Duration;

/// Largest number of rows a board can hold.
pub const MAX_ROWS: usize = 20;
/// Largest number of columns a board can hold.
pub const MAX_COLS: usize = 80;
/// Capacity of the agent arena, reinforcements included.
pub const MAX_AGENTS: usize = 100;
/// Infected agents spawned when the infection worsens.
pub const REINFORCEMENTS: usize = 30;

// Smallest grid where the wall, the gate gap and the L-shaped lab fit without overlapping.
const MIN_ROWS: usize = 8;
const MIN_COLS: usize = 50;

/// Process parameters supplied once at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Number of grid rows.
    pub rows: usize,
    /// Number of grid columns.
    pub cols: usize,
    /// Initial number of agents, medics included.
    pub agents: usize,
    /// Number of medics among the initial agents.
    pub medics: usize,
    /// Last tick index that will be processed.
    pub max_tick: usize,
    /// Pause between rendered frames. Pacing only.
    pub tick_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            rows: 20,
            cols: 80,
            agents: 18,
            medics: 2,
            max_tick: 400,
            tick_delay: Duration::from_millis(250),
        }
    }
}

impl SimulationConfig {
    /// Number of agents that start inside the city walls.
    pub fn city_dwellers(&self) -> usize {
        self.agents / 3
    }

    /// Checks the parameters against the board capacity and layout constraints.
    ///
    /// Invalid parameters are a fatal configuration error, never truncated.
    pub fn validate(&self) -> Result<()> {
        if self.rows > MAX_ROWS || self.cols > MAX_COLS {
            return Err(SimulationError::GridTooLarge {
                rows: self.rows,
                cols: self.cols,
                max_rows: MAX_ROWS,
                max_cols: MAX_COLS,
            });
        }

        if self.rows < MIN_ROWS || self.cols < MIN_COLS {
            return Err(SimulationError::GridTooSmall {
                rows: self.rows,
                cols: self.cols,
                min_rows: MIN_ROWS,
                min_cols: MIN_COLS,
            });
        }

        if self.agents + REINFORCEMENTS > MAX_AGENTS {
            return Err(SimulationError::PopulationExceedsCapacity {
                agents: self.agents,
                reinforcements: REINFORCEMENTS,
                capacity: MAX_AGENTS,
            });
        }

        if self.medics > self.city_dwellers() {
            return Err(SimulationError::TooManyMedics {
                medics: self.medics,
                city_dwellers: self.city_dwellers(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_using_the_default_config_it_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn when_the_grid_exceeds_capacity_validation_fails() {
        let config = SimulationConfig {
            rows: 21,
            ..SimulationConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(SimulationError::GridTooLarge { rows: 21, .. })
        ));
    }

    #[test]
    fn when_the_grid_is_too_small_for_the_layout_validation_fails() {
        let config = SimulationConfig {
            cols: 40,
            ..SimulationConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(SimulationError::GridTooSmall { cols: 40, .. })
        ));
    }

    #[test]
    fn when_reinforcements_would_overflow_the_arena_validation_fails() {
        let config = SimulationConfig {
            agents: 71,
            medics: 2,
            ..SimulationConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(SimulationError::PopulationExceedsCapacity { agents: 71, .. })
        ));

        let config = SimulationConfig {
            agents: 70,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn when_there_are_more_medics_than_city_dwellers_validation_fails() {
        let config = SimulationConfig {
            agents: 18,
            medics: 7,
            ..SimulationConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(SimulationError::TooManyMedics {
                medics: 7,
                city_dwellers: 6
            })
        ));
    }
}
