use serde::Serialize;
use std::fmt;

/// The one-line narrative shown under the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum StatusNote {
    ResearchBegun,
    IngredientsNeeded,
    ScavengerSelected,
    FirstIngredientGrabbed,
    BothIngredientsGrabbed,
    IngredientsApplied,
    VaccineCreated,
    InfectionSpread,
    WallCrumbled,
    ScavengerPerished,
    InfectedWin,
}

impl StatusNote {
    pub fn message(self) -> &'static str {
        match self {
            StatusNote::ResearchBegun => "Emergency vaccine research has begun!",
            StatusNote::IngredientsNeeded => "Vaccine ingredients are needed!",
            StatusNote::ScavengerSelected => "A scavenger has been selected!",
            StatusNote::FirstIngredientGrabbed => "The first ingredient has been grabbed!",
            StatusNote::BothIngredientsGrabbed => "Both ingredients have been grabbed!",
            StatusNote::IngredientsApplied => "Ingredients applied! Vaccine research accelerated!",
            StatusNote::VaccineCreated => "Vaccine created! Humans WIN!",
            StatusNote::InfectionSpread => "The infection has spread! Infected WIN!",
            StatusNote::WallCrumbled => "The city wall has crumbled!",
            StatusNote::ScavengerPerished => "The scavenger has perished!",
            StatusNote::InfectedWin => "The infected WIN!",
        }
    }
}

impl fmt::Display for StatusNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Something notable that happened during a tick.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Milestone {
    GateOpened,
    ScavengerSelected { id: String },
    GateReached,
    FirstIngredientCollected,
    SecondIngredientCollected,
    FacilityReached,
    ScavengerWounded { health: i32 },
    ScavengerPerished,
    CityWallCrumbled,
    VaccineApplied,
    InfectionWorsened { spawned: usize },
}

/// Represents the reason the run finished.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum FinishedReason {
    /// The vaccine was applied and the closing ticks played out.
    VaccineDeployed,
    /// The infection worsened, took every non-medic and the closing ticks played out.
    InfectionPrevailed,
    /// The tick cap was reached first.
    TickLimitReached,
}
