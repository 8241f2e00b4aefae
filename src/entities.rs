use crate::landscape::Position;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

/// Decides whether an agent may step onto a cell.
///
/// The board hands one of these to every movement call instead of agents
/// holding a reference back to the board.
pub trait MoveAuthority {
    fn try_move(&self, to: Position) -> bool;
}

impl<F> MoveAuthority for F
where
    F: Fn(Position) -> bool,
{
    fn try_move(&self, to: Position) -> bool {
        self(to)
    }
}

/// The kind tag of an agent, as seen by renderers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum AgentKind {
    Person,
    Medic,
    Scavenger,
}

/// The four places a scavenger has to visit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Goals {
    pub gate: Position,
    pub first_ingredient: Position,
    pub second_ingredient: Position,
    pub facility: Position,
}

/// How far a scavenger has come.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Progress {
    pub reached_gate: bool,
    pub has_first_ingredient: bool,
    pub has_second_ingredient: bool,
    pub reached_facility: bool,
}

impl Progress {
    pub fn has_both_ingredients(&self) -> bool {
        self.has_first_ingredient && self.has_second_ingredient
    }
}

/// Goal state carried only by the scavenger.
///
/// Progress flags only ever go from `false` to `true`, with one exception:
/// collecting the second ingredient sends the scavenger back through the gate.
#[derive(Clone, Debug, PartialEq)]
pub struct Scavenger {
    goals: Goals,
    progress: Progress,
}

impl Scavenger {
    pub fn new(goals: Goals) -> Scavenger {
        Scavenger {
            goals,
            progress: Progress::default(),
        }
    }

    pub fn goals(&self) -> Goals {
        self.goals
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// The goal being walked towards, or `None` once the lab has been reached.
    pub fn current_goal(&self) -> Option<Position> {
        let progress = &self.progress;
        if !progress.reached_gate {
            Some(self.goals.gate)
        } else if !progress.has_first_ingredient {
            Some(self.goals.first_ingredient)
        } else if !progress.has_second_ingredient {
            Some(self.goals.second_ingredient)
        } else if !progress.reached_facility {
            Some(self.goals.facility)
        } else {
            None
        }
    }

    /// Returns `true` if the flag was not already set.
    pub fn reach_gate(&mut self) -> bool {
        !std::mem::replace(&mut self.progress.reached_gate, true)
    }

    pub fn collect_first_ingredient(&mut self) -> bool {
        !std::mem::replace(&mut self.progress.has_first_ingredient, true)
    }

    /// Also clears the gate flag so the scavenger heads back through the gate.
    pub fn collect_second_ingredient(&mut self) -> bool {
        let newly_collected = !std::mem::replace(&mut self.progress.has_second_ingredient, true);
        if newly_collected {
            self.progress.reached_gate = false;
        }
        newly_collected
    }

    pub fn reach_facility(&mut self) -> bool {
        !std::mem::replace(&mut self.progress.reached_facility, true)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Role {
    Person,
    Medic,
    Scavenger(Scavenger),
}

/// A person-like entity on the board.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    id: String,
    position: Position,
    infected: bool,
    role: Role,
}

impl Agent {
    pub fn person(position: Position, infected: bool) -> Agent {
        Agent::new(position, infected, Role::Person)
    }

    pub fn medic(position: Position) -> Agent {
        Agent::new(position, false, Role::Medic)
    }

    pub fn scavenger(position: Position, goals: Goals) -> Agent {
        Agent::new(position, false, Role::Scavenger(Scavenger::new(goals)))
    }

    fn new(position: Position, infected: bool, role: Role) -> Agent {
        Agent {
            // Every constructed agent is a new individual, even when it replaces another in place
            id: Uuid::new_v4().to_string(),
            position,
            infected,
            role,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn is_infected(&self) -> bool {
        self.infected
    }

    pub fn infect(&mut self) {
        self.infected = true;
    }

    pub fn heal(&mut self) {
        self.infected = false;
    }

    pub fn kind(&self) -> AgentKind {
        match self.role {
            Role::Person => AgentKind::Person,
            Role::Medic => AgentKind::Medic,
            Role::Scavenger(_) => AgentKind::Scavenger,
        }
    }

    pub fn is_medic(&self) -> bool {
        matches!(self.role, Role::Medic)
    }

    /// The scavenger payload, if this agent is the scavenger.
    pub fn as_scavenger(&self) -> Option<&Scavenger> {
        match &self.role {
            Role::Scavenger(scavenger) => Some(scavenger),
            _ => None,
        }
    }

    pub fn as_scavenger_mut(&mut self) -> Option<&mut Scavenger> {
        match &mut self.role {
            Role::Scavenger(scavenger) => Some(scavenger),
            _ => None,
        }
    }

    pub fn is_next_to(&self, other: &Agent) -> bool {
        self.position.is_next_to(other.position)
    }

    /// Works out where this agent ends up this tick. Nothing is committed here;
    /// the caller writes the returned position back.
    ///
    /// # Arguments
    /// * `rng` - Source of the random step sizes.
    /// * `authority` - Accepts or rejects each candidate destination.
    pub fn next_position<R, A>(&self, rng: &mut R, authority: &A) -> Position
    where
        R: Rng + ?Sized,
        A: MoveAuthority + ?Sized,
    {
        match &self.role {
            Role::Person | Role::Medic => random_step(self.position, rng, authority),
            Role::Scavenger(scavenger) => match scavenger.current_goal() {
                Some(goal) => pathfind(self.position, goal, rng, authority),
                // The lab has been reached, the scavenger stays put
                None => self.position,
            },
        }
    }
}

/// A direction the scavenger can try to step in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// A random step of one or two cells in this direction.
    pub fn step<R: Rng + ?Sized>(self, rng: &mut R) -> (i32, i32) {
        match self {
            Direction::North => (rng.gen_range(-2..=-1), 0),
            Direction::East => (0, rng.gen_range(1..=2)),
            Direction::South => (rng.gen_range(1..=2), 0),
            Direction::West => (0, rng.gen_range(-2..=-1)),
        }
    }
}

/// Proposes a step of up to two cells on each axis, (0, 0) included.
fn random_step<R, A>(from: Position, rng: &mut R, authority: &A) -> Position
where
    R: Rng + ?Sized,
    A: MoveAuthority + ?Sized,
{
    let row_delta = rng.gen_range(-2..=2);
    let col_delta = rng.gen_range(-2..=2);
    let to = from.offset(row_delta, col_delta);

    if authority.try_move(to) {
        to
    } else {
        from
    }
}

/// Greedy step towards `goal`.
///
/// Candidates are tried west, south, north, east. A candidate is taken only if it is
/// accepted and does not end farther from the goal than where the tick started.
/// South, north and east end the step as soon as they succeed. A successful west
/// step does not: the remaining candidates and the random fallback are still
/// tried from the new position.
fn pathfind<R, A>(from: Position, goal: Position, rng: &mut R, authority: &A) -> Position
where
    R: Rng + ?Sized,
    A: MoveAuthority + ?Sized,
{
    let start_distance = from.distance_squared(goal);
    let mut position = from;

    let (row_delta, col_delta) = Direction::West.step(rng);
    let candidate = position.offset(row_delta, col_delta);
    if authority.try_move(candidate) && candidate.distance_squared(goal) <= start_distance {
        position = candidate;
    }

    for direction in [Direction::South, Direction::North, Direction::East] {
        let (row_delta, col_delta) = direction.step(rng);
        let candidate = position.offset(row_delta, col_delta);
        if authority.try_move(candidate) && candidate.distance_squared(goal) <= start_distance {
            return candidate;
        }
    }

    random_step(position, rng, authority)
}
