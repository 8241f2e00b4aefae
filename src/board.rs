use crate::config::{SimulationConfig, MAX_AGENTS, REINFORCEMENTS};
use crate::entities::{Agent, AgentKind, Goals, Scavenger};
use crate::error::{Result, SimulationError};
use crate::frame::{AgentView, Frame, Status};
use crate::landscape::{Landscape, Position};
use crate::render::Renderer;
use crate::status::{FinishedReason, Milestone, StatusNote};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const GATE_OPENING_TICK: usize = 30;
const SCAVENGER_SELECTION_TICK: usize = 35;
const WORSENING_AFTER_TICK: usize = 150;
// Ticks played out after the vaccine or the infection has won
const CLOSING_TICKS: usize = 15;

const RESEARCH_NOTE_UNTIL: usize = 15;
const INGREDIENTS_NOTE_UNTIL: usize = 30;
const SCAVENGER_NOTE_UNTIL: usize = 45;
const INFECTED_WIN_NOTE_FROM: usize = 385;

const FULL_HEALTH: i32 = 100;
const SCAVENGER_DAMAGE: i32 = 25;
const FULL_PROGRESS: f32 = 100.0;
const RESEARCH_BONUS_LIMIT: u32 = 10;
const RESEARCH_INCREMENTS: [f32; 5] = [0.8, 0.4, 0.3, 0.2, 0.0];
const WALL_DECAY: [i32; 4] = [2, 1, 0, 0];

/// The outbreak simulation.
/// Main entry point for running a simulation.
pub struct Board {
    config: SimulationConfig,
    landscape: Landscape,
    agents: Vec<Agent>,
    tick: usize,
    infected: usize,
    scavenger_slot: Option<usize>,
    scavenger_health: i32,
    wall_health: i32,
    vaccine_progress: f32,
    vaccine_applied: bool,
    infection_worsened: bool,
    end_tick: Option<usize>,
    note: StatusNote,
    milestones: Vec<Milestone>,
    started: bool,
    finished: bool,
    finished_reason: Option<FinishedReason>,
    rng: StdRng,
}

/// What a contact between two neighbours does, and to which of them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Contact {
    Heal(Side),
    Infect(Side),
    Wound(Side),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Side {
    First,
    Second,
}

impl Board {
    /// Creates a new simulation seeded from system entropy.
    ///
    /// # Arguments
    /// * `config` - Grid dimensions and population. Checked once, invalid values fail here.
    pub fn new(config: SimulationConfig) -> Result<Board> {
        config.validate()?;
        Ok(Board::with_rng(config, StdRng::from_entropy()))
    }

    /// Creates a new simulation with a fixed seed.
    ///
    /// # Arguments
    /// * `config` - Grid dimensions and population.
    /// * `seed` - The seed for the random number generator.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Board> {
        config.validate()?;
        Ok(Board::with_rng(config, StdRng::seed_from_u64(seed)))
    }

    fn with_rng(config: SimulationConfig, rng: StdRng) -> Board {
        Board {
            config,
            landscape: Landscape::new(config.rows, config.cols),
            agents: Vec::with_capacity(MAX_AGENTS),
            tick: 0,
            infected: 0,
            scavenger_slot: None,
            scavenger_health: FULL_HEALTH,
            wall_health: FULL_HEALTH,
            vaccine_progress: 0.0,
            vaccine_applied: false,
            infection_worsened: false,
            end_tick: None,
            note: StatusNote::ResearchBegun,
            milestones: Vec::new(),
            started: false,
            finished: false,
            finished_reason: None,
            rng,
        }
    }

    /// Starts the simulation.
    ///
    /// Builds the landscape and the population from scratch. Must be called once
    /// before updating.
    pub fn start(&mut self) -> Result<Frame> {
        self.tick = 0;
        self.scavenger_slot = None;
        self.scavenger_health = FULL_HEALTH;
        self.wall_health = FULL_HEALTH;
        self.vaccine_progress = 0.0;
        self.vaccine_applied = false;
        self.infection_worsened = false;
        self.end_tick = None;
        self.note = StatusNote::ResearchBegun;
        self.milestones.clear();
        self.finished = false;
        self.finished_reason = None;

        self.landscape = Landscape::generate(self.config.rows, self.config.cols, &mut self.rng)?;
        self.agents.clear();
        self.populate_city()?;
        self.populate_outside_of_city()?;
        self.count_infected();
        self.started = true;

        info!(
            agents = self.agents.len(),
            medics = self.medic_count(),
            infected = self.infected,
            "Simulation started"
        );

        Ok(self.frame())
    }

    /// Runs one tick and returns the resulting frame.
    pub fn update(&mut self) -> Result<Frame> {
        if !self.started {
            return Err(SimulationError::NotStarted);
        }

        if self.finished {
            return Err(SimulationError::AlreadyFinished);
        }

        self.milestones.clear();

        self.move_agents();
        self.process_contacts();
        self.check_on_scavenger();
        self.update_research_progress();
        self.update_wall_health();
        self.run_schedule();
        self.check_for_endgame();
        self.update_note();
        self.check_for_finish();

        debug!(
            tick = self.tick,
            infected = self.infected,
            wall_health = self.wall_health,
            vaccine_progress = self.vaccine_progress,
            "Tick processed"
        );

        let frame = self.frame();
        self.tick += 1;
        Ok(frame)
    }

    /// Starts a fresh run and drives it to the end, handing every frame to `renderer`.
    ///
    /// # Arguments
    /// * `renderer` - Receives each frame after its tick completes.
    /// * `pacing` - Pause between frames. Purely cosmetic.
    pub fn run<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        pacing: Duration,
    ) -> Result<FinishedReason> {
        self.start()?;

        loop {
            let frame = self.update()?;
            renderer.render(&frame)?;

            if let Some(reason) = frame.finished_reason {
                renderer.finish()?;
                return Ok(reason);
            }

            if !pacing.is_zero() {
                thread::sleep(pacing);
            }
        }
    }

    /// Whether any agent could step onto `to` right now.
    pub fn try_move(&self, to: Position) -> bool {
        can_occupy(&self.landscape, &self.agents, None, to)
    }

    /// Whether every agent apart from the medics is infected.
    pub fn all_infected(&self) -> bool {
        self.agents
            .iter()
            .filter(|agent| !agent.is_medic())
            .all(Agent::is_infected)
    }

    /// The snapshot a renderer draws.
    pub fn frame(&self) -> Frame {
        Frame {
            rows: self.landscape.rows(),
            cols: self.landscape.cols(),
            cells: self.landscape.cells().to_vec(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentView {
                    id: agent.id().to_string(),
                    position: agent.position(),
                    kind: agent.kind(),
                    infected: agent.is_infected(),
                })
                .collect(),
            status: self.status(),
            milestones: self.milestones.clone(),
            finished: self.finished,
            finished_reason: self.finished_reason,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn landscape(&self) -> &Landscape {
        &self.landscape
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Index of the next tick to be processed.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn infected_count(&self) -> usize {
        self.infected
    }

    pub fn scavenger_health(&self) -> i32 {
        self.scavenger_health
    }

    pub fn wall_health(&self) -> i32 {
        self.wall_health
    }

    pub fn vaccine_progress(&self) -> f32 {
        self.vaccine_progress
    }

    pub fn vaccine_applied(&self) -> bool {
        self.vaccine_applied
    }

    pub fn infection_worsened(&self) -> bool {
        self.infection_worsened
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finished_reason(&self) -> Option<FinishedReason> {
        self.finished_reason
    }
}

impl Board {
    fn populate_city(&mut self) -> Result<()> {
        // City dwellers keep two columns clear of the wall
        let first_col = self.landscape.city().starting_col + 2;

        for index in 0..self.config.city_dwellers() {
            let position = self.random_free_cell("a city dweller", |position| {
                position.col >= first_col
            })?;

            let agent = if index < self.config.medics {
                Agent::medic(position)
            } else {
                Agent::person(position, false)
            };
            self.agents.push(agent);
        }

        Ok(())
    }

    fn populate_outside_of_city(&mut self) -> Result<()> {
        let last_col = self.landscape.city().starting_col - 2;
        let agents = self.config.agents;
        let city_dwellers = self.config.city_dwellers();

        for index in city_dwellers..agents {
            let position = self.random_free_cell("an outsider", |position| {
                position.col < last_col
            })?;

            // Roughly the first two thirds of the outsiders start infected
            let infected = index <= agents - city_dwellers;
            self.agents.push(Agent::person(position, infected));
        }

        Ok(())
    }

    fn free_cells(&self, filter: impl Fn(Position) -> bool) -> Vec<Position> {
        let occupied: HashSet<Position> = self.agents.iter().map(Agent::position).collect();

        self.landscape
            .walkable_cells()
            .into_iter()
            .filter(|position| !occupied.contains(position) && filter(*position))
            .collect()
    }

    fn random_free_cell(
        &mut self,
        purpose: &'static str,
        filter: impl Fn(Position) -> bool,
    ) -> Result<Position> {
        let cells = self.free_cells(filter);
        cells
            .choose(&mut self.rng)
            .copied()
            .ok_or(SimulationError::NoFreeCell(purpose))
    }

    fn move_agents(&mut self) {
        // Agents move one after the other, so later agents see the new positions of earlier ones
        for index in 0..self.agents.len() {
            let landscape = &self.landscape;
            let agents = &self.agents;
            let authority = |to: Position| can_occupy(landscape, agents, Some(index), to);
            let next = agents[index].next_position(&mut self.rng, &authority);

            self.agents[index].set_position(next);
        }
    }

    fn process_contacts(&mut self) {
        let count = self.agents.len();

        for first in 0..count {
            for second in first + 1..count {
                if !self.agents[first].is_next_to(&self.agents[second]) {
                    continue;
                }

                let Some(contact) = resolve_contact(&self.agents[first], &self.agents[second])
                else {
                    continue;
                };

                let pick = |side: Side| match side {
                    Side::First => first,
                    Side::Second => second,
                };

                match contact {
                    Contact::Heal(side) => self.agents[pick(side)].heal(),
                    Contact::Infect(side) => self.agents[pick(side)].infect(),
                    Contact::Wound(side) => self.wound_scavenger(pick(side)),
                }
            }
        }

        self.count_infected();
    }

    fn wound_scavenger(&mut self, index: usize) {
        self.scavenger_health = (self.scavenger_health - SCAVENGER_DAMAGE).max(0);

        if self.scavenger_health > 0 {
            debug!(health = self.scavenger_health, "Scavenger wounded");
            self.milestones.push(Milestone::ScavengerWounded {
                health: self.scavenger_health,
            });
            return;
        }

        // The scavenger is gone for good, an infected person takes its place
        let position = self.agents[index].position();
        self.agents[index] = Agent::person(position, true);

        info!(tick = self.tick, row = position.row, col = position.col, "Scavenger perished");
        self.milestones.push(Milestone::ScavengerPerished);
    }

    fn check_on_scavenger(&mut self) {
        let Some(index) = self.scavenger_slot else {
            return;
        };

        let position = self.agents[index].position();
        let Some(scavenger) = self.agents[index].as_scavenger_mut() else {
            return;
        };

        let goals = scavenger.goals();
        let progress = scavenger.progress();

        let milestone = if !progress.reached_gate && position.is_next_to(goals.gate) {
            scavenger.reach_gate();
            Milestone::GateReached
        } else if !progress.has_first_ingredient && position.is_next_to(goals.first_ingredient) {
            scavenger.collect_first_ingredient();
            self.landscape.clear(goals.first_ingredient);
            Milestone::FirstIngredientCollected
        } else if progress.has_first_ingredient
            && !progress.has_second_ingredient
            && position.is_next_to(goals.second_ingredient)
        {
            scavenger.collect_second_ingredient();
            self.landscape.clear(goals.second_ingredient);
            Milestone::SecondIngredientCollected
        } else if progress.has_both_ingredients()
            && !progress.reached_facility
            && position.is_next_to(goals.facility)
        {
            scavenger.reach_facility();
            Milestone::FacilityReached
        } else {
            return;
        };

        info!(tick = self.tick, milestone = ?milestone, "Scavenger progressed");
        self.milestones.push(milestone);
    }

    fn update_research_progress(&mut self) {
        if self.infection_worsened {
            return;
        }

        let delivering = self.active_scavenger().is_some_and(|(position, scavenger)| {
            scavenger.progress().has_both_ingredients() && self.landscape.is_within_facility(position)
        });

        if delivering {
            self.vaccine_progress += self.rng.gen_range(0..RESEARCH_BONUS_LIMIT) as f32;
        }

        let increment = RESEARCH_INCREMENTS[self.rng.gen_range(0..RESEARCH_INCREMENTS.len())];
        self.vaccine_progress += increment;
        self.vaccine_progress = self.vaccine_progress.min(FULL_PROGRESS);
    }

    fn update_wall_health(&mut self) {
        self.wall_health -= WALL_DECAY[self.rng.gen_range(0..WALL_DECAY.len())];
        self.wall_health = self.wall_health.max(0);

        if self.wall_health == 0 && !self.landscape.is_destroyed() {
            self.landscape.destroy();
            // The lab walls outlast the city wall
            self.landscape.build_research_facility();

            info!(tick = self.tick, "City wall crumbled");
            self.milestones.push(Milestone::CityWallCrumbled);
        }
    }

    fn run_schedule(&mut self) {
        match self.tick {
            GATE_OPENING_TICK => {
                self.landscape.open_gate();
                info!(tick = self.tick, "City gate opened");
                self.milestones.push(Milestone::GateOpened);
            }
            SCAVENGER_SELECTION_TICK => self.select_scavenger(),
            _ => {}
        }
    }

    fn select_scavenger(&mut self) {
        let landscape = &self.landscape;
        let candidates: Vec<usize> = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| {
                agent.kind() == AgentKind::Person
                    && !agent.is_infected()
                    && landscape.is_within_city(agent.position())
            })
            .map(|(index, _)| index)
            .collect();

        let Some(&index) = candidates.choose(&mut self.rng) else {
            warn!(tick = self.tick, "No healthy person inside the city to become the scavenger");
            return;
        };

        let Some(ingredients) = self.landscape.ingredients() else {
            warn!(tick = self.tick, "No ingredients on the landscape, no scavenger selected");
            return;
        };

        let goals = Goals {
            gate: self.landscape.city().gate,
            first_ingredient: ingredients.first,
            second_ingredient: ingredients.second,
            facility: self.landscape.facility().interior,
        };

        let position = self.agents[index].position();
        self.agents[index] = Agent::scavenger(position, goals);
        self.scavenger_slot = Some(index);

        let id = self.agents[index].id().to_string();
        info!(tick = self.tick, slot = index, id = %id, "Scavenger selected");
        self.milestones.push(Milestone::ScavengerSelected { id });
    }

    fn check_for_endgame(&mut self) {
        if self.vaccine_progress >= FULL_PROGRESS {
            if !self.vaccine_applied {
                self.apply_vaccine();
            } else if self.end_tick.is_none() {
                self.schedule_end();
            }
        } else if self.wall_health == 0
            && self.tick > WORSENING_AFTER_TICK
            && self.scavenger_health == 0
        {
            if !self.infection_worsened {
                self.make_infection_worse();
            } else if self.all_infected() && self.end_tick.is_none() {
                self.schedule_end();
            }
        }
    }

    fn apply_vaccine(&mut self) {
        self.agents.iter_mut().for_each(Agent::heal);
        self.vaccine_applied = true;
        self.count_infected();

        info!(tick = self.tick, "Vaccine applied");
        self.milestones.push(Milestone::VaccineApplied);
    }

    fn make_infection_worse(&mut self) {
        for agent in self.agents.iter_mut().filter(|agent| agent.is_medic()) {
            *agent = Agent::person(agent.position(), false);
        }

        let free = self.free_cells(|_| true);
        let spawned: Vec<Position> = free
            .choose_multiple(&mut self.rng, REINFORCEMENTS)
            .copied()
            .collect();

        for position in &spawned {
            self.agents.push(Agent::person(*position, true));
        }

        self.infection_worsened = true;
        self.count_infected();

        info!(tick = self.tick, spawned = spawned.len(), "Infection worsened");
        self.milestones.push(Milestone::InfectionWorsened {
            spawned: spawned.len(),
        });
    }

    fn schedule_end(&mut self) {
        let end_tick = self.tick + CLOSING_TICKS;
        self.end_tick = Some(end_tick);
        debug!(tick = self.tick, end_tick, "End of run scheduled");
    }

    fn check_for_finish(&mut self) {
        let reason = if self.end_tick == Some(self.tick) {
            if self.vaccine_applied {
                FinishedReason::VaccineDeployed
            } else {
                FinishedReason::InfectionPrevailed
            }
        } else if self.tick >= self.config.max_tick {
            FinishedReason::TickLimitReached
        } else {
            return;
        };

        self.finished = true;
        self.finished_reason = Some(reason);
        info!(tick = self.tick, reason = ?reason, "Simulation finished");
    }

    fn update_note(&mut self) {
        let tick = self.tick;
        let mut note = self.note;

        if tick < RESEARCH_NOTE_UNTIL {
            note = StatusNote::ResearchBegun;
        } else if tick < INGREDIENTS_NOTE_UNTIL {
            note = StatusNote::IngredientsNeeded;
        } else if tick < SCAVENGER_NOTE_UNTIL && self.scavenger_slot.is_some() {
            note = StatusNote::ScavengerSelected;
        }

        if let Some((_, scavenger)) = self.active_scavenger() {
            let progress = scavenger.progress();
            if progress.has_first_ingredient {
                note = StatusNote::FirstIngredientGrabbed;
            }
            if progress.has_second_ingredient {
                note = StatusNote::BothIngredientsGrabbed;
            }
            if progress.reached_facility {
                note = StatusNote::IngredientsApplied;
            }
        }

        if self.vaccine_applied {
            note = StatusNote::VaccineCreated;
        } else if self.infection_worsened {
            note = StatusNote::InfectionSpread;
        } else if self.wall_health == 0 {
            note = StatusNote::WallCrumbled;
        } else if self.scavenger_health == 0 {
            note = StatusNote::ScavengerPerished;
        }

        if tick >= INFECTED_WIN_NOTE_FROM {
            note = StatusNote::InfectedWin;
        }

        self.note = note;
    }

    fn status(&self) -> Status {
        Status {
            tick: self.tick,
            agents: self.agents.len(),
            medics: self.medic_count(),
            infected: self.infected,
            wall_health: self.wall_health,
            vaccine_progress: self.vaccine_progress,
            scavenger_health: self.scavenger_slot.map(|_| self.scavenger_health),
            scavenger_progress: self
                .active_scavenger()
                .map(|(_, scavenger)| scavenger.progress()),
            note: self.note,
        }
    }

    /// The scavenger and its position, while it is alive.
    fn active_scavenger(&self) -> Option<(Position, &Scavenger)> {
        let agent = self.agents.get(self.scavenger_slot?)?;
        agent
            .as_scavenger()
            .map(|scavenger| (agent.position(), scavenger))
    }

    fn medic_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.is_medic()).count()
    }

    fn count_infected(&mut self) {
        self.infected = self.agents.iter().filter(|agent| agent.is_infected()).count();
    }
}

/// The move rule shared by every agent: on the grid, on walkable terrain and not
/// onto another agent. `mover` is left out of the occupancy check.
fn can_occupy(
    landscape: &Landscape,
    agents: &[Agent],
    mover: Option<usize>,
    to: Position,
) -> bool {
    landscape.is_walkable(to)
        && !agents
            .iter()
            .enumerate()
            .any(|(index, agent)| Some(index) != mover && agent.position() == to)
}

fn resolve_contact(first: &Agent, second: &Agent) -> Option<Contact> {
    if first.is_medic() && second.is_infected() {
        return Some(Contact::Heal(Side::Second));
    }

    if second.is_medic() && first.is_infected() {
        return Some(Contact::Heal(Side::First));
    }

    match (first.is_infected(), second.is_infected()) {
        (true, false) => Some(exposure(second, Side::Second)),
        (false, true) => Some(exposure(first, Side::First)),
        _ => None,
    }
}

// The scavenger is wounded instead of catching the infection
fn exposure(target: &Agent, side: Side) -> Contact {
    match target.kind() {
        AgentKind::Scavenger => Contact::Wound(side),
        _ => Contact::Infect(side),
    }
}
