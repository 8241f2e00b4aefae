use outbreak::entities::Progress;
use outbreak::landscape::Cell;
use outbreak::{Board, Frame, JsonRenderer, Milestone, SimulationConfig, SimulationError};
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

fn run_to_end(seed: u64) -> (Board, Vec<Frame>) {
    let mut board = Board::with_seed(SimulationConfig::default(), seed).unwrap();
    let mut frames = vec![board.start().unwrap()];

    while !board.is_finished() {
        frames.push(board.update().unwrap());
    }

    (board, frames)
}

fn check_scavenger_flags(before: Progress, after: Progress, frame: &Frame) {
    assert!(!before.has_first_ingredient || after.has_first_ingredient);
    assert!(!before.has_second_ingredient || after.has_second_ingredient);
    assert!(!before.reached_facility || after.reached_facility);

    // The gate flag only drops on the tick the second ingredient is collected
    if before.reached_gate && !after.reached_gate {
        assert!(frame.milestones.contains(&Milestone::SecondIngredientCollected));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Agents never leave the grid, never stand on walls and never share a cell.
    #[test]
    fn prop_agents_stay_on_free_walkable_cells(seed in any::<u64>()) {
        let (_, frames) = run_to_end(seed);

        for frame in &frames {
            let mut seen = HashSet::new();
            for agent in &frame.agents {
                let (row, col) = (agent.position.row, agent.position.col);
                prop_assert!(row >= 0 && col >= 0);

                let cell = frame.cell(row as usize, col as usize);
                prop_assert!(matches!(cell, Some(Cell::Empty) | Some(Cell::ResearchFloor)));
                prop_assert!(seen.insert(agent.position));
            }
        }
    }

    /// Meters only move in one direction and stay within their bounds.
    #[test]
    fn prop_meters_are_monotone_and_clamped(seed in any::<u64>()) {
        let (_, frames) = run_to_end(seed);

        for pair in frames.windows(2) {
            let (before, after) = (&pair[0].status, &pair[1].status);

            prop_assert!(after.wall_health <= before.wall_health);
            prop_assert!((0..=100).contains(&after.wall_health));

            prop_assert!(after.vaccine_progress >= before.vaccine_progress);
            prop_assert!(after.vaccine_progress <= 100.0);

            if let (Some(before), Some(after)) = (before.scavenger_health, after.scavenger_health) {
                prop_assert!(after <= before);
                prop_assert!(after >= 0);
            }

            if let (Some(before), Some(after)) = (before.scavenger_progress, after.scavenger_progress) {
                check_scavenger_flags(before, after, &pair[1]);
            }
        }
    }

    /// Once applied, the vaccine stays applied, and once worsened, the infection stays worse.
    #[test]
    fn prop_endgame_flags_never_reset(seed in any::<u64>()) {
        let mut board = Board::with_seed(SimulationConfig::default(), seed).unwrap();
        board.start().unwrap();
        let (mut applied, mut worsened) = (false, false);

        while !board.is_finished() {
            board.update().unwrap();

            prop_assert!(!applied || board.vaccine_applied());
            prop_assert!(!worsened || board.infection_worsened());
            applied = board.vaccine_applied();
            worsened = board.infection_worsened();
        }

        prop_assert!(board.tick() <= 401);
        prop_assert!(board.finished_reason().is_some());
        prop_assert!(matches!(board.update(), Err(SimulationError::AlreadyFinished)));
    }

    /// Both ingredients land on their own cells in the open country.
    #[test]
    fn prop_ingredients_are_placed_outside_the_city(seed in any::<u64>()) {
        let mut board = Board::with_seed(SimulationConfig::default(), seed).unwrap();
        board.start().unwrap();

        let landscape = board.landscape();
        let ingredients = landscape.ingredients().unwrap();
        let limit = landscape.city().starting_col - 2;

        prop_assert_ne!(ingredients.first, ingredients.second);
        prop_assert!(ingredients.first.col < limit);
        prop_assert!(ingredients.second.col < limit);
        prop_assert_eq!(landscape.get(ingredients.first), Some(Cell::FirstIngredient));
        prop_assert_eq!(landscape.get(ingredients.second), Some(Cell::SecondIngredient));
    }

    /// The same seed always plays out the same run.
    #[test]
    fn prop_runs_are_reproducible_from_a_seed(seed in any::<u64>()) {
        let (_, first) = run_to_end(seed);
        let (_, second) = run_to_end(seed);

        let positions = |frame: &Frame| {
            frame.agents.iter().map(|agent| agent.position).collect::<Vec<_>>()
        };

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(positions(a), positions(b));
            prop_assert_eq!(
                serde_json::to_value(&a.status).unwrap(),
                serde_json::to_value(&b.status).unwrap()
            );
        }
    }
}

#[test]
fn when_running_with_the_json_renderer_every_line_is_a_frame_and_the_last_is_final() {
    let mut board = Board::with_seed(SimulationConfig::default(), 99).unwrap();
    let mut renderer = JsonRenderer::new(Vec::new());

    let reason = board.run(&mut renderer, Duration::ZERO).unwrap();

    let output = String::from_utf8(renderer.into_inner()).unwrap();
    let frames: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let last = frames.last().unwrap();
    assert_eq!(last["finished"], true);
    assert_eq!(last["finished_reason"], serde_json::to_value(reason).unwrap());
    assert!(frames[..frames.len() - 1]
        .iter()
        .all(|frame| frame["finished"] == false));
}
