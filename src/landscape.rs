use crate::error::{Result, SimulationError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// A terrain tag for one grid cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Wall,
    FirstIngredient,
    SecondIngredient,
    ResearchFloor,
}

impl Cell {
    /// Only open ground and the lab floor can be walked on.
    pub fn is_walkable(self) -> bool {
        matches!(self, Cell::Empty | Cell::ResearchFloor)
    }
}

/// A (row, col) coordinate. Signed so that proposed moves may point off the grid.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Position {
        Position { row, col }
    }

    pub fn offset(self, row_delta: i32, col_delta: i32) -> Position {
        Position::new(self.row + row_delta, self.col + col_delta)
    }

    /// Squared euclidean distance. Ordering matches the real distance.
    pub fn distance_squared(self, other: Position) -> i32 {
        (self.row - other.row).pow(2) + (self.col - other.col).pow(2)
    }

    /// Whether both positions are within one cell of each other, diagonals included.
    pub fn is_next_to(self, other: Position) -> bool {
        (self.row - other.row).abs() <= 1 && (self.col - other.col).abs() <= 1
    }
}

/// Where the city wall stands and where its gate is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct CityBounds {
    /// First of the two wall columns.
    pub wall_col: i32,
    /// Columns at or right of this one are inside the city.
    pub starting_col: i32,
    /// Rows at or above this one are inside the city.
    pub ending_row: i32,
    /// Midpoint of the gate, the scavenger's first goal.
    pub gate: Position,
}

/// The research facility in the top right corner.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct FacilityBounds {
    pub ending_row: i32,
    pub starting_col: i32,
    /// A point inside the lab, the scavenger's last goal.
    pub interior: Position,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Ingredients {
    pub first: Position,
    pub second: Position,
}

/// The terrain layer: walls, ingredient markers and the lab floor.
pub struct Landscape {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    city: CityBounds,
    facility: FacilityBounds,
    ingredients: Option<Ingredients>,
    destroyed: bool,
}

impl Landscape {
    /// Creates an all-empty landscape. Structure coordinates are derived from the
    /// dimensions here and stay fixed for the run.
    pub fn new(rows: usize, cols: usize) -> Landscape {
        let (r, c) = (rows as i32, cols as i32);

        Landscape {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
            city: CityBounds {
                wall_col: c / 2 + 8,
                starting_col: c / 2 + 9,
                ending_row: r - 1,
                gate: Position::new(r / 2 - 1, c / 2 + 9),
            },
            facility: FacilityBounds {
                ending_row: 4,
                starting_col: c - 13,
                interior: Position::new(3, c - 9),
            },
            ingredients: None,
            destroyed: false,
        }
    }

    /// Builds the full landscape: wall, lab, lab floor and both ingredients.
    pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Landscape> {
        let mut landscape = Landscape::new(rows, cols);
        landscape.build_wall();
        landscape.build_research_facility();
        landscape.place_ingredients(rng)?;
        landscape.mark_facility_floor();
        Ok(landscape)
    }

    /// Sets every cell back to empty.
    pub fn initialize(&mut self) {
        self.cells.fill(Cell::Empty);
        self.ingredients = None;
        self.destroyed = false;
    }

    /// Stamps the two-cell-thick city wall over the full height of the grid.
    pub fn build_wall(&mut self) {
        let wall_col = self.city.wall_col;
        for row in 0..self.rows as i32 {
            self.set(Position::new(row, wall_col), Cell::Wall);
            self.set(Position::new(row, wall_col + 1), Cell::Wall);
        }
    }

    /// Stamps the L-shaped lab walls near the top right corner.
    pub fn build_research_facility(&mut self) {
        let cols = self.cols as i32;
        for row in 0..3 {
            self.set(Position::new(row, cols - 15), Cell::Wall);
            self.set(Position::new(row, cols - 14), Cell::Wall);
        }
        for col in cols - 5..cols {
            self.set(Position::new(5, col), Cell::Wall);
            self.set(Position::new(6, col), Cell::Wall);
        }
    }

    /// Tags every cell inside the facility bound as lab floor.
    pub fn mark_facility_floor(&mut self) {
        for row in 0..=self.facility.ending_row {
            for col in self.facility.starting_col..self.cols as i32 {
                self.set(Position::new(row, col), Cell::ResearchFloor);
            }
        }
    }

    /// Drops both ingredients on random empty cells outside the city.
    pub fn place_ingredients<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Ingredients> {
        let first = self.random_ingredient_cell(rng)?;
        self.set(first, Cell::FirstIngredient);

        let second = self.random_ingredient_cell(rng)?;
        self.set(second, Cell::SecondIngredient);

        let ingredients = Ingredients { first, second };
        self.ingredients = Some(ingredients);
        Ok(ingredients)
    }

    /// Cuts a gap into the city wall around the gate.
    pub fn open_gate(&mut self) {
        self.stamp_gate(Cell::Empty);
    }

    /// Restores the wall cells of the gate gap.
    pub fn close_gate(&mut self) {
        self.stamp_gate(Cell::Wall);
    }

    /// Clears every wall cell. Runs once; later calls do nothing.
    /// The lab floor is left as it is.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.cells
            .iter_mut()
            .filter(|cell| **cell == Cell::Wall)
            .for_each(|cell| *cell = Cell::Empty);
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_within_city(&self, position: Position) -> bool {
        position.row <= self.city.ending_row && position.col >= self.city.starting_col
    }

    pub fn is_within_facility(&self, position: Position) -> bool {
        position.row <= self.facility.ending_row && position.col >= self.facility.starting_col
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.row >= 0
            && position.col >= 0
            && (position.row as usize) < self.rows
            && (position.col as usize) < self.cols
    }

    pub fn get(&self, position: Position) -> Option<Cell> {
        if !self.in_bounds(position) {
            return None;
        }
        self.cells.get(self.index(position)).copied()
    }

    pub fn set(&mut self, position: Position, cell: Cell) {
        if self.in_bounds(position) {
            let index = self.index(position);
            self.cells[index] = cell;
        }
    }

    /// Returns the cell at `position` to empty ground.
    pub fn clear(&mut self, position: Position) {
        self.set(position, Cell::Empty);
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.get(position).is_some_and(Cell::is_walkable)
    }

    /// All walkable cells, in row-major order.
    pub fn walkable_cells(&self) -> Vec<Position> {
        self.positions()
            .filter(|position| self.is_walkable(*position))
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn city(&self) -> CityBounds {
        self.city
    }

    pub fn facility(&self) -> FacilityBounds {
        self.facility
    }

    pub fn ingredients(&self) -> Option<Ingredients> {
        self.ingredients
    }

    fn random_ingredient_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Position> {
        // Ingredients sit in the open country, clear of the wall by two columns
        let limit = self.city.starting_col - 2;
        let candidates: Vec<Position> = self
            .positions()
            .filter(|position| position.col < limit && self.get(*position) == Some(Cell::Empty))
            .collect();

        candidates
            .choose(rng)
            .copied()
            .ok_or(SimulationError::NoFreeCell("an ingredient"))
    }

    fn stamp_gate(&mut self, cell: Cell) {
        let middle = self.rows as i32 / 2;
        let wall_col = self.city.wall_col;
        for row in middle - 3..=middle + 1 {
            self.set(Position::new(row, wall_col), cell);
            self.set(Position::new(row, wall_col + 1), cell);
        }
    }

    fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows as i32)
            .flat_map(move |row| (0..self.cols as i32).map(move |col| Position::new(row, col)))
    }

    fn index(&self, position: Position) -> usize {
        position.row as usize * self.cols + position.col as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn when_creating_a_landscape_every_cell_is_empty() {
        let landscape = Landscape::new(20, 80);

        assert_eq!(landscape.cells().len(), 20 * 80);
        assert!(landscape.cells().iter().all(|cell| *cell == Cell::Empty));
    }

    #[test]
    fn when_building_the_wall_two_full_height_columns_are_stamped() {
        let mut landscape = Landscape::new(20, 80);
        landscape.build_wall();

        for row in 0..20 {
            assert_eq!(landscape.get(Position::new(row, 48)), Some(Cell::Wall));
            assert_eq!(landscape.get(Position::new(row, 49)), Some(Cell::Wall));
            assert_eq!(landscape.get(Position::new(row, 47)), Some(Cell::Empty));
            assert_eq!(landscape.get(Position::new(row, 50)), Some(Cell::Empty));
        }

        let city = landscape.city();
        assert_eq!(city.starting_col, 49);
        assert_eq!(city.ending_row, 19);
        assert_eq!(city.gate, Position::new(9, 49));
    }

    #[test]
    fn when_opening_the_gate_a_five_row_gap_is_cut_and_closing_restores_it() {
        let mut landscape = Landscape::new(20, 80);
        landscape.build_wall();
        landscape.open_gate();

        for row in 7..=11 {
            assert_eq!(landscape.get(Position::new(row, 48)), Some(Cell::Empty));
            assert_eq!(landscape.get(Position::new(row, 49)), Some(Cell::Empty));
        }
        assert_eq!(landscape.get(Position::new(6, 48)), Some(Cell::Wall));
        assert_eq!(landscape.get(Position::new(12, 49)), Some(Cell::Wall));

        landscape.close_gate();
        for row in 0..20 {
            assert_eq!(landscape.get(Position::new(row, 48)), Some(Cell::Wall));
            assert_eq!(landscape.get(Position::new(row, 49)), Some(Cell::Wall));
        }
    }

    #[test]
    fn when_building_the_research_facility_an_l_shaped_wall_is_stamped() {
        let mut landscape = Landscape::new(20, 80);
        landscape.build_research_facility();

        for row in 0..3 {
            assert_eq!(landscape.get(Position::new(row, 65)), Some(Cell::Wall));
            assert_eq!(landscape.get(Position::new(row, 66)), Some(Cell::Wall));
        }
        assert_eq!(landscape.get(Position::new(3, 65)), Some(Cell::Empty));

        for col in 75..80 {
            assert_eq!(landscape.get(Position::new(5, col)), Some(Cell::Wall));
            assert_eq!(landscape.get(Position::new(6, col)), Some(Cell::Wall));
        }
        assert_eq!(landscape.get(Position::new(5, 74)), Some(Cell::Empty));

        let facility = landscape.facility();
        assert_eq!(facility.ending_row, 4);
        assert_eq!(facility.starting_col, 67);
        assert_eq!(facility.interior, Position::new(3, 71));
    }

    #[test]
    fn when_marking_the_facility_floor_only_cells_inside_the_bound_are_tagged() {
        let mut landscape = Landscape::new(20, 80);
        landscape.mark_facility_floor();

        assert_eq!(landscape.get(Position::new(0, 67)), Some(Cell::ResearchFloor));
        assert_eq!(landscape.get(Position::new(4, 79)), Some(Cell::ResearchFloor));
        assert_eq!(landscape.get(Position::new(5, 79)), Some(Cell::Empty));
        assert_eq!(landscape.get(Position::new(0, 66)), Some(Cell::Empty));
    }

    #[test]
    fn when_destroying_the_landscape_walls_are_cleared_but_the_floor_is_kept() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut landscape = Landscape::generate(20, 80, &mut rng).unwrap();
        let ingredients = landscape.ingredients().unwrap();

        landscape.destroy();

        assert!(landscape.is_destroyed());
        assert!(landscape.cells().iter().all(|cell| *cell != Cell::Wall));
        assert_eq!(landscape.get(Position::new(2, 70)), Some(Cell::ResearchFloor));
        assert_eq!(landscape.get(ingredients.first), Some(Cell::FirstIngredient));

        // A second call is a no-op even if walls were stamped again
        landscape.build_research_facility();
        landscape.destroy();
        assert_eq!(landscape.get(Position::new(0, 65)), Some(Cell::Wall));
    }

    #[test]
    fn when_initializing_a_landscape_all_terrain_and_the_destroyed_flag_are_reset() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut landscape = Landscape::generate(20, 80, &mut rng).unwrap();
        landscape.destroy();

        landscape.initialize();

        assert!(landscape.cells().iter().all(|cell| *cell == Cell::Empty));
        assert!(landscape.ingredients().is_none());
        assert!(!landscape.is_destroyed());
    }

    #[test]
    fn when_checking_containment_the_stored_bounds_are_used() {
        let landscape = Landscape::new(20, 80);

        assert!(landscape.is_within_city(Position::new(0, 49)));
        assert!(landscape.is_within_city(Position::new(19, 79)));
        assert!(!landscape.is_within_city(Position::new(10, 48)));

        assert!(landscape.is_within_facility(Position::new(4, 67)));
        assert!(!landscape.is_within_facility(Position::new(5, 67)));
        assert!(!landscape.is_within_facility(Position::new(0, 66)));
    }

    #[test]
    fn when_placing_ingredients_they_never_share_a_cell_or_land_in_the_city() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let landscape = Landscape::generate(20, 80, &mut rng).unwrap();
            let ingredients = landscape.ingredients().unwrap();

            assert_ne!(ingredients.first, ingredients.second);
            assert!(!landscape.is_within_city(ingredients.first));
            assert!(!landscape.is_within_city(ingredients.second));
            assert!(ingredients.first.col < 47);
            assert!(ingredients.second.col < 47);
            assert_eq!(landscape.get(ingredients.first), Some(Cell::FirstIngredient));
            assert_eq!(landscape.get(ingredients.second), Some(Cell::SecondIngredient));
        }
    }

    #[test]
    fn when_no_empty_cell_is_left_outside_the_city_placing_ingredients_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut landscape = Landscape::new(20, 80);
        for row in 0..20 {
            for col in 0..47 {
                landscape.set(Position::new(row, col), Cell::Wall);
            }
        }

        assert!(matches!(
            landscape.place_ingredients(&mut rng),
            Err(SimulationError::NoFreeCell(_))
        ));
    }

    #[test]
    fn when_querying_walkability_only_empty_ground_and_lab_floor_are_walkable() {
        assert!(Cell::Empty.is_walkable());
        assert!(Cell::ResearchFloor.is_walkable());
        assert!(!Cell::Wall.is_walkable());
        assert!(!Cell::FirstIngredient.is_walkable());
        assert!(!Cell::SecondIngredient.is_walkable());

        let landscape = Landscape::new(20, 80);
        assert!(!landscape.is_walkable(Position::new(-1, 0)));
        assert!(!landscape.is_walkable(Position::new(0, 80)));
        assert!(landscape.is_walkable(Position::new(19, 79)));
    }
}
