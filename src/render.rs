use crate::entities::AgentKind;
use crate::frame::{AgentView, Frame, Status};
use crate::landscape::{Cell, Position};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::collections::HashMap;
use std::io::{self, Write};

const LAB_LABEL: &str = "VACCINE LAB";

/// Draws frames somewhere. The engine never knows where.
pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> io::Result<()>;

    /// Called once after the final frame.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Draws frames as coloured glyphs on a terminal.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> TerminalRenderer<W> {
        TerminalRenderer { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw_grid(&mut self, frame: &Frame) -> io::Result<()> {
        let agents: HashMap<Position, &AgentView> = frame
            .agents
            .iter()
            .map(|agent| (agent.position, agent))
            .collect();
        let label_start = frame.cols.saturating_sub(LAB_LABEL.len() + 1);

        for row in 0..frame.rows {
            for col in 0..frame.cols {
                let position = Position::new(row as i32, col as i32);
                let label = (row == 0)
                    .then(|| LAB_LABEL.chars().nth(col.wrapping_sub(label_start)))
                    .flatten();

                // Agents are drawn over the label, the label over the terrain
                let (glyph, foreground, background) = match (agents.get(&position), label) {
                    (Some(agent), _) => agent_glyph(agent),
                    (None, Some(letter)) => (letter, Color::Black, Color::Grey),
                    (None, None) => cell_glyph(frame.cell(row, col).unwrap_or(Cell::Empty)),
                };

                queue!(
                    self.out,
                    SetForegroundColor(foreground),
                    SetBackgroundColor(background),
                    Print(glyph),
                    ResetColor
                )?;
            }
            queue!(self.out, Print("\n"))?;
        }

        Ok(())
    }

    fn draw_status(&mut self, status: &Status) -> io::Result<()> {
        queue!(
            self.out,
            Print(format!(
                "\nTick: {}    Agents: {}    Medics: {}    Infected: {}\n",
                status.tick, status.agents, status.medics, status.infected
            )),
            Print(format!(
                "Wall health: {}    Vaccine progress: {:.1}%\n",
                status.wall_health, status.vaccine_progress
            ))
        )?;

        if let Some(health) = status.scavenger_health {
            queue!(self.out, Print(format!("Scavenger health: {health}")))?;

            if let Some(progress) = status.scavenger_progress {
                queue!(
                    self.out,
                    Print(format!(
                        "    Gate: {}    First: {}    Second: {}    Lab: {}",
                        tick_mark(progress.reached_gate),
                        tick_mark(progress.has_first_ingredient),
                        tick_mark(progress.has_second_ingredient),
                        tick_mark(progress.reached_facility)
                    ))
                )?;
            }
            queue!(self.out, Print("\n"))?;
        }

        queue!(
            self.out,
            SetForegroundColor(Color::Yellow),
            Print(format!("\n{}\n", status.note)),
            ResetColor
        )
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0), Hide)?;
        self.draw_grid(frame)?;
        self.draw_status(&frame.status)?;
        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        queue!(self.out, Show, Print("\n"))?;
        self.out.flush()
    }
}

fn agent_glyph(agent: &AgentView) -> (char, Color, Color) {
    match (agent.kind, agent.infected) {
        (AgentKind::Person, false) => ('@', Color::Black, Color::Green),
        (AgentKind::Medic, false) => ('+', Color::Black, Color::Cyan),
        (AgentKind::Scavenger, _) => ('S', Color::Black, Color::Yellow),
        (_, true) => ('@', Color::White, Color::Red),
    }
}

fn cell_glyph(cell: Cell) -> (char, Color, Color) {
    match cell {
        Cell::Empty => (' ', Color::Reset, Color::Reset),
        Cell::Wall => ('#', Color::White, Color::Reset),
        Cell::FirstIngredient => ('1', Color::Black, Color::Yellow),
        Cell::SecondIngredient => ('2', Color::Black, Color::Magenta),
        Cell::ResearchFloor => (' ', Color::Reset, Color::Grey),
    }
}

fn tick_mark(done: bool) -> char {
    if done {
        'x'
    } else {
        '-'
    }
}

/// Writes every frame as one line of JSON.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> JsonRenderer<W> {
        JsonRenderer { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::SimulationConfig;
    use crate::status::StatusNote;

    fn first_frame() -> Frame {
        let mut board = Board::with_seed(SimulationConfig::default(), 21).unwrap();
        board.start().unwrap();
        board.update().unwrap()
    }

    #[test]
    fn when_rendering_to_a_terminal_the_grid_and_status_are_drawn() {
        let frame = first_frame();
        let mut renderer = TerminalRenderer::new(Vec::new());

        renderer.render(&frame).unwrap();
        renderer.finish().unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains('#'));
        assert!(output.contains('1'));
        assert!(output.contains('2'));
        assert!(output.contains('+'));
        assert!(output.contains('@'));
        assert!(output.contains("Tick: 0"));
        assert!(output.contains("Wall health:"));
        assert!(output.contains("Infected: "));
        assert!(output.contains(StatusNote::ResearchBegun.message()));
    }

    #[test]
    fn when_choosing_glyphs_infected_agents_are_red_and_the_scavenger_stands_out() {
        let view = |kind, infected| AgentView {
            id: String::new(),
            position: Position::default(),
            kind,
            infected,
        };

        assert_eq!(agent_glyph(&view(AgentKind::Person, false)).0, '@');
        assert_eq!(agent_glyph(&view(AgentKind::Person, true)).2, Color::Red);
        assert_eq!(agent_glyph(&view(AgentKind::Medic, false)).0, '+');
        assert_eq!(agent_glyph(&view(AgentKind::Medic, true)).0, '@');
        assert_eq!(agent_glyph(&view(AgentKind::Scavenger, false)).0, 'S');
        assert_eq!(cell_glyph(Cell::Wall).0, '#');
        assert_eq!(cell_glyph(Cell::ResearchFloor).2, Color::Grey);
    }

    #[test]
    fn when_rendering_as_json_each_frame_is_one_parsable_line() {
        let frame = first_frame();
        let mut renderer = JsonRenderer::new(Vec::new());

        renderer.render(&frame).unwrap();
        renderer.render(&frame).unwrap();
        renderer.finish().unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["rows"], 20);
        assert_eq!(value["cols"], 80);
        assert_eq!(value["cells"].as_array().unwrap().len(), 1600);
        assert_eq!(value["agents"].as_array().unwrap().len(), 18);
        assert_eq!(value["status"]["tick"], 0);
        assert_eq!(value["status"]["note"], "ResearchBegun");
        assert_eq!(value["finished"], false);
    }
}
