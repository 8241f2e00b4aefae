use outbreak::{Board, JsonRenderer, Renderer, SimulationConfig, TerminalRenderer};
use std::io::{stdout, IsTerminal};
use std::time::Duration;
use tracing_subscriber::prelude::*;

fn main() {
    // Logs go to stderr so they never mix with the frames on stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        tracing::error!("Simulation error: {e}");
        std::process::exit(1);
    }
}

fn run() -> outbreak::Result<()> {
    let mut board = Board::new(SimulationConfig::default())?;

    let interactive = stdout().is_terminal();
    let (mut renderer, pacing): (Box<dyn Renderer>, Duration) = if interactive {
        (Box::new(TerminalRenderer::new(stdout())), board.config().tick_delay)
    } else {
        (Box::new(JsonRenderer::new(stdout().lock())), Duration::ZERO)
    };

    let reason = board.run(renderer.as_mut(), pacing)?;
    tracing::info!(
        reason = ?reason,
        ticks = board.tick(),
        infected = board.infected_count(),
        "Simulation over"
    );

    Ok(())
}
