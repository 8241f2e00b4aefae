//! # outbreak
//!
//! A walled city holds out against an infection spreading across a small grid.
//! Medics heal, the infected spread, and a lone scavenger fetches two ingredients
//! for the vaccine lab while the city wall slowly crumbles.

pub mod board;
pub use board::Board;

pub mod config;
pub use config::SimulationConfig;

pub mod error;
pub use error::{Result, SimulationError};

pub mod frame;
pub use frame::{AgentView, Frame, Status};

pub mod render;
pub use render::{JsonRenderer, Renderer, TerminalRenderer};

pub mod status;
pub use status::{FinishedReason, Milestone, StatusNote};

pub mod entities;
pub mod landscape;
