//! CLI layer: command definitions and the marketplace application

pub mod app;
pub mod commands;

pub use app::MarketApp;
pub use commands::{Cli, Commands, MeetingAction, ProposalAction, QueryAction};
