//! # herald-bot
//!
//! Application crate: configuration, component wiring, content jobs, mention and forward
//! handlers, the daily schedule, the axum HTTP surface and the CLI.

pub mod briefing;
pub mod cli;
pub mod components;
pub mod config;
pub mod content;
pub mod handlers;
pub mod runner;
pub mod schedule;
pub mod server;
pub mod video;

pub use components::{
    build_bot_components, build_handler_chain, build_scheduler, initialize_bot_components,
    BotComponents, Collaborators,
};
pub use config::BotConfig;
pub use content::{ContentJob, ContentService};
pub use handlers::{ChatHandlers, HandlerSettings};
pub use runner::{run_bot, run_scheduler_only, run_trigger};
pub use server::{build_router, AppState};
