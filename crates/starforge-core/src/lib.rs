//! Starforge Core - tick-based 4X simulation engine
//!
//! Games are advanced in discrete ticks. Each tick runs six stages in a
//! fixed order against a shared store:
//!
//! 1. construction (buildings and ships)
//! 2. resource production
//! 3. ship movement
//! 4. combat detection and resolution
//! 5. NPC population and behavior
//! 6. player agents
//!
//! Pure rules live in `starforge-logic`; this crate adds storage ports,
//! the tick pipeline, agent automation, player commands and the scheduler.
//!
//! # Example
//!
//! ```rust,no_run
//! use starforge_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> starforge_core::error::Result<()> {
//! let engine = SimulationEngine::new(
//!     Arc::new(InMemoryStore::new()),
//!     SimulationConfig::default(),
//!     Arc::new(LogSink),
//!     Arc::new(SystemClock),
//!     42,
//! )?;
//! let game = engine.create_game("Demo", &["alice".to_string()]).await?;
//! engine.run_tick(game.game.id, CancellationToken::never()).await?;
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod cancel;
pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::agents::{Behavior, BehaviorRegistry, BehaviorResult};
    pub use crate::cancel::{CancellationToken, Shutdown};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::commands::{Commands, NewAgent};
    pub use crate::config::{Difficulty, SimulationConfig};
    pub use crate::context::TickContext;
    pub use crate::engine::{SimulationEngine, TickReport};
    pub use crate::error::{Result, SimError};
    pub use crate::events::{EventSink, LogSink, NullSink, RecordingSink};
    pub use crate::model::*;
    pub use crate::repository::*;
    pub use crate::scheduler::TickScheduler;
}
