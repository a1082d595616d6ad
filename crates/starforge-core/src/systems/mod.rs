//! Tick stages. Each stage reads and writes through the [`TickContext`]'s
//! store and reports what it did.
//!
//! [`TickContext`]: crate::context::TickContext

mod combat;
mod construction;
mod movement;
mod npc;
mod production;

pub use combat::*;
pub use construction::*;
pub use movement::*;
pub use npc::*;
pub use production::*;
