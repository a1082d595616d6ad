//! Pure simulation logic for Starforge.
//!
//! Everything here is independent of storage, async runtimes and clocks.
//! Functions take plain data (and an injected RNG where randomness is
//! involved) and return results, so they are unit-testable and reusable by
//! the engine, the headless harness and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`combat`] | Detection range, flee odds, damage, round resolution |
//! | [`construction`] | Wall-clock construction progress |
//! | [`galaxy`] | System placement, spanning-tree wormholes, planets |
//! | [`geometry`] | Points, distances, stepping toward a target |
//! | [`grid`] | Planet types and clustered resource grids |
//! | [`movement`] | Travel distance and arrival time for move orders |
//! | [`names`] | Name tables for systems, planets and pirates |
//! | [`npc`] | NPC difficulty tiers, stat scaling, loot, behavior weights |
//! | [`production`] | Per-tick extraction from grid deposits |
//! | [`resources`] | Resource kinds, resource bundles, building types |
//! | [`ships`] | Ship types, lifecycle states, default stats |

pub mod combat;
pub mod construction;
pub mod galaxy;
pub mod geometry;
pub mod grid;
pub mod movement;
pub mod names;
pub mod npc;
pub mod production;
pub mod resources;
pub mod ships;
