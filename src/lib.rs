//! Kickturn skateboard locomotion core
//!
//! The library exposes the skater state machine, the balance model and the
//! grind-rail extraction pipeline so that hosts (the bundled CLI, tests, or a
//! game loop) can drive skaters over a rapier-backed geometry world.

pub mod config;
pub mod game;
