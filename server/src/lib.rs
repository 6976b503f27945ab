//! Arena server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod broadcast;
pub mod config;
pub mod food;
pub mod game_loop;
pub mod player;
pub mod protocol;
pub mod world;
pub mod ws;
