//! Types shared between the arena server and its browser client.

pub mod config;
pub mod geometry;
pub mod protocol;
