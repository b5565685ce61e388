//! Pure, deterministic logic for the loop.
//!
//! Nothing here touches the filesystem or spawns processes, so every rule
//! can be unit tested on plain values.

pub mod invocation;
pub mod iterations;
pub mod outcome;
pub mod render;
pub mod stream;
