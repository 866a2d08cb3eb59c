#![warn(clippy::pedantic)]
#![warn(clippy::style)]
#![warn(clippy::nursery)]
// Just let me cast in peace
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

pub mod action;
pub mod behavior;
pub mod control;
pub mod env;
pub mod episode;
pub mod parallel;
pub mod policy;
pub mod prediction;
pub mod table;
pub mod value;

/// Training progress is logged once every this many episodes.
pub const LOG_INTERVAL: u64 = 10_000;
