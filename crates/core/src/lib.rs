#![forbid(unsafe_code)]

pub mod mapping;
pub mod model;
pub mod shuffle;
pub mod stats;
pub mod text;
pub mod time;

pub use time::Clock;
