//! Word distributions and the global statistics that smooth them.

pub mod global;
pub mod memo;
pub mod word_dist;

pub use global::{GlobalStats, GlobalStatsBuilder};
pub use memo::Word;
pub use word_dist::{DistState, WordDist};
