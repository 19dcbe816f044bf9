mod config;
mod error;
mod ranker;
mod score;

pub mod memory;

pub use config::RankerConfig;
pub use error::Error;
pub use ranker::ActiveUserRanker;
pub use score::{rank, tally};
