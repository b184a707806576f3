#![forbid(unsafe_code)]

pub mod error;
pub mod fallback;
pub mod guided;
pub mod model;
pub mod progress;
pub mod rules;
pub mod streak;
pub mod time;

pub use error::Error;
pub use rules::StudyRules;
pub use time::Clock;
