//! Domain models for the weather forecast pipeline

mod dashboard;
mod forecast;
mod observation;

pub use dashboard::*;
pub use forecast::*;
pub use observation::*;
