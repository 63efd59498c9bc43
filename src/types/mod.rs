pub mod bot;
pub mod position;
pub mod preset;
pub mod stats;
pub mod validation;

pub use bot::*;
pub use position::*;
pub use preset::*;
pub use stats::*;
pub use validation::*;
