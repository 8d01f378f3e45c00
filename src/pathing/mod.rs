pub mod navigator;
pub mod pathfinder;

pub use navigator::*;
pub use pathfinder::*;
