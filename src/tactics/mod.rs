//! Scoring helpers shared by the role controllers.

pub mod buildsite;
pub mod damage;
pub mod dodge;
pub mod positioning;
pub mod targeting;

pub use buildsite::*;
pub use damage::*;
pub use dodge::*;
pub use positioning::*;
pub use targeting::*;
