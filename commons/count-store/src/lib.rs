pub mod error;
pub mod ids;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

pub use error::*;
pub use ids::*;
pub use traits::*;
