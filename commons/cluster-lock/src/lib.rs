pub mod error;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

pub use error::*;
pub use traits::*;
