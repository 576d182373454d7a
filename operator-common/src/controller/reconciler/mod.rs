mod error;
mod managed;

pub use error::*;
pub use managed::*;
