pub mod wire;
pub mod serial;

pub use wire::*;
pub use serial::*;
