pub mod motion;
pub mod packet;
pub mod position;
pub mod record;

pub use motion::*;
pub use packet::*;
pub use position::*;
pub use record::*;
