pub mod hub;
pub mod pool;
pub mod position;
pub mod strategy;

pub use hub::*;
pub use pool::*;
pub use position::*;
pub use strategy::*;
