pub mod add_pool;
pub mod claim;
pub mod common;
pub mod configure_hub;
pub mod configure_pool;
pub mod configure_strategy;
pub mod deposit;
pub mod earn;
pub mod execute;
pub mod fund_stream;
pub mod initialize_hub;
pub mod register_strategy;
pub mod views;
pub mod withdraw;

pub use add_pool::*;
pub use claim::*;
pub use configure_hub::*;
pub use configure_pool::*;
pub use configure_strategy::*;
pub use deposit::*;
pub use earn::*;
pub use execute::*;
pub use fund_stream::*;
pub use initialize_hub::*;
pub use register_strategy::*;
pub use views::*;
pub use withdraw::*;
