pub mod common;
pub mod course;
pub mod pagination;
pub mod recharge_card;
pub mod wallet;

pub use common::*;
pub use course::*;
pub use pagination::*;
pub use recharge_card::*;
pub use wallet::*;
