pub mod course_service;
pub(crate) mod ledger;
pub mod recharge_card_service;
pub mod wallet_service;

pub use course_service::*;
pub use recharge_card_service::*;
pub use wallet_service::*;
