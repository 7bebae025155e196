pub mod courses;
pub mod enrollments;
pub mod recharge_cards;
pub mod wallet_transactions;
pub mod wallets;

pub use courses as course_entity;
pub use enrollments as enrollment_entity;
pub use recharge_cards as recharge_card_entity;
pub use wallet_transactions as wallet_transaction_entity;
pub use wallets as wallet_entity;

pub use recharge_cards::CardStatus;
pub use wallet_transactions::TransactionKind;
