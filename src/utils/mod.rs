pub mod code_generator;
pub mod jwt;

pub use code_generator::{format_card_code, generate_card_codes, normalize_card_code};
pub use jwt::*;
