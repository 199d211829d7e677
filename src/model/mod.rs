pub mod account;
pub mod attempt;
pub mod geo;
pub mod hashing;
pub mod lockout;
pub mod password_rules;
