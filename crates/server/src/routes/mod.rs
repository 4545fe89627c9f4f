pub mod admin;
pub mod health;
pub mod ledger;
pub mod search;
pub mod versions;
