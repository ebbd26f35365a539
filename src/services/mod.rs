pub mod backend;
pub mod cascade;
pub mod identity;
pub mod ledger;
pub mod moderation;
pub mod store;
