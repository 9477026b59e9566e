pub mod ledger_row;
pub mod person;
pub mod request;
pub mod role;
