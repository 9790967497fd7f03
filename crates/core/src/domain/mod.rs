pub mod customer;
pub mod transaction;
