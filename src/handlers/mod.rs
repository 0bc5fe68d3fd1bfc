pub mod actor;
pub mod orders;
