pub mod invoice_text;
pub mod memory;
pub mod models;
pub mod rental_repo;
