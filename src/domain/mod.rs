pub mod clock;
pub mod errors;
pub mod invoice;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod vehicle;
