pub mod lenient;
pub mod order;
pub mod user;
