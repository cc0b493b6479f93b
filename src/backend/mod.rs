pub mod client;
pub mod fanout;
pub mod inflight;
pub mod session;
