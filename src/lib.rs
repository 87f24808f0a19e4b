pub mod engine;
pub mod message;
pub mod peer;
pub mod sim;
pub mod util;
