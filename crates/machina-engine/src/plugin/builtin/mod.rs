//! Plugins every deployment gets for free.

pub mod general;
pub mod help;

pub use general::{Hello, PingPong};
pub use help::Help;
