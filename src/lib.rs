pub mod config;
pub mod controller;
pub mod database;
pub mod document;
pub mod error;
pub mod gate;
pub mod messages;
pub mod registry;
pub mod reply_queue;

#[cfg(test)]
mod test_helpers;

pub use controller::{ChanceController, Decision, Inbound};
pub use error::Error;
pub use gate::ChanceGate;
pub use registry::{ChanceRegistry, ChatChance};
