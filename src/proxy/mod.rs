// proxy module - authenticated stdio-to-HTTP relay core

pub mod protocol;
pub mod sequencer;
pub mod session;
pub mod token_manager;
pub mod trace;
pub mod transport;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use token_manager::TokenManager;
pub use transport::Relay;
