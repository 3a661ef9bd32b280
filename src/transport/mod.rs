//! Transports to the vision manager
//!
//! This module handles:
//! - The request/response channel trait and its TCP implementation
//! - The state subscription trait and its TCP implementation
//! - Preemption and destroy signals observed while blocked

pub mod interrupt;
pub mod subscriber;
pub mod tcp;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use interrupt::{DestroyHandle, Interrupts, PreemptCheck};
pub use subscriber::TcpStateSubscriber;
pub use tcp::TcpRequestChannel;
pub use traits::{RequestChannel, SendOptions, StateSubscriber};
