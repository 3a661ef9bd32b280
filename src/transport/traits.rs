//! Channel trait abstraction for pluggable vision manager transports

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use vision_shared::{Command, Response, TransportError};

/// Per-call options for [`RequestChannel::send`]
#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    /// Send only; no reply will be awaited
    pub fire_and_forget: bool,
    /// Upper bound for writing the command
    pub timeout: Duration,
    /// Poll the preemption callback while blocked
    pub check_preempt: bool,
}

/// A request/response channel to the vision manager
///
/// At most one reply may be outstanding. The channel owns the pending-wait
/// flag: [`send`](RequestChannel::send) sets it unless the command is
/// fire-and-forget, and [`receive`](RequestChannel::receive) clears it once
/// the wait is over, except when the wait was preempted.
#[async_trait]
pub trait RequestChannel: Send {
    /// Send a command. Fails with [`TransportError::Busy`] while a reply is outstanding.
    async fn send(&mut self, command: &Command, options: SendOptions) -> Result<(), TransportError>;

    /// Wait for the reply to the last command sent
    async fn receive(
        &mut self,
        timeout: Duration,
        recv_json: bool,
        check_preempt: bool,
    ) -> Result<Response, TransportError>;

    /// Whether a reply is outstanding
    fn is_waiting_reply(&self) -> bool;

    /// Human-readable endpoint for diagnostics
    fn endpoint(&self) -> &str;

    /// Close the channel gracefully
    async fn shutdown(&mut self) -> Result<(), TransportError>;
}

/// A subscription to the state the vision manager publishes
#[async_trait]
pub trait StateSubscriber: Send {
    /// Return the newest published message, or `None` if nothing arrived
    /// within `timeout`. A `None` timeout waits until a message arrives.
    async fn spin_once(
        &mut self,
        timeout: Option<Duration>,
        check_preempt: bool,
    ) -> Result<Option<Bytes>, TransportError>;

    fn endpoint(&self) -> &str;

    /// Close the subscription gracefully
    async fn shutdown(&mut self) -> Result<(), TransportError>;
}
