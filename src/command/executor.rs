//! Command executor - dispatches commands and validates their replies

use std::time::Duration;

use tracing::debug;
use vision_shared::{defaults, validate_response, Command, Response, TransportError, VisionError};

use crate::transport::{RequestChannel, SendOptions};

/// Per-call options for [`CommandExecutor::execute`]
#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    /// Send only; nothing is awaited or validated
    pub fire_and_forget: bool,
    pub timeout: Duration,
    /// Decode the reply as JSON before validation
    pub recv_json: bool,
    /// Poll the preemption callback while blocked
    pub check_preempt: bool,
    /// Wait for the reply now. When false the reply is collected later
    /// with [`CommandExecutor::wait_for_response`].
    pub block_wait: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            fire_and_forget: false,
            timeout: defaults::COMMAND_TIMEOUT,
            recv_json: true,
            check_preempt: true,
            block_wait: true,
        }
    }
}

impl ExecuteOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Keep the reply as raw bytes
    pub fn raw(mut self) -> Self {
        self.recv_json = false;
        self
    }

    pub fn fire_and_forget(mut self, fire_and_forget: bool) -> Self {
        self.fire_and_forget = fire_and_forget;
        self
    }

    pub fn block_wait(mut self, block_wait: bool) -> Self {
        self.block_wait = block_wait;
        self
    }
}

/// Sends commands over one request channel and turns replies into
/// validated results or typed failures
pub struct CommandExecutor {
    channel: Option<Box<dyn RequestChannel>>,
    caller_id: Option<String>,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new(channel: Box<dyn RequestChannel>, caller_id: Option<String>) -> Self {
        Self {
            channel: Some(channel),
            caller_id,
        }
    }

    /// Execute a command.
    ///
    /// Returns `Ok(None)` for fire-and-forget and deferred calls; the reply of
    /// a deferred call is collected with [`wait_for_response`](Self::wait_for_response).
    pub async fn execute(
        &mut self,
        mut command: Command,
        options: ExecuteOptions,
    ) -> Result<Option<Response>, VisionError> {
        if let Some(caller_id) = &self.caller_id {
            command.set_caller_id(caller_id);
        }
        let name = command.name().to_owned();
        let channel = self.channel_mut(&name)?;

        debug!(
            command = %name,
            endpoint = channel.endpoint(),
            fire_and_forget = options.fire_and_forget,
            block_wait = options.block_wait,
            "Sending command"
        );

        let send = SendOptions {
            fire_and_forget: options.fire_and_forget,
            timeout: options.timeout,
            check_preempt: options.check_preempt,
        };
        if let Err(e) = channel.send(&command, send).await {
            return Err(translate(e, &name, channel.endpoint()));
        }

        if options.fire_and_forget || !options.block_wait {
            return Ok(None);
        }

        self.wait(
            options.recv_json,
            options.timeout,
            Some(&command),
            options.check_preempt,
        )
        .await
        .map(Some)
    }

    /// Execute a blocking command and return its validated reply
    pub async fn request(
        &mut self,
        command: Command,
        timeout: Duration,
        recv_json: bool,
    ) -> Result<Response, VisionError> {
        let options = ExecuteOptions {
            timeout,
            recv_json,
            ..ExecuteOptions::default()
        };
        let name = command.name().to_owned();
        self.execute(command, options)
            .await?
            .ok_or_else(|| VisionError::EmptyResponse { command: name })
    }

    /// Wait for the reply to an outstanding command and validate it.
    ///
    /// Fails with [`VisionError::InvalidWait`] when nothing is outstanding.
    /// The wait can be preempted.
    pub async fn wait_for_response(
        &mut self,
        recv_json: bool,
        timeout: Duration,
        command: Option<&Command>,
    ) -> Result<Response, VisionError> {
        self.wait(recv_json, timeout, command, true).await
    }

    async fn wait(
        &mut self,
        recv_json: bool,
        timeout: Duration,
        command: Option<&Command>,
        check_preempt: bool,
    ) -> Result<Response, VisionError> {
        let name = command.map(|c| c.name().to_owned()).unwrap_or_default();
        let channel = self.channel_mut(&name)?;

        if !channel.is_waiting_reply() {
            return Err(VisionError::InvalidWait { command: name });
        }

        let response = match channel.receive(timeout, recv_json, check_preempt).await {
            Ok(response) => response,
            Err(e) => return Err(translate(e, &name, channel.endpoint())),
        };
        debug!(command = %name, "Received reply");

        validate_response(response, &name)
    }

    /// Whether a deferred command is still awaiting its reply
    pub fn is_awaiting_response(&self) -> bool {
        self.channel
            .as_ref()
            .is_some_and(|channel| channel.is_waiting_reply())
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.channel.as_ref().map(|channel| channel.endpoint())
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Shut down and drop the channel. Later calls fail with a
    /// communication error; releasing twice is a no-op.
    pub async fn release(&mut self) -> Result<(), TransportError> {
        match self.channel.take() {
            Some(mut channel) => channel.shutdown().await,
            None => Ok(()),
        }
    }

    fn channel_mut(&mut self, command: &str) -> Result<&mut Box<dyn RequestChannel>, VisionError> {
        self.channel
            .as_mut()
            .ok_or_else(|| VisionError::communication(command, TransportError::Released))
    }
}

/// Timeouts keep the duration that actually elapsed, which is the connect
/// timeout when the connection could not be opened.
fn translate(error: TransportError, command: &str, endpoint: &str) -> VisionError {
    match error {
        TransportError::Timeout(timeout) => VisionError::Timeout {
            command: command.to_owned(),
            timeout,
            endpoint: endpoint.to_owned(),
        },
        other => VisionError::communication(command, other),
    }
}
