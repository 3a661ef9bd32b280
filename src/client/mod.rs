//! High-level vision controller client
//!
//! Owns the command executor, the configuration channel and the lazily
//! created state subscription for its lifetime. Teardown is explicit via
//! [`VisionControllerClient::destroy`] and may be repeated.

mod results;
mod service;
mod state;
mod tasks;

use std::time::Duration;

use tracing::{debug, error};
use vision_shared::{Command, CommandOptions, Response, TransportError, VisionError};

use crate::command::{CommandExecutor, ConfigurationChannel, ExecuteOptions};
use crate::config::{ClientConfig, ConfigError};
use crate::transport::{
    DestroyHandle, Interrupts, PreemptCheck, RequestChannel, StateSubscriber, TcpRequestChannel,
    TcpStateSubscriber,
};

/// Creates the state subscription on first use
pub type SubscriberFactory = Box<dyn Fn() -> Box<dyn StateSubscriber> + Send + Sync>;

/// Client for a remote vision manager
pub struct VisionControllerClient {
    config: ClientConfig,
    destroy: DestroyHandle,
    commands: CommandExecutor,
    configuration: ConfigurationChannel,
    subscriber: Option<Box<dyn StateSubscriber>>,
    subscriber_factory: SubscriberFactory,
}

impl VisionControllerClient {
    /// Create a client connecting lazily over TCP.
    ///
    /// Fails when the configuration or status port would overflow.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Create a client whose waits are preempted when `check` returns an error
    pub fn with_preempt_check(
        config: ClientConfig,
        check: PreemptCheck,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(check))
    }

    fn build(config: ClientConfig, preempt: Option<PreemptCheck>) -> Result<Self, ConfigError> {
        let configuration_address = config.configuration_address()?;
        let status_address = config.status_address()?;
        let destroy = DestroyHandle::new();
        let interrupts = Interrupts::new(preempt, destroy.clone());

        let commands = TcpRequestChannel::new(config.command_address(), interrupts.clone())
            .with_timeouts(config.connect_timeout, config.reconnection_timeout);
        let configuration =
            TcpRequestChannel::new(configuration_address, interrupts.clone())
                .with_timeouts(config.connect_timeout, config.reconnection_timeout);

        let connect_timeout = config.connect_timeout;
        let factory: SubscriberFactory = Box::new(move || -> Box<dyn StateSubscriber> {
            Box::new(
                TcpStateSubscriber::new(status_address.clone(), interrupts.clone())
                    .with_connect_timeout(connect_timeout),
            )
        });

        Ok(Self::from_parts(
            config,
            destroy,
            Box::new(commands),
            Box::new(configuration),
            factory,
        ))
    }

    /// Assemble a client from already constructed channels.
    ///
    /// `destroy` should be the handle the channels observe so that
    /// [`set_destroy`](Self::set_destroy) aborts their waits.
    pub fn from_parts(
        config: ClientConfig,
        destroy: DestroyHandle,
        commands: Box<dyn RequestChannel>,
        configuration: Box<dyn RequestChannel>,
        subscriber_factory: SubscriberFactory,
    ) -> Self {
        let caller_id = config.caller_id.clone();
        Self {
            commands: CommandExecutor::new(commands, caller_id.clone()),
            configuration: ConfigurationChannel::new(configuration, caller_id),
            subscriber: None,
            subscriber_factory,
            destroy,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Abort every in-progress wait at its next poll without releasing anything
    pub fn set_destroy(&self) {
        self.destroy.trigger();
    }

    /// Handle for aborting waits from another task
    pub fn destroy_handle(&self) -> DestroyHandle {
        self.destroy.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy.is_triggered()
    }

    /// Abort pending waits and release every channel.
    ///
    /// A channel that fails to close is logged and the remaining ones are
    /// still released. Calling this again is a no-op.
    pub async fn destroy(&mut self) {
        self.set_destroy();

        if self.commands.has_channel() {
            if let Err(e) = self.commands.release().await {
                error!("Problem destroying command channel: {}", e);
            }
        }

        if self.configuration.has_channel() {
            if let Err(e) = self.configuration.release().await {
                error!("Problem destroying configuration channel: {}", e);
            }
        }

        if let Some(mut subscriber) = self.subscriber.take() {
            if let Err(e) = subscriber.shutdown().await {
                error!("Problem destroying state subscriber: {}", e);
            }
        }
    }

    /// Whether no channel or subscription is held any more
    pub fn is_released(&self) -> bool {
        !self.commands.has_channel() && !self.configuration.has_channel() && self.subscriber.is_none()
    }

    /// Execute an arbitrary command on the command channel
    pub async fn execute(
        &mut self,
        command: Command,
        options: ExecuteOptions,
    ) -> Result<Option<Response>, VisionError> {
        self.commands.execute(command, options).await
    }

    /// Collect the reply of a deferred command
    pub async fn wait_for_response(
        &mut self,
        recv_json: bool,
        timeout: Duration,
        command: Option<&Command>,
    ) -> Result<Response, VisionError> {
        self.commands.wait_for_response(recv_json, timeout, command).await
    }

    /// Whether the command channel awaits the reply of a deferred command
    pub fn is_waiting_response(&self) -> bool {
        self.commands.is_awaiting_response()
    }

    /// Build and send a command from typed options
    async fn execute_options<T: CommandOptions>(
        &mut self,
        options: &T,
        execute: ExecuteOptions,
    ) -> Result<Option<Response>, VisionError> {
        let command = build_command(options)?;
        debug!(command = T::COMMAND, "Executing");
        self.commands.execute(command, execute).await
    }
}

fn build_command<T: CommandOptions>(options: &T) -> Result<Command, VisionError> {
    options
        .to_command()
        .map_err(|e| VisionError::communication(T::COMMAND, TransportError::Encode(e)))
}

fn encode_error(command: &str) -> impl FnOnce(serde_json::Error) -> VisionError + '_ {
    move |e| VisionError::communication(command, TransportError::Encode(e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::transport::mock::{MockChannel, MockLog, MockReply, MockSubscriber};

    pub(crate) struct Harness {
        pub client: VisionControllerClient,
        pub commands: Arc<Mutex<MockLog>>,
        pub configuration: Arc<Mutex<MockLog>>,
    }

    pub(crate) fn harness(
        caller_id: Option<&str>,
        command_replies: Vec<MockReply>,
        configuration_replies: Vec<MockReply>,
    ) -> Harness {
        harness_with_state(caller_id, command_replies, configuration_replies, Vec::new())
    }

    pub(crate) fn harness_with_state(
        caller_id: Option<&str>,
        command_replies: Vec<MockReply>,
        configuration_replies: Vec<MockReply>,
        states: Vec<&'static str>,
    ) -> Harness {
        let (commands, command_log) = MockChannel::new("mock:7004", command_replies);
        let (configuration, configuration_log) =
            MockChannel::new("mock:7006", configuration_replies);
        let config = ClientConfig {
            caller_id: caller_id.map(String::from),
            ..ClientConfig::default()
        };
        let states = Mutex::new(Some(states));
        let factory: SubscriberFactory = Box::new(move || -> Box<dyn StateSubscriber> {
            let messages = states.lock().unwrap().take().unwrap_or_default();
            Box::new(MockSubscriber::new(messages))
        });

        Harness {
            client: VisionControllerClient::from_parts(
                config,
                DestroyHandle::new(),
                Box::new(commands),
                Box::new(configuration),
                factory,
            ),
            commands: command_log,
            configuration: configuration_log,
        }
    }
}
