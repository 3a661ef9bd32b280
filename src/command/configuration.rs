//! Administrative commands over the configuration channel

use std::time::Duration;

use vision_shared::{Command, Response, TransportError, VisionError};

use super::executor::{CommandExecutor, ExecuteOptions};
use crate::transport::RequestChannel;

/// Wraps the configuration request channel (command port + 2).
///
/// Calls block for their reply unless explicitly fire-and-forget; replies
/// are always decoded as JSON.
pub struct ConfigurationChannel {
    executor: CommandExecutor,
}

impl ConfigurationChannel {
    pub fn new(channel: Box<dyn RequestChannel>, caller_id: Option<String>) -> Self {
        Self {
            executor: CommandExecutor::new(channel, caller_id),
        }
    }

    /// Send a configuration command. Returns `Ok(None)` when fire-and-forget.
    pub async fn send_configuration(
        &mut self,
        command: Command,
        fire_and_forget: bool,
        timeout: Duration,
    ) -> Result<Option<Response>, VisionError> {
        let options = ExecuteOptions::with_timeout(timeout).fire_and_forget(fire_and_forget);
        self.executor.execute(command, options).await
    }

    /// Send a configuration command and wait for its reply
    pub async fn request(&mut self, command: Command, timeout: Duration) -> Result<Response, VisionError> {
        self.executor.request(command, timeout, true).await
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.executor.endpoint()
    }

    pub fn has_channel(&self) -> bool {
        self.executor.has_channel()
    }

    pub async fn release(&mut self) -> Result<(), TransportError> {
        self.executor.release().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockChannel, MockReply};
    use serde_json::json;
    use vision_shared::ErrorKind;

    #[tokio::test]
    async fn test_request_returns_json() {
        let (channel, log) = MockChannel::new("mock:7006", vec![MockReply::Json(json!({"pong": true}))]);
        let mut config = ConfigurationChannel::new(Box::new(channel), Some("ui".into()));

        let reply = config.request(Command::new("Ping"), Duration::from_secs(2)).await.unwrap();

        assert_eq!(reply.get("pong"), Some(&json!(true)));
        let log = log.lock().unwrap();
        assert_eq!(log.sent[0].name(), "Ping");
        assert_eq!(log.sent[0].get("callerid"), Some(&json!("ui")));
    }

    #[tokio::test]
    async fn test_fire_and_forget() {
        let (channel, _) = MockChannel::new("mock:7006", vec![]);
        let mut config = ConfigurationChannel::new(Box::new(channel), None);

        let reply = config
            .send_configuration(Command::new("Quit"), true, Duration::from_secs(2))
            .await
            .unwrap();

        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_structured_error_propagates() {
        let (channel, _) = MockChannel::new(
            "mock:7006",
            vec![MockReply::Json(json!({"error": {"desc": "bad level", "type": "InvalidArguments"}}))],
        );
        let mut config = ConfigurationChannel::new(Box::new(channel), None);

        let err = config
            .request(Command::new("SetLogLevel"), Duration::from_secs(2))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Structured);
        assert_eq!(err.error_type(), "InvalidArguments");
    }
}
