//! Polling the state published on the status port

use std::time::Duration;

use serde_json::Value;
use vision_shared::{TransportError, VisionError};

use super::VisionControllerClient;

const PUBLISHED_STATE: &str = "GetPublishedState";

impl VisionControllerClient {
    /// Newest published state, or `None` if nothing arrived within `timeout`.
    ///
    /// Subscribes on first use. A `None` timeout waits for the next message.
    pub async fn get_published_state(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, VisionError> {
        let factory = &self.subscriber_factory;
        let subscriber = self.subscriber.get_or_insert_with(|| factory());

        let raw = match subscriber.spin_once(timeout, true).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(TransportError::Timeout(t)) => {
                return Err(VisionError::Timeout {
                    command: PUBLISHED_STATE.into(),
                    timeout: t,
                    endpoint: subscriber.endpoint().to_owned(),
                })
            }
            Err(e) => return Err(VisionError::communication(PUBLISHED_STATE, e)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| VisionError::communication(PUBLISHED_STATE, TransportError::MalformedReply(e)))
    }
}
