//! Administrative operations over the configuration channel

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::info;
use vision_shared::{Command, Response, TaskFilter, VisionError};

use super::results::filtered_command;
use super::VisionControllerClient;

impl VisionControllerClient {
    /// Health check
    pub async fn ping(&mut self, timeout: Duration) -> Result<Response, VisionError> {
        self.configuration.request(Command::new("Ping"), timeout).await
    }

    /// Set log levels per component, e.g. `{"visionmanager": "DEBUG"}`
    pub async fn set_log_level(
        &mut self,
        component_levels: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        let mut command = Command::new("SetLogLevel");
        let levels: Map<String, Value> = component_levels
            .iter()
            .map(|(component, level)| (component.clone(), Value::from(level.as_str())))
            .collect();
        command.insert("componentLevels", levels);
        self.configuration.request(command, timeout).await
    }

    /// Cancel the command currently running on the vision manager
    pub async fn cancel(&mut self, timeout: Duration) -> Result<Response, VisionError> {
        info!("Canceling command...");
        let response = self.configuration.request(Command::new("Cancel"), timeout).await?;
        info!("Command is stopped");
        Ok(response)
    }

    /// Shut the vision manager down
    pub async fn quit(&mut self, timeout: Duration) -> Result<Response, VisionError> {
        info!("Stopping vision manager...");
        let response = self.configuration.request(Command::new("Quit"), timeout).await?;
        info!("Vision manager is stopped");
        Ok(response)
    }

    /// State of the selected task, answered by the configuration service
    pub async fn get_task_state(
        &mut self,
        filter: &TaskFilter,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        let command = filtered_command("GetTaskState", filter)?;
        self.configuration.request(command, timeout).await
    }

    /// Published state, answered by the configuration service instead of
    /// the status publisher
    pub async fn get_published_state_service(
        &mut self,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        self.configuration
            .request(Command::new("GetPublishedState"), timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vision_shared::{defaults, ErrorKind};

    use super::*;
    use crate::client::test_support::harness;
    use crate::transport::mock::MockReply;

    #[tokio::test]
    async fn test_ping_uses_configuration_channel() {
        let mut h = harness(Some("cell-3"), vec![], vec![MockReply::Json(json!({"pong": 1}))]);

        let reply = h.client.ping(defaults::COMMAND_TIMEOUT).await.unwrap();

        assert_eq!(reply.get("pong"), Some(&json!(1)));
        assert!(h.commands.lock().unwrap().sent.is_empty());
        let log = h.configuration.lock().unwrap();
        assert_eq!(
            serde_json::to_value(&log.sent[0]).unwrap(),
            json!({"command": "Ping", "callerid": "cell-3"})
        );
    }

    #[tokio::test]
    async fn test_set_log_level_payload() {
        let mut h = harness(None, vec![], vec![MockReply::Json(json!({}))]);
        let levels = BTreeMap::from([("visionmanager".to_string(), "DEBUG".to_string())]);

        h.client.set_log_level(&levels, defaults::COMMAND_TIMEOUT).await.unwrap();

        let log = h.configuration.lock().unwrap();
        assert_eq!(
            log.sent[0].get("componentLevels"),
            Some(&json!({"visionmanager": "DEBUG"}))
        );
    }

    #[tokio::test]
    async fn test_cancel_and_quit() {
        let mut h = harness(
            None,
            vec![],
            vec![MockReply::Json(json!({})), MockReply::Json(json!({}))],
        );

        h.client.cancel(defaults::COMMAND_TIMEOUT).await.unwrap();
        h.client.quit(defaults::COMMAND_TIMEOUT).await.unwrap();

        let log = h.configuration.lock().unwrap();
        let names: Vec<_> = log.sent.iter().map(|c| c.name().to_owned()).collect();
        assert_eq!(names, ["Cancel", "Quit"]);
    }

    #[tokio::test]
    async fn test_task_state_filter() {
        let mut h = harness(None, vec![], vec![MockReply::Json(json!({"state": "Running"}))]);
        let filter = TaskFilter {
            task_id: Some("t1".into()),
            ..TaskFilter::default()
        };

        let reply = h
            .client
            .get_task_state(&filter, defaults::SERVICE_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(reply.get("state"), Some(&json!("Running")));
        let log = h.configuration.lock().unwrap();
        assert_eq!(
            serde_json::to_value(&log.sent[0]).unwrap(),
            json!({"command": "GetTaskState", "taskId": "t1"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_published_state_service_timeout() {
        let mut h = harness(None, vec![], vec![MockReply::Silent]);

        let err = h
            .client
            .get_published_state_service(defaults::SERVICE_TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("GetPublishedState"));
    }
}
