//! Detection results and statistics queries

use std::time::Duration;

use tracing::debug;
use vision_shared::{
    Command, CommandOptions, DetectionResultImagesOptions, Response, TaskFilter, VisionError,
};

use super::{encode_error, VisionControllerClient};
use crate::command::ExecuteOptions;

impl VisionControllerClient {
    /// Latest detected objects of the selected task
    pub async fn get_latest_detected_objects(
        &mut self,
        filter: &TaskFilter,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        let command = filtered_command("GetLatestDetectedObjects", filter)?;
        self.commands.request(command, timeout, true).await
    }

    /// Latest detection result images as a raw payload.
    ///
    /// With `block_wait` off this only sends the request and returns
    /// `Ok(None)`; the images are then collected with
    /// [`wait_for_latest_detection_result_images`](Self::wait_for_latest_detection_result_images).
    pub async fn get_latest_detection_result_images(
        &mut self,
        options: &DetectionResultImagesOptions,
    ) -> Result<Option<Response>, VisionError> {
        let execute = ExecuteOptions::with_timeout(options.timeout)
            .raw()
            .block_wait(options.block_wait);
        self.execute_options(options, execute).await
    }

    /// Collect the images requested by a deferred
    /// [`get_latest_detection_result_images`](Self::get_latest_detection_result_images)
    pub async fn wait_for_latest_detection_result_images(
        &mut self,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        let command = Command::new(DetectionResultImagesOptions::COMMAND);
        self.commands
            .wait_for_response(false, timeout, Some(&command))
            .await
    }

    /// Detection result at the given sensor timestamp (unix ms), as a raw payload
    pub async fn get_detection_history(
        &mut self,
        timestamp: u64,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        debug!(timestamp, "Getting detection history");
        let mut command = Command::new("GetDetectionHistory");
        command.insert("timestamp", timestamp);
        self.commands.request(command, timeout, false).await
    }

    pub async fn get_vision_statistics(
        &mut self,
        filter: &TaskFilter,
        timeout: Duration,
    ) -> Result<Response, VisionError> {
        let command = filtered_command("GetVisionStatistics", filter)?;
        self.commands.request(command, timeout, true).await
    }
}

/// A command carrying only the fields of a task filter
pub(super) fn filtered_command(name: &str, filter: &TaskFilter) -> Result<Command, VisionError> {
    let mut command = Command::new(name);
    command.merge(filter).map_err(encode_error(name))?;
    Ok(command)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vision_shared::ErrorKind;

    use super::*;
    use crate::client::test_support::harness;
    use crate::transport::mock::MockReply;

    #[tokio::test]
    async fn test_detected_objects_filter() {
        let mut h = harness(None, vec![MockReply::Json(json!({"objects": []}))], vec![]);
        let filter = TaskFilter {
            task_type: Some("objectdetection".into()),
            ..TaskFilter::default()
        };

        let reply = h
            .client
            .get_latest_detected_objects(&filter, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(reply.get("objects"), Some(&json!([])));
        let log = h.commands.lock().unwrap();
        assert_eq!(
            serde_json::to_value(&log.sent[0]).unwrap(),
            json!({"command": "GetLatestDetectedObjects", "taskType": "objectdetection"})
        );
    }

    #[tokio::test]
    async fn test_deferred_result_images() {
        let mut h = harness(None, vec![MockReply::Raw(b"\x00\x01image")], vec![]);
        let options = DetectionResultImagesOptions {
            block_wait: false,
            ..DetectionResultImagesOptions::default()
        };

        let reply = h.client.get_latest_detection_result_images(&options).await.unwrap();
        assert!(reply.is_none());
        assert!(h.client.is_waiting_response());

        let images = h
            .client
            .wait_for_latest_detection_result_images(Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(images.as_bytes().map(|b| &b[..]), Some(&b"\x00\x01image"[..]));

        let log = h.commands.lock().unwrap();
        assert_eq!(log.sent[0].get("newerthantimestamp"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_wait_for_images_without_request() {
        let mut h = harness(None, vec![], vec![]);

        let err = h
            .client
            .wait_for_latest_detection_result_images(Duration::from_secs(2))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidWait);
        assert!(err.to_string().contains("GetLatestDetectionResultImages"));
    }

    #[tokio::test]
    async fn test_detection_history_empty_reply() {
        let mut h = harness(None, vec![MockReply::Raw(b"")], vec![]);

        let err = h
            .client
            .get_detection_history(1_700_000_000_000, Duration::from_secs(2))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
        let log = h.commands.lock().unwrap();
        assert_eq!(log.sent[0].get("timestamp"), Some(&json!(1_700_000_000_000u64)));
    }

    #[tokio::test]
    async fn test_detection_history_json_reply() {
        let mut h = harness(None, vec![MockReply::Raw(br#"{"result":1}"#)], vec![]);

        let reply = h
            .client
            .get_detection_history(5, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(reply.get("result"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_vision_statistics_unfiltered() {
        let mut h = harness(None, vec![MockReply::Json(json!({"stats": {}}))], vec![]);

        h.client
            .get_vision_statistics(&TaskFilter::default(), Duration::from_secs(2))
            .await
            .unwrap();

        let log = h.commands.lock().unwrap();
        assert_eq!(serde_json::to_value(&log.sent[0]).unwrap(), json!({"command": "GetVisionStatistics"}));
    }
}
