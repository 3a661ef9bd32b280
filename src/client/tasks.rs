//! Detection and visualization task control

use tracing::debug;
use vision_shared::{
    BackupVisionLogOptions, Response, ResumeTaskOptions, StartContainerDetectionOptions,
    StartObjectDetectionOptions, StopTaskOptions, VisionError, VisualizePointCloudOptions,
};

use super::VisionControllerClient;
use crate::command::ExecuteOptions;

impl VisionControllerClient {
    /// Start detecting objects in the configured location
    pub async fn start_object_detection_task(
        &mut self,
        options: &StartObjectDetectionOptions,
    ) -> Result<Option<Response>, VisionError> {
        debug!(task_id = ?options.task_id, location = ?options.location_name, "Starting object detection task");
        self.execute_options(options, ExecuteOptions::with_timeout(options.timeout))
            .await
    }

    /// Start detecting the container in the configured location
    pub async fn start_container_detection_task(
        &mut self,
        options: &StartContainerDetectionOptions,
    ) -> Result<Option<Response>, VisionError> {
        debug!(task_id = ?options.task_id, location = ?options.location_name, "Starting container detection task");
        self.execute_options(options, ExecuteOptions::with_timeout(options.timeout))
            .await
    }

    /// Stop the selected tasks. Returns `Ok(None)` when fire-and-forget.
    pub async fn stop_task(
        &mut self,
        options: &StopTaskOptions,
    ) -> Result<Option<Response>, VisionError> {
        debug!(selection = ?options.selection, "Stopping task");
        let execute =
            ExecuteOptions::with_timeout(options.timeout).fire_and_forget(options.fire_and_forget);
        self.execute_options(options, execute).await
    }

    /// Resume the selected tasks. Returns `Ok(None)` when fire-and-forget.
    pub async fn resume_task(
        &mut self,
        options: &ResumeTaskOptions,
    ) -> Result<Option<Response>, VisionError> {
        debug!(selection = ?options.selection, "Resuming task");
        let execute =
            ExecuteOptions::with_timeout(options.timeout).fire_and_forget(options.fire_and_forget);
        self.execute_options(options, execute).await
    }

    pub async fn start_visualize_point_cloud_task(
        &mut self,
        options: &VisualizePointCloudOptions,
    ) -> Result<Option<Response>, VisionError> {
        debug!(location = ?options.location_name, "Starting point cloud visualization");
        self.execute_options(options, ExecuteOptions::with_timeout(options.timeout))
            .await
    }

    /// Back up the detection logs of a cycle
    pub async fn backup_vision_log(
        &mut self,
        options: &BackupVisionLogOptions,
    ) -> Result<Option<Response>, VisionError> {
        debug!(cycle_index = %options.cycle_index, "Backing up vision log");
        let execute =
            ExecuteOptions::with_timeout(options.timeout).fire_and_forget(options.fire_and_forget);
        self.execute_options(options, execute).await
    }
}
