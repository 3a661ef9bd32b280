//! Typed options for the high-level vision manager operations
//!
//! One struct per operation. Unset `Option` fields are skipped during
//! serialization, so the payload only carries what the caller supplied.
//! Fields that the vision manager always expects (such as `waitForStop`)
//! are plain values with defaults. `extra` is merged last and can carry
//! fields this crate does not model yet.

use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::command::Command;
use crate::defaults;

/// An options struct that knows which command it builds
pub trait CommandOptions: Serialize {
    /// Command name sent as the `command` field
    const COMMAND: &'static str;

    /// Vision manager init parameters merged right after the command name
    fn vminit_params(&self) -> Option<&Map<String, Value>> {
        None
    }

    /// Build the command payload
    fn to_command(&self) -> Result<Command, serde_json::Error> {
        let mut command = Command::new(Self::COMMAND);
        if let Some(params) = self.vminit_params() {
            command.extend(params.clone());
        }
        command.merge(self)?;
        Ok(command)
    }
}

/// Serialize `Some(true)`/`Some(false)` as `1`/`0`
fn bool_as_int<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(flag) => serializer.serialize_u8(u8::from(*flag)),
        None => serializer.serialize_none(),
    }
}

/// Filter selecting a single task for result and state queries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskFilter {
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "cycleIndex", skip_serializing_if = "Option::is_none")]
    pub cycle_index: Option<String>,
    #[serde(rename = "taskType", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

/// Filter selecting a set of tasks to stop or resume
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskSelection {
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "taskIds", skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<String>>,
    #[serde(rename = "taskType", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(rename = "taskTypes", skip_serializing_if = "Option::is_none")]
    pub task_types: Option<Vec<String>>,
    #[serde(rename = "cycleIndex", skip_serializing_if = "Option::is_none")]
    pub cycle_index: Option<String>,
}

/// Options for `StartObjectDetectionTask`
#[derive(Debug, Clone, Serialize)]
pub struct StartObjectDetectionOptions {
    #[serde(skip)]
    pub vminit_params: Map<String, Value>,
    /// Name of the detected target returned by the detector. Empty means
    /// the name from initialization is used.
    #[serde(rename = "targetupdatename")]
    pub target_update_name: String,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "locationName", skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(
        rename = "ignoreocclusion",
        serialize_with = "bool_as_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub ignore_occlusion: Option<bool>,
    #[serde(
        rename = "targetDynamicDetectorParameters",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_dynamic_detector_parameters: Option<Value>,
    /// Minimum image time (ms) allowed for detection
    #[serde(rename = "detectionstarttimestamp", skip_serializing_if = "Option::is_none")]
    pub detection_start_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(rename = "sendVerificationPointCloud", skip_serializing_if = "Option::is_none")]
    pub send_verification_point_cloud: Option<bool>,
    #[serde(rename = "stopOnNotNeedContainer", skip_serializing_if = "Option::is_none")]
    pub stop_on_not_need_container: Option<bool>,
    #[serde(rename = "maxnumdetection", skip_serializing_if = "Option::is_none")]
    pub max_num_detection: Option<u32>,
    #[serde(rename = "maxnumfastdetection", skip_serializing_if = "Option::is_none")]
    pub max_num_fast_detection: Option<u32>,
    #[serde(rename = "numthreads", skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<u32>,
    #[serde(rename = "cycleIndex", skip_serializing_if = "Option::is_none")]
    pub cycle_index: Option<String>,
    #[serde(rename = "ignorePlanningState", skip_serializing_if = "Option::is_none")]
    pub ignore_planning_state: Option<bool>,
    #[serde(
        rename = "ignoreDetectionFileUpdateChange",
        skip_serializing_if = "Option::is_none"
    )]
    pub ignore_detection_file_update_change: Option<bool>,
    #[serde(rename = "forceClearRegion", skip_serializing_if = "Option::is_none")]
    pub force_clear_region: Option<bool>,
    /// `AutoOnChange` or `WaitTrigger`
    #[serde(rename = "detectionTriggerMode", skip_serializing_if = "Option::is_none")]
    pub detection_trigger_mode: Option<String>,
    #[serde(rename = "useLocationState", skip_serializing_if = "Option::is_none")]
    pub use_location_state: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for StartObjectDetectionOptions {
    fn default() -> Self {
        Self {
            vminit_params: Map::new(),
            target_update_name: String::new(),
            task_id: None,
            location_name: None,
            ignore_occlusion: None,
            target_dynamic_detector_parameters: None,
            detection_start_timestamp: None,
            locale: None,
            send_verification_point_cloud: None,
            stop_on_not_need_container: None,
            max_num_detection: Some(0),
            max_num_fast_detection: Some(1),
            num_threads: None,
            cycle_index: None,
            ignore_planning_state: None,
            ignore_detection_file_update_change: None,
            force_clear_region: None,
            detection_trigger_mode: None,
            use_location_state: None,
            extra: Map::new(),
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for StartObjectDetectionOptions {
    const COMMAND: &'static str = "StartObjectDetectionTask";

    fn vminit_params(&self) -> Option<&Map<String, Value>> {
        Some(&self.vminit_params)
    }
}

/// Options for `StartContainerDetectionTask`
#[derive(Debug, Clone, Serialize)]
pub struct StartContainerDetectionOptions {
    #[serde(skip)]
    pub vminit_params: Map<String, Value>,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "locationName", skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(
        rename = "ignoreocclusion",
        serialize_with = "bool_as_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub ignore_occlusion: Option<bool>,
    #[serde(
        rename = "targetDynamicDetectorParameters",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_dynamic_detector_parameters: Option<Value>,
    #[serde(rename = "detectionstarttimestamp", skip_serializing_if = "Option::is_none")]
    pub detection_start_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(rename = "numthreads", skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<u32>,
    #[serde(rename = "cycleIndex", skip_serializing_if = "Option::is_none")]
    pub cycle_index: Option<String>,
    #[serde(rename = "ignorePlanningState", skip_serializing_if = "Option::is_none")]
    pub ignore_planning_state: Option<bool>,
    #[serde(rename = "stopOnNotNeedContainer", skip_serializing_if = "Option::is_none")]
    pub stop_on_not_need_container: Option<bool>,
    #[serde(rename = "useLocationState", skip_serializing_if = "Option::is_none")]
    pub use_location_state: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for StartContainerDetectionOptions {
    fn default() -> Self {
        Self {
            vminit_params: Map::new(),
            task_id: None,
            location_name: None,
            ignore_occlusion: None,
            target_dynamic_detector_parameters: None,
            detection_start_timestamp: None,
            locale: None,
            num_threads: None,
            cycle_index: None,
            ignore_planning_state: None,
            stop_on_not_need_container: None,
            use_location_state: None,
            extra: Map::new(),
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for StartContainerDetectionOptions {
    const COMMAND: &'static str = "StartContainerDetectionTask";

    fn vminit_params(&self) -> Option<&Map<String, Value>> {
        Some(&self.vminit_params)
    }
}

/// Options for `StopTask`
#[derive(Debug, Clone, Serialize)]
pub struct StopTaskOptions {
    #[serde(flatten)]
    pub selection: TaskSelection,
    /// Wait for the task to stop instead of only triggering it
    #[serde(rename = "waitForStop")]
    pub wait_for_stop: bool,
    /// Stop tracking the task and release its resources
    #[serde(rename = "removeTask")]
    pub remove_task: bool,
    #[serde(skip)]
    pub fire_and_forget: bool,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for StopTaskOptions {
    fn default() -> Self {
        Self {
            selection: TaskSelection::default(),
            wait_for_stop: true,
            remove_task: false,
            fire_and_forget: false,
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for StopTaskOptions {
    const COMMAND: &'static str = "StopTask";
}

/// Options for `ResumeTask`
#[derive(Debug, Clone, Serialize)]
pub struct ResumeTaskOptions {
    #[serde(flatten)]
    pub selection: TaskSelection,
    #[serde(rename = "waitForStop")]
    pub wait_for_stop: bool,
    #[serde(skip)]
    pub fire_and_forget: bool,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for ResumeTaskOptions {
    fn default() -> Self {
        Self {
            selection: TaskSelection::default(),
            wait_for_stop: true,
            fire_and_forget: false,
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for ResumeTaskOptions {
    const COMMAND: &'static str = "ResumeTask";
}

/// Options for `StartVisualizePointCloudTask`
#[derive(Debug, Clone, Serialize)]
pub struct VisualizePointCloudOptions {
    #[serde(skip)]
    pub vminit_params: Map<String, Value>,
    #[serde(rename = "locationName", skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(rename = "sensorSelectionInfos", skip_serializing_if = "Option::is_none")]
    pub sensor_selection_infos: Option<Vec<Value>>,
    /// Point size in millimeters
    #[serde(rename = "pointsize", skip_serializing_if = "Option::is_none")]
    pub point_size: Option<f64>,
    #[serde(
        rename = "ignoreocclusion",
        serialize_with = "bool_as_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub ignore_occlusion: Option<bool>,
    #[serde(rename = "newerthantimestamp", skip_serializing_if = "Option::is_none")]
    pub newer_than_timestamp: Option<u64>,
    /// Take new images instead of reading from the buffer
    #[serde(serialize_with = "bool_as_int", skip_serializing_if = "Option::is_none")]
    pub request: Option<bool>,
    #[serde(rename = "filteringsubsample", skip_serializing_if = "Option::is_none")]
    pub filtering_subsample: Option<u32>,
    /// Voxel size in millimeters
    #[serde(rename = "filteringvoxelsize", skip_serializing_if = "Option::is_none")]
    pub filtering_voxel_size: Option<f64>,
    #[serde(rename = "filteringstddev", skip_serializing_if = "Option::is_none")]
    pub filtering_stddev: Option<f64>,
    #[serde(rename = "filteringnumnn", skip_serializing_if = "Option::is_none")]
    pub filtering_num_nn: Option<u32>,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for VisualizePointCloudOptions {
    fn default() -> Self {
        Self {
            vminit_params: Map::new(),
            location_name: None,
            sensor_selection_infos: None,
            point_size: None,
            ignore_occlusion: None,
            newer_than_timestamp: None,
            request: Some(true),
            filtering_subsample: None,
            filtering_voxel_size: None,
            filtering_stddev: None,
            filtering_num_nn: None,
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for VisualizePointCloudOptions {
    const COMMAND: &'static str = "StartVisualizePointCloudTask";

    fn vminit_params(&self) -> Option<&Map<String, Value>> {
        Some(&self.vminit_params)
    }
}

/// Options for `BackupDetectionLogs`
#[derive(Debug, Clone, Serialize)]
pub struct BackupVisionLogOptions {
    #[serde(rename = "cycleIndex")]
    pub cycle_index: String,
    #[serde(rename = "sensorTimestamps")]
    pub sensor_timestamps: Vec<u64>,
    #[serde(skip)]
    pub fire_and_forget: bool,
    #[serde(skip)]
    pub timeout: Duration,
}

impl BackupVisionLogOptions {
    pub fn new(cycle_index: impl Into<String>) -> Self {
        Self {
            cycle_index: cycle_index.into(),
            sensor_timestamps: Vec::new(),
            fire_and_forget: false,
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for BackupVisionLogOptions {
    const COMMAND: &'static str = "BackupDetectionLogs";
}

/// Options for `GetLatestDetectionResultImages`
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResultImagesOptions {
    #[serde(flatten)]
    pub filter: TaskFilter,
    #[serde(rename = "newerthantimestamp")]
    pub newer_than_timestamp: u64,
    #[serde(rename = "sensorSelectionInfo", skip_serializing_if = "Option::is_none")]
    pub sensor_selection_info: Option<Value>,
    #[serde(rename = "metadataOnly", skip_serializing_if = "Option::is_none")]
    pub metadata_only: Option<bool>,
    #[serde(rename = "imageTypes", skip_serializing_if = "Option::is_none")]
    pub image_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// When false, only send the request; collect the images later with
    /// `wait_for_latest_detection_result_images`
    #[serde(skip)]
    pub block_wait: bool,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for DetectionResultImagesOptions {
    fn default() -> Self {
        Self {
            filter: TaskFilter::default(),
            newer_than_timestamp: 0,
            sensor_selection_info: None,
            metadata_only: None,
            image_types: None,
            limit: None,
            block_wait: true,
            timeout: defaults::COMMAND_TIMEOUT,
        }
    }
}

impl CommandOptions for DetectionResultImagesOptions {
    const COMMAND: &'static str = "GetLatestDetectionResultImages";
}
