//! System state used by the vision manager to select a profile
//!
//! Every field is optional. Only the fields that are set are sent, so the
//! vision manager falls back to its defaults for the rest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State of the system used for profile selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    /// Unique identifier of the sensor model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<String>,
    /// e.g. `source_camera`, `dest_camera`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_link_name: Option<String>,
    /// e.g. `visualizePointCloud`, `objectDetection`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_task_type: Option<String>,
    /// e.g. `source`, `destination_1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// Unique identifier of the part being detected or picked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grasp_set_name: Option<String>,
    /// Family of the object, e.g. `box`, `cylinder`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// e.g. `rubber`, `cardboard`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_material_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    /// e.g. `binpicking`, `palletizing`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_type: Option<String>,
    /// e.g. `detection`, `pointCloudObstacle`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_trigger_type: Option<String>,
    /// Result of the current detection, e.g. `ImageTooDark`, `Success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_state: Option<String>,
    /// What the captured data is used for, e.g. `Detection`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_usage_type: Option<String>,
}

impl SystemState {
    /// The set fields as a map, ready to be merged into init parameters
    pub fn to_params(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Ok(Map::new()),
        }
    }

    /// Read a system state back from a JSON object, such as one carried
    /// in the published state. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}
