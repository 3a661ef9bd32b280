//! Command payloads sent to the vision manager

use serde::Serialize;
use serde_json::{Map, Value};

/// Key carrying the command name
pub const COMMAND_KEY: &str = "command";

/// Key carrying the optional caller identifier
pub const CALLER_ID_KEY: &str = "callerid";

/// A command payload: a JSON object that always carries a `command` name.
///
/// Built fresh for every call and serialized as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Command {
    fields: Map<String, Value>,
}

impl Command {
    /// Create a command with only its name set
    pub fn new(name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(COMMAND_KEY.into(), Value::String(name.into()));
        Self { fields }
    }

    /// The command name, or an empty string if it was overwritten with a non-string
    pub fn name(&self) -> &str {
        self.fields
            .get(COMMAND_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Merge raw fields into the command, later keys win
    pub fn extend(&mut self, fields: Map<String, Value>) {
        self.fields.extend(fields);
    }

    /// Merge the serialized fields of an options struct into the command.
    ///
    /// Options serialize to a JSON object; unset optional fields are skipped
    /// by their serde attributes, so they never show up as keys.
    pub fn merge<T: Serialize + ?Sized>(&mut self, options: &T) -> Result<(), serde_json::Error> {
        match serde_json::to_value(options)? {
            Value::Object(fields) => self.fields.extend(fields),
            Value::Null => {}
            other => {
                return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                    "command options must serialize to an object, got {other}"
                )))
            }
        }
        Ok(())
    }

    /// Attach the caller identifier. Empty identifiers are ignored.
    pub fn set_caller_id(&mut self, caller_id: &str) {
        if !caller_id.is_empty() {
            self.insert(CALLER_ID_KEY, caller_id);
        }
    }

    /// Serialize to the JSON bytes sent on the wire
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.fields)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}
