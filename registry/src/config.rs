use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;
use crate::MODELMANAGER_VERSION;

/// Serialized form of one model step: the common envelope plus an open map
/// of template-specific fields, flattened into a single YAML mapping on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step name; doubles as the file stem on disk.
    pub name: String,

    /// Template type name that can rebuild this config.
    pub template: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Library version that wrote the file, for human troubleshooting.
    pub modelmanager_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Run the step immediately when it is registered or loaded.
    #[serde(default)]
    pub autorun: bool,

    /// References to binary artifacts stored next to the config file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplemental: Vec<SupplementalObject>,

    /// Template-specific fields.
    #[serde(flatten)]
    pub payload: BTreeMap<String, Value>,
}

impl StepConfig {
    pub fn new(name: &str, template: &str) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            tags: Vec::new(),
            modelmanager_version: MODELMANAGER_VERSION.to_string(),
            template_version: MODELMANAGER_VERSION.to_string(),
            notes: None,
            autorun: false,
            supplemental: Vec::new(),
            payload: BTreeMap::new(),
        }
    }

    /// Check the required keys of the envelope.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.is_empty() {
            return Err(RegistryError::Validation("step has no name".into()));
        }
        if self.name.contains('/') || self.name.contains('\\') {
            return Err(RegistryError::Validation(format!(
                "step name {:?} contains a path separator",
                self.name
            )));
        }
        if self.template.is_empty() {
            return Err(RegistryError::Validation(format!(
                "step {:?} has no template type",
                self.name
            )));
        }
        Ok(())
    }

    /// Deserialize the template-specific payload into a typed settings
    /// struct.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, RegistryError> {
        let map: serde_json::Map<String, Value> = self
            .payload
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            RegistryError::Validation(format!(
                "bad payload for step {:?}: {e}",
                self.name
            ))
        })
    }

    /// Replace the payload with the serialized form of a typed settings
    /// struct. The struct must serialize to a mapping.
    pub fn set_payload<T: Serialize>(&mut self, settings: &T) -> Result<(), RegistryError> {
        let value = serde_json::to_value(settings).map_err(|e| {
            RegistryError::Validation(format!("unserializable payload: {e}"))
        })?;
        match value {
            Value::Object(map) => {
                self.payload = map.into_iter().collect();
                Ok(())
            }
            other => Err(RegistryError::Validation(format!(
                "payload must be a mapping, got {other}"
            ))),
        }
    }

    pub fn supplemental_named(&self, name: &str) -> Option<&SupplementalObject> {
        self.supplemental.iter().find(|s| s.name == name)
    }

    pub fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            name: self.name.clone(),
            template: self.template.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// An auxiliary binary artifact owned by a step config. The bytes are never
/// inlined into the YAML file; on disk the config only carries the
/// `{name, content_type}` reference and the registry stores the content as a
/// separate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementalObject {
    pub name: String,

    /// Content encoding tag, also used as the file extension (e.g. "rmp").
    pub content_type: String,

    /// Raw bytes. Present in memory between serialization and persistence,
    /// stripped to `None` once written to its own file.
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

impl SupplementalObject {
    pub fn new(name: &str, content_type: &str, content: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            content: Some(content),
        }
    }
}

/// Lightweight listing entry for a known step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub name: String,
    pub template: String,
    pub tags: Vec<String>,
}
