//! Shared types used by the EntandoAppV2 spec and status

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Spec block for a single upgradeable component
///
/// The operator derives the image to deploy from the target version unless an
/// override is set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Full image reference replacing the default image of this component
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_override: String,
}

impl ComponentSpec {
    /// Create a component spec with the given image override
    pub fn with_override(image_override: impl Into<String>) -> Self {
        Self {
            image_override: image_override.into(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.image_override.is_empty()
    }
}

/// Status of a condition (True, False, Unknown)
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// The condition state cannot be determined
    #[default]
    Unknown,
}

/// Condition reported by the upgrade operator on the resource status
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Succeeded)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Last time the condition transitioned
    #[serde(
        rename = "lastTransitionTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_component_spec_is_skipped_when_serializing() {
        let spec = ComponentSpec::default();
        assert!(spec.is_empty());

        let yaml = serde_yaml::to_string(&spec).expect("serialize");
        assert!(!yaml.contains("imageOverride"));
    }

    #[test]
    fn component_spec_uses_camel_case() {
        let spec = ComponentSpec::with_override("registry.hub.docker.com/entando/app-builder:7.1.1");
        let yaml = serde_yaml::to_string(&spec).expect("serialize");
        assert!(yaml.contains("imageOverride: registry.hub.docker.com/entando/app-builder:7.1.1"));
    }

    #[test]
    fn condition_parses_operator_output() {
        let yaml = r#"
type: Succeeded
status: "False"
reason: UpgradeFailed
message: component manager rollout failed
lastTransitionTime: "2023-04-12T10:15:00Z"
"#;
        let condition: Condition = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(condition.type_, "Succeeded");
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.message, "component manager rollout failed");
        assert!(condition.last_transition_time.is_some());
    }
}
