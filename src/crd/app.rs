//! EntandoAppV2 Custom Resource Definition
//!
//! The EntandoAppV2 CR is owned by the upgrade operator; this CLI only builds
//! instances of it and reads their status. The component blocks each carry an
//! `imageOverride` field that the image adaptation engine rewrites in place.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ComponentSpec, Condition, ConditionStatus};

/// Specification for an EntandoAppV2 upgrade
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "app.entando.org",
    version = "v1alpha1",
    kind = "EntandoAppV2",
    plural = "entandoappv2s",
    status = "EntandoAppV2Status",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct EntandoAppV2Spec {
    /// Target Entando platform version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Name of the EntandoApp the operator should upgrade
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entando_app_name: String,

    /// Ingress host name of the installation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ingress_host_name: String,

    /// Image set selecting the default images of policy-variant components
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_set_type: String,

    /// DeApp component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub de_app: ComponentSpec,

    /// AppBuilder component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub app_builder: ComponentSpec,

    /// ComponentManager component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub component_manager: ComponentSpec,

    /// Keycloak component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub keycloak: ComponentSpec,

    /// K8sService component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub k8s_service: ComponentSpec,

    /// K8sPluginController component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub k8s_plugin_controller: ComponentSpec,

    /// K8sAppPluginLinkController component
    #[serde(default, skip_serializing_if = "ComponentSpec::is_empty")]
    pub k8s_app_plugin_link_controller: ComponentSpec,
}

/// Status reported by the upgrade operator
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntandoAppV2Status {
    /// Number of completed upgrade steps
    #[serde(default)]
    pub progress: u32,

    /// Total number of upgrade steps
    #[serde(default)]
    pub total: u32,

    /// Conditions representing the upgrade state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl EntandoAppV2Status {
    /// Message of a `Succeeded` condition with status `False`, if any
    ///
    /// The operator sets this condition when the upgrade cannot complete; its
    /// message is the only failure detail available to the caller.
    pub fn failure_message(&self) -> Option<&str> {
        self.conditions
            .iter()
            .find(|c| c.type_ == "Succeeded" && c.status == ConditionStatus::False)
            .map(|c| c.message.as_str())
    }
}
