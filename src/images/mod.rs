//! Component image slots, override normalization and digest pinning
//!
//! Every upgradeable component owns one image slot. A slot knows the flag the
//! user overrides it with, how to derive its default image from the selected
//! image set, and how to read and write the override field inside the
//! [`EntandoAppV2Spec`]. The adaptation engine walks the fixed slot table and
//! rewrites each override in place.

mod adapter;
mod normalize;

pub use adapter::{adapt_images_override, resolve_digest, DigestFailure};
pub use normalize::{
    check_image_set_mismatch, contains_registry, extract_repo, is_official_image,
    is_valid_image_override, normalize,
};

use std::fmt;

use clap::ValueEnum;

use crate::crd::EntandoAppV2Spec;

/// Registry hosting the official Entando images
pub const DEFAULT_REGISTRY: &str = "registry.hub.docker.com";

/// Organization publishing the official Entando images
pub const DEFAULT_ORGANIZATION: &str = "entando";

const APP_BUILDER_REPO: &str = "app-builder";
const DE_APP_WILDFLY_REPO: &str = "entando-de-app-wildfly";
const DE_APP_EAP_REPO: &str = "entando-de-app-eap";
const COMPONENT_MANAGER_REPO: &str = "entando-component-manager";
const KEYCLOAK_REPO: &str = "entando-keycloak";
const REDHAT_SSO_REPO: &str = "entando-redhat-sso";
const K8S_SERVICE_REPO: &str = "entando-k8s-service";
const K8S_PLUGIN_CONTROLLER_REPO: &str = "entando-k8s-plugin-controller";
const K8S_APP_PLUGIN_LINK_CONTROLLER_REPO: &str = "entando-k8s-app-plugin-link-controller";

/// Image set selecting the default repositories of policy-variant components
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum ImageSetType {
    /// Community images (Wildfly based DeApp, Keycloak)
    Community,

    /// Red Hat certified images (EAP based DeApp, Red Hat SSO)
    RedhatCertified,

    /// Resolve the image set before generating the resource
    #[default]
    Auto,
}

impl ImageSetType {
    /// Resolve `Auto` to a concrete image set
    ///
    /// Policy-variant slots fall back to the community images for any value
    /// other than `RedhatCertified`, so `Auto` resolves to `Community`.
    pub fn resolve(self) -> ImageSetType {
        match self {
            ImageSetType::Auto => ImageSetType::Community,
            other => other,
        }
    }
}

impl fmt::Display for ImageSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community => write!(f, "Community"),
            Self::RedhatCertified => write!(f, "RedhatCertified"),
            Self::Auto => write!(f, "Auto"),
        }
    }
}

/// Default repositories of a slot, fixed or depending on the image set
enum DefaultRepos {
    Fixed(&'static str),
    PerImageSet {
        community: &'static str,
        certified: &'static str,
    },
}

/// One overridable component image within the upgrade resource
pub struct ImageSlot {
    /// Human readable component name
    pub component_name: &'static str,

    /// Flag used to override this component image; digest failures are
    /// reported under this name, so it must stay stable
    pub flag: &'static str,

    /// True when the default repository depends on the selected image set
    pub policy_variant: bool,

    default_repos: DefaultRepos,
    get: for<'a> fn(&'a EntandoAppV2Spec) -> &'a str,
    set: fn(&mut EntandoAppV2Spec, String),
}

impl ImageSlot {
    /// Default repository name under the given image set
    pub fn default_repo(&self, image_set_type: ImageSetType) -> &'static str {
        match self.default_repos {
            DefaultRepos::Fixed(repo) => repo,
            DefaultRepos::PerImageSet {
                community,
                certified,
            } => {
                if image_set_type == ImageSetType::RedhatCertified {
                    certified
                } else {
                    community
                }
            }
        }
    }

    /// Canonical default image under the given image set
    /// (`registry/organization/repository`, no tag)
    pub fn default_image(&self, image_set_type: ImageSetType) -> String {
        format!(
            "{DEFAULT_REGISTRY}/{DEFAULT_ORGANIZATION}/{}",
            self.default_repo(image_set_type)
        )
    }

    /// Current override value, empty when unset
    pub fn override_of<'a>(&self, spec: &'a EntandoAppV2Spec) -> &'a str {
        (self.get)(spec)
    }

    /// Write the override value back into the spec
    pub fn set_override(&self, spec: &mut EntandoAppV2Spec, value: String) {
        (self.set)(spec, value)
    }
}

/// The fixed slot set, in processing order
pub static IMAGE_SLOTS: &[ImageSlot] = &[
    ImageSlot {
        component_name: "DeApp",
        flag: "image-de-app",
        policy_variant: true,
        default_repos: DefaultRepos::PerImageSet {
            community: DE_APP_WILDFLY_REPO,
            certified: DE_APP_EAP_REPO,
        },
        get: |spec| spec.de_app.image_override.as_str(),
        set: |spec, value| spec.de_app.image_override = value,
    },
    ImageSlot {
        component_name: "AppBuilder",
        flag: "image-app-builder",
        policy_variant: false,
        default_repos: DefaultRepos::Fixed(APP_BUILDER_REPO),
        get: |spec| spec.app_builder.image_override.as_str(),
        set: |spec, value| spec.app_builder.image_override = value,
    },
    ImageSlot {
        component_name: "ComponentManager",
        flag: "image-component-manager",
        policy_variant: false,
        default_repos: DefaultRepos::Fixed(COMPONENT_MANAGER_REPO),
        get: |spec| spec.component_manager.image_override.as_str(),
        set: |spec, value| spec.component_manager.image_override = value,
    },
    ImageSlot {
        component_name: "Keycloak",
        flag: "image-keycloak",
        policy_variant: true,
        default_repos: DefaultRepos::PerImageSet {
            community: KEYCLOAK_REPO,
            certified: REDHAT_SSO_REPO,
        },
        get: |spec| spec.keycloak.image_override.as_str(),
        set: |spec, value| spec.keycloak.image_override = value,
    },
    ImageSlot {
        component_name: "K8sService",
        flag: "image-k8s-service",
        policy_variant: false,
        default_repos: DefaultRepos::Fixed(K8S_SERVICE_REPO),
        get: |spec| spec.k8s_service.image_override.as_str(),
        set: |spec, value| spec.k8s_service.image_override = value,
    },
    ImageSlot {
        component_name: "K8sPluginController",
        flag: "image-k8s-plugin-controller",
        policy_variant: false,
        default_repos: DefaultRepos::Fixed(K8S_PLUGIN_CONTROLLER_REPO),
        get: |spec| spec.k8s_plugin_controller.image_override.as_str(),
        set: |spec, value| spec.k8s_plugin_controller.image_override = value,
    },
    ImageSlot {
        component_name: "K8sAppPluginLinkController",
        flag: "image-k8s-app-plugin-link-controller",
        policy_variant: false,
        default_repos: DefaultRepos::Fixed(K8S_APP_PLUGIN_LINK_CONTROLLER_REPO),
        get: |spec| spec.k8s_app_plugin_link_controller.image_override.as_str(),
        set: |spec, value| spec.k8s_app_plugin_link_controller.image_override = value,
    },
];
