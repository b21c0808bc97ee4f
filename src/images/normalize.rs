//! Image reference classification and normalization
//!
//! Pure string heuristics, no I/O. Overrides come in three accepted shapes
//! (bare tag, `org/repo[:tag]`, full reference with registry) and are
//! normalized to the full form before any digest lookup.

use std::sync::LazyLock;

use regex::Regex;

use super::{ImageSetType, ImageSlot, DEFAULT_ORGANIZATION, DEFAULT_REGISTRY};

static REGISTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+\.[\w.-]+/[\w@/.:-]+$").expect("valid regex"));

static REPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+/([^@:]+)(?:@sha256)?:?.*$").expect("valid regex"));

static OVERRIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w.-]+/)?([\w-]+/[\w-]+(@sha256)?)?:?[\w.-]+$").expect("valid regex")
});

/// Convert a user supplied override to full URL form
///
/// `default_image` is the canonical default of the slot
/// (`registry/organization/repository`, no tag). Classification rules, in
/// order:
/// - no `:` and no `/` means only the tag was provided
/// - no registry host means `organization/repository[:tag|@digest]`
/// - anything else is taken as already fully qualified
pub fn normalize(raw_override: &str, default_image: &str) -> String {
    if !raw_override.contains(':') && !raw_override.contains('/') {
        format!("{default_image}:{raw_override}")
    } else if !contains_registry(raw_override) {
        format!("{DEFAULT_REGISTRY}/{raw_override}")
    } else {
        raw_override.to_string()
    }
}

/// Returns true if the provided image contains a registry host
///
/// Heuristic: a leading path segment containing a dot is taken as a host, so
/// an organization name that itself contains a dot is mistaken for a
/// registry. Accepted limitation, kept for compatibility with existing
/// overrides.
pub fn contains_registry(image: &str) -> bool {
    REGISTRY_RE.is_match(image)
}

/// Extract the repository name from a full image reference
///
/// The repository is the path component between the last `/` and the first
/// `:` or `@`. Returns `None` when the reference has no path separator.
pub fn extract_repo(image: &str) -> Option<&str> {
    REPO_RE
        .captures(image)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Returns true if the provided image is an official Entando image
pub fn is_official_image(image: &str) -> bool {
    image.starts_with(&format!("{DEFAULT_REGISTRY}/{DEFAULT_ORGANIZATION}/"))
}

/// Returns true if the provided value can be used as an image override flag
///
/// Accepted values are:
/// - `<tag>`
/// - `<organization>/<repo>[:<tag>]`
/// - `<organization>/<repo>@sha256:<sha>`
/// - `<registry>/<organization>/<repo>:<tag>`
/// - `<registry>/<organization>/<repo>@sha256:<sha>`
pub fn is_valid_image_override(image_override: &str) -> bool {
    OVERRIDE_RE.is_match(image_override)
}

/// Warn when an official image disagrees with the selected image set
///
/// Only applies to policy-variant slots carrying an official image: the
/// repository of the normalized reference is compared with the default
/// repository of the slot under the given image set. The warning is advisory
/// and never affects processing.
pub fn check_image_set_mismatch(
    image: &str,
    image_set_type: ImageSetType,
    slot: &ImageSlot,
) -> Option<String> {
    if !slot.policy_variant || !is_official_image(image) {
        return None;
    }

    let provided = extract_repo(image)?;
    let expected = slot.default_repo(image_set_type);
    if provided == expected {
        return None;
    }

    Some(format!(
        "WARNING: image-set-type is set to {image_set_type} but the repository {provided} was provided. Expected repository should be {expected}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::IMAGE_SLOTS;

    const DE_APP_EAP: &str = "registry.hub.docker.com/entando/entando-de-app-eap";

    #[test]
    fn bare_tag_expands_to_the_default_image() {
        assert_eq!(
            normalize("7.1.1-x", DE_APP_EAP),
            "registry.hub.docker.com/entando/entando-de-app-eap:7.1.1-x"
        );
        assert_eq!(
            normalize("7.1.1-ENGPM-493-PR-440", DE_APP_EAP),
            "registry.hub.docker.com/entando/entando-de-app-eap:7.1.1-ENGPM-493-PR-440"
        );
    }

    #[test]
    fn org_and_repo_get_the_default_registry() {
        assert_eq!(
            normalize("entando/app-builder:abc", DE_APP_EAP),
            "registry.hub.docker.com/entando/app-builder:abc"
        );
        assert_eq!(
            normalize("entando/entando-keycloak@sha256:d550b07f5dd6", DE_APP_EAP),
            "registry.hub.docker.com/entando/entando-keycloak@sha256:d550b07f5dd6"
        );
    }

    #[test]
    fn fully_qualified_references_are_left_unchanged() {
        let full = "registry.hub.docker.com/entando/entando-de-app-eap:7.1.1-ENGPM-493-PR-440";
        assert_eq!(normalize(full, DE_APP_EAP), full);

        let other_registry = "quay.io/acme/widget:1.0";
        assert_eq!(normalize(other_registry, DE_APP_EAP), other_registry);
    }

    #[test]
    fn dotted_organization_is_taken_for_a_registry() {
        // Known limitation of the host heuristic: "my.org" looks like a
        // registry host, so no default registry is prepended.
        assert_eq!(normalize("my.org/repo:1.0", DE_APP_EAP), "my.org/repo:1.0");
    }

    #[test]
    fn contains_registry_requires_a_dotted_host_segment() {
        assert!(contains_registry("registry.hub.docker.com/entando/app-builder:7.1.1"));
        assert!(contains_registry("quay.io/acme/widget@sha256:abc123"));
        assert!(!contains_registry("entando/app-builder:7.1.1"));
        assert!(!contains_registry("app-builder"));
    }

    #[test]
    fn extract_repo_stops_at_tag_or_digest() {
        assert_eq!(
            extract_repo("registry.hub.docker.com/entando/entando-keycloak:7.1.1"),
            Some("entando-keycloak")
        );
        assert_eq!(
            extract_repo("registry.hub.docker.com/entando/entando-keycloak@sha256:d550b07f5dd6"),
            Some("entando-keycloak")
        );
        assert_eq!(extract_repo("app-builder:7.1.1"), None);
    }

    #[test]
    fn override_validation_accepts_the_documented_shapes() {
        assert!(is_valid_image_override("7.1.1"));
        assert!(is_valid_image_override("7.1.1-ENG-4277-PR-1413"));
        assert!(is_valid_image_override("entando/app-builder"));
        assert!(is_valid_image_override("entando/app-builder:7.1.1"));
        assert!(is_valid_image_override("entando/app-builder@sha256:94af0fb4525"));
        assert!(is_valid_image_override(
            "registry.hub.docker.com/entando/app-builder:7.1.1"
        ));
        assert!(is_valid_image_override(
            "registry.hub.docker.com/entando/app-builder@sha256:94af0fb4525"
        ));

        assert!(!is_valid_image_override("foo:bar:foo"));
        assert!(!is_valid_image_override("foo bar"));
    }

    #[test]
    fn mismatch_warns_with_image_set_provided_and_expected_repositories() {
        let de_app = &IMAGE_SLOTS[0];
        let warning = check_image_set_mismatch(
            "registry.hub.docker.com/entando/entando-de-app-eap:7.1.1",
            ImageSetType::Community,
            de_app,
        )
        .expect("a warning");
        assert_eq!(
            warning,
            "WARNING: image-set-type is set to Community but the repository entando-de-app-eap was provided. Expected repository should be entando-de-app-wildfly"
        );
    }

    #[test]
    fn mismatch_is_silent_for_matching_or_unofficial_images() {
        let de_app = &IMAGE_SLOTS[0];

        // Matching repository
        assert!(check_image_set_mismatch(
            "registry.hub.docker.com/entando/entando-de-app-eap:7.1.1",
            ImageSetType::RedhatCertified,
            de_app,
        )
        .is_none());

        // Unofficial image, never checked
        assert!(check_image_set_mismatch(
            "quay.io/acme/entando-de-app-wildfly:7.1.1",
            ImageSetType::RedhatCertified,
            de_app,
        )
        .is_none());

        // Fixed slot, never checked
        let app_builder = &IMAGE_SLOTS[1];
        assert!(check_image_set_mismatch(
            "registry.hub.docker.com/entando/something-else:7.1.1",
            ImageSetType::Community,
            app_builder,
        )
        .is_none());
    }
}
