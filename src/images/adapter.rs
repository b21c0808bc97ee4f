//! Image override adaptation engine
//!
//! Walks the fixed slot table, normalizes every non-empty override in place
//! and, when the installation requires immutable references, replaces tags
//! with manifest digests. A failed lookup never aborts the pass: the slot is
//! rewritten with a placeholder digest, the failure is recorded under the
//! slot flag, and processing continues with the next slot.

use std::io::Write;

use crate::crd::EntandoAppV2;
use crate::registry::DigestLookup;
use crate::Error;

use super::{check_image_set_mismatch, normalize, ImageSetType, IMAGE_SLOTS};

/// Failed digest resolution for a single image reference
#[derive(Debug)]
pub struct DigestFailure {
    /// Reference rewritten with the placeholder digest
    pub placeholder: String,
    /// Reference the lookup was attempted on
    pub image: String,
    /// Underlying lookup error
    pub error: Error,
}

/// Replace the tag of a full image reference with its manifest digest
///
/// References that already carry a digest are returned unchanged without
/// calling the lookup. On lookup failure the returned [`DigestFailure`]
/// carries a reference whose digest component is a placeholder embedding the
/// original reference, so the generated document points a human at what to
/// fix.
pub async fn resolve_digest(
    image: &str,
    lookup: &dyn DigestLookup,
) -> std::result::Result<String, DigestFailure> {
    if image.contains("@sha256:") {
        return Ok(image.to_string());
    }

    let prefix = image.split(':').next().unwrap_or(image);
    match lookup.digest(image).await {
        Ok(digest) => Ok(format!("{prefix}@{digest}")),
        Err(error) => Err(DigestFailure {
            placeholder: format!("{prefix}@ERROR: <unable to fetch digest of: {image}>"),
            image: image.to_string(),
            error,
        }),
    }
}

/// Convert the image overrides of the resource to full URL form
///
/// For every slot with a non-empty override: normalize it, warn on `diag`
/// when an official image disagrees with the selected image set, pin it to a
/// digest when `pin_digests` is set, and write the result back into the
/// resource spec. Digest failures are collected and summarized on `diag`
/// after the pass.
///
/// Returns true when at least one digest could not be resolved; the caller
/// must then treat the resource as unsafe to apply until the placeholders
/// are replaced.
pub async fn adapt_images_override(
    app: &mut EntandoAppV2,
    image_set_type: ImageSetType,
    pin_digests: bool,
    lookup: &dyn DigestLookup,
    diag: &mut dyn Write,
) -> bool {
    let mut failures: Vec<(&'static str, Error)> = Vec::new();

    for slot in IMAGE_SLOTS {
        let current = slot.override_of(&app.spec);
        if current.is_empty() {
            continue;
        }

        let mut image = normalize(current, &slot.default_image(image_set_type));

        if let Some(warning) = check_image_set_mismatch(&image, image_set_type, slot) {
            let _ = writeln!(diag, "{warning}");
        }

        if pin_digests {
            match resolve_digest(&image, lookup).await {
                Ok(resolved) => image = resolved,
                Err(failure) => {
                    image = failure.placeholder;
                    failures.push((slot.flag, failure.error));
                }
            }
        }

        slot.set_override(&mut app.spec, image);
    }

    if failures.is_empty() {
        return false;
    }

    let _ = writeln!(diag, "WARNING: unable to fetch the digest of the following images:");
    for (flag, error) in &failures {
        let _ = writeln!(diag, "- {flag}: {error}");
    }
    true
}
