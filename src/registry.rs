//! Remote registry digest lookup
//!
//! The adaptation engine only depends on the [`DigestLookup`] trait; the OCI
//! distribution implementation below is injected at the CLI boundary so tests
//! can swap in doubles.

use async_trait::async_trait;
use oci_client::client::ClientConfig;
use oci_client::secrets::RegistryAuth;
use oci_client::{Client, Reference};

use crate::{Error, Result};

/// Resolves an image reference to its manifest digest
#[async_trait]
pub trait DigestLookup: Send + Sync {
    /// Return the `sha256:<hex>` digest of the given full image reference
    ///
    /// A single attempt, no retry: a failure is reported back to the caller
    /// which degrades the reference to a placeholder.
    async fn digest(&self, image: &str) -> Result<String>;
}

/// Digest lookup backed by the OCI distribution API, anonymous auth
pub struct RegistryDigestLookup {
    client: Client,
}

impl Default for RegistryDigestLookup {
    fn default() -> Self {
        Self {
            client: Client::new(ClientConfig::default()),
        }
    }
}

#[async_trait]
impl DigestLookup for RegistryDigestLookup {
    async fn digest(&self, image: &str) -> Result<String> {
        let reference: Reference = image
            .parse()
            .map_err(|e: oci_client::ParseError| Error::registry(e.to_string()))?;

        tracing::debug!(image = %image, "fetching manifest digest");
        self.client
            .fetch_manifest_digest(&reference, &RegistryAuth::Anonymous)
            .await
            .map_err(|e| Error::registry(e.to_string()))
    }
}
