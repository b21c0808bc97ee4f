//! Entando Upgrade CLI - EntandoAppV2 custom resource generation and rollout
//!
//! This crate drives version upgrades of an Entando installation. It builds an
//! `EntandoAppV2` custom resource from command line flags, converts the user
//! supplied component image overrides to fully qualified (and, for OLM
//! installations, digest pinned) references, writes the resource as a YAML
//! document, and can apply it to a cluster and follow the upgrade progress.
//!
//! # Modules
//!
//! - [`cli`] - Command line interface (`generate` and `upgrade` subcommands)
//! - [`crd`] - The EntandoAppV2 custom resource model
//! - [`images`] - Image slots, override normalization and digest pinning
//! - [`registry`] - Remote registry digest lookup
//! - [`generate`] - CR document emission
//! - [`kubectl`] - Cluster interaction through a kubectl subprocess
//! - [`releases`] - Latest release discovery
//! - [`upgrade`] - CR application and progress polling
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod cli;
pub mod crd;
pub mod error;
pub mod generate;
pub mod images;
pub mod kubectl;
pub mod registry;
pub mod releases;
pub mod upgrade;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
