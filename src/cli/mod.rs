//! Command line interface
//!
//! Two subcommands share the CR construction flags: `generate` writes the
//! EntandoAppV2 document to a file or stdout, `upgrade` applies it (or a
//! pre-generated file) to the cluster and follows the rollout.

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::crd::{EntandoAppV2, EntandoAppV2Spec};
use crate::images::{self, ImageSetType};
use crate::kubectl::{self, OperatorMode};
use crate::registry::RegistryDigestLookup;
use crate::{generate, releases, upgrade, Error, Result};

/// Entando Upgrade CLI
#[derive(Parser, Debug)]
#[command(name = "upgrade-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the EntandoAppV2 CR file
    Generate(GenerateArgs),

    /// Apply the EntandoAppV2 CR file and follow the upgrade
    Upgrade(UpgradeArgs),
}

/// Flags shared by CR generation and upgrade
#[derive(Args, Debug, Default)]
pub struct CrArgs {
    /// Entando version
    #[arg(short = 'v', long)]
    version: Option<String>,

    /// Automatically select the latest version from the entando-releases repository
    #[arg(long, conflicts_with = "version")]
    latest_version: bool,

    /// Set specific images for DeApp or Keycloak
    #[arg(short = 't', long, value_enum, default_value_t = ImageSetType::Auto)]
    image_set_type: ImageSetType,

    /// Generate the CR for an OLM or plain installation
    #[arg(short = 'm', long, value_enum, default_value_t = OperatorMode::Auto)]
    operator_mode: OperatorMode,

    /// Image override for DeApp
    #[arg(long = "image-de-app", value_name = "IMAGE")]
    image_de_app: Option<String>,

    /// Image override for AppBuilder
    #[arg(long = "image-app-builder", value_name = "IMAGE")]
    image_app_builder: Option<String>,

    /// Image override for ComponentManager
    #[arg(long = "image-component-manager", value_name = "IMAGE")]
    image_component_manager: Option<String>,

    /// Image override for Keycloak
    #[arg(long = "image-keycloak", value_name = "IMAGE")]
    image_keycloak: Option<String>,

    /// Image override for K8sService
    #[arg(long = "image-k8s-service", value_name = "IMAGE")]
    image_k8s_service: Option<String>,

    /// Image override for K8sPluginController
    #[arg(long = "image-k8s-plugin-controller", value_name = "IMAGE")]
    image_k8s_plugin_controller: Option<String>,

    /// Image override for K8sAppPluginLinkController
    #[arg(long = "image-k8s-app-plugin-link-controller", value_name = "IMAGE")]
    image_k8s_app_plugin_link_controller: Option<String>,
}

/// Arguments of the generate subcommand
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    cr: CrArgs,

    /// Path to the CR file (stdout when omitted)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

/// Arguments of the upgrade subcommand
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    #[command(flatten)]
    cr: CrArgs,

    /// Path to a pre-generated CR file
    #[arg(
        short = 'f',
        long,
        conflicts_with_all = [
            "version",
            "latest_version",
            "image_set_type",
            "operator_mode",
            "image_de_app",
            "image_app_builder",
            "image_component_manager",
            "image_keycloak",
            "image_k8s_service",
            "image_k8s_plugin_controller",
            "image_k8s_app_plugin_link_controller",
        ]
    )]
    file: Option<PathBuf>,

    /// Apply the changes even if the resource already exists
    #[arg(long)]
    force: bool,
}

impl Cli {
    /// Execute the selected subcommand
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => run_generate(args).await,
            Commands::Upgrade(args) => run_upgrade(args).await,
        }
    }
}

impl CrArgs {
    /// Build the EntandoAppV2 resource from the flags
    ///
    /// Validates every override value before writing it into its slot; the
    /// resolved image set is recorded on the spec.
    pub async fn parse_entando_app(&self) -> Result<EntandoAppV2> {
        let version = if self.latest_version {
            releases::latest_version().await?
        } else {
            self.version.clone().ok_or_else(|| {
                Error::validation("either --version or --latest-version must be provided")
            })?
        };

        let mut spec = EntandoAppV2Spec {
            version,
            image_set_type: self.image_set_type.resolve().to_string(),
            ..Default::default()
        };

        for slot in images::IMAGE_SLOTS {
            if let Some(value) = self.override_for(slot.flag) {
                if !images::is_valid_image_override(value) {
                    return Err(Error::validation(format!(
                        "invalid format for image override flag '{value}'. It should be <image>:<tag> or <tag>"
                    )));
                }
                slot.set_override(&mut spec, value.to_string());
            }
        }

        Ok(EntandoAppV2::new("my-app", spec))
    }

    fn override_for(&self, flag: &str) -> Option<&str> {
        let value = match flag {
            "image-de-app" => &self.image_de_app,
            "image-app-builder" => &self.image_app_builder,
            "image-component-manager" => &self.image_component_manager,
            "image-keycloak" => &self.image_keycloak,
            "image-k8s-service" => &self.image_k8s_service,
            "image-k8s-plugin-controller" => &self.image_k8s_plugin_controller,
            "image-k8s-app-plugin-link-controller" => &self.image_k8s_app_plugin_link_controller,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut app = args.cr.parse_entando_app().await?;

    // A pure generation has no cluster to ask, the mode must be explicit
    let olm = args.cr.operator_mode.is_olm()?;

    let lookup = RegistryDigestLookup::default();
    let needs_fix = images::adapt_images_override(
        &mut app,
        args.cr.image_set_type.resolve(),
        olm,
        &lookup,
        &mut io::stderr(),
    )
    .await;

    generate::generate_custom_resource(args.output.as_deref(), &mut app, needs_fix)
}

async fn run_upgrade(args: UpgradeArgs) -> Result<()> {
    if let Some(file) = &args.file {
        return upgrade::apply_and_watch(file, args.force).await;
    }

    let mut app = args.cr.parse_entando_app().await?;

    let olm = match args.cr.operator_mode {
        OperatorMode::Auto => {
            let detected = kubectl::operator_mode().await?;
            tracing::info!(mode = %detected, "detected operator mode");
            detected == OperatorMode::Olm
        }
        mode => mode.is_olm()?,
    };

    let lookup = RegistryDigestLookup::default();
    let needs_fix = images::adapt_images_override(
        &mut app,
        args.cr.image_set_type.resolve(),
        olm,
        &lookup,
        &mut io::stderr(),
    )
    .await;

    let temp = tempfile::Builder::new().prefix("entandoapp-cr").tempfile()?;
    let temp_path = temp.path().to_path_buf();
    generate::generate_custom_resource(Some(&temp_path), &mut app, needs_fix)?;

    if needs_fix {
        // Never apply a document with placeholders; hand it over for editing
        let base = temp_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "entandoapp-cr".to_string());
        let fixme = PathBuf::from(format!("{base}-fixme.yaml"));
        temp.persist(&fixme).map_err(|e| Error::Io(e.error))?;
        return Err(Error::validation(format!(
            "upgrade not applied because the generated CR file needs to be fixed. Please edit {}",
            fixme.display()
        )));
    }

    upgrade::apply_and_watch(&temp_path, args.force).await
}
