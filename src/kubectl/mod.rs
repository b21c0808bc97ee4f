//! Cluster interaction through a kubectl subprocess
//!
//! The CLI never talks to the API server directly: every cluster operation
//! shells out through the base command configured in
//! `ENTANDO_CLI_KUBECTL_COMMAND` (e.g. `kubectl`, `oc`, or
//! `kubectl --context prod -n entando`). This keeps the tool agnostic of the
//! authentication setup of the target cluster.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use tokio::process::Command;

use crate::crd::EntandoAppV2;
use crate::{Error, Result};

/// Environment variable holding the base kubectl command
pub const KUBECTL_COMMAND_ENV: &str = "ENTANDO_CLI_KUBECTL_COMMAND";

/// Resource kind handled by the upgrade operator
pub const ENTANDO_APP_RESOURCE: &str = "EntandoAppV2";

const OPERATOR_DEPLOYMENT: &str = "entando-operator";
const OPERATOR_DEPLOYMENT_TYPE_ENV: &str = "ENTANDO_K8S_OPERATOR_DEPLOYMENT_TYPE";

/// Installation mode of the upgrade operator
///
/// OLM installations require immutable image references, so the generated CR
/// is digest pinned under that mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum OperatorMode {
    /// Operator Lifecycle Manager installation
    #[value(name = "OLM")]
    Olm,

    /// Plain deployment installation
    Plain,

    /// Detect the mode from the operator deployment
    #[default]
    Auto,
}

impl OperatorMode {
    /// Whether this mode requires digest pinned image references
    ///
    /// `Auto` cannot be answered without cluster access and is rejected; the
    /// upgrade flow resolves it through [`operator_mode`] first.
    pub fn is_olm(self) -> Result<bool> {
        match self {
            OperatorMode::Olm => Ok(true),
            OperatorMode::Plain => Ok(false),
            OperatorMode::Auto => Err(Error::validation(
                "the operator mode cannot be detected without cluster access. Use --operator-mode OLM or Plain",
            )),
        }
    }
}

impl fmt::Display for OperatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Olm => write!(f, "OLM"),
            Self::Plain => write!(f, "Plain"),
            Self::Auto => write!(f, "Auto"),
        }
    }
}

/// Send the CR creation request to the cluster
///
/// With `force` set an existing resource is overwritten (`apply` instead of
/// `create`).
pub async fn create_entando_app(file_name: &Path, force: bool) -> Result<()> {
    if !file_name.exists() {
        return Err(Error::validation(format!(
            "file {} doesn't exist",
            file_name.display()
        )));
    }

    let verb = if force { "apply" } else { "create" };
    let file = file_name.display().to_string();

    match run_kubectl(&[verb, "-f", &file]).await {
        Ok(_) => Ok(()),
        Err(Error::Command { message, .. }) if !force && message.contains("AlreadyExists") => {
            Err(Error::validation(
                "resource already exists. You can overwrite it using the --force flag",
            ))
        }
        Err(e) => Err(e),
    }
}

/// Retrieve the EntandoAppV2 resource from the cluster
pub async fn get_entando_app() -> Result<EntandoAppV2> {
    let stdout = run_kubectl(&["get", ENTANDO_APP_RESOURCE, "-o", "yaml"]).await?;
    parse_entando_app(&stdout)
}

/// Retrieve the operator mode from the cluster
///
/// Reads the deployment type environment variable inside the operator
/// deployment spec.
pub async fn operator_mode() -> Result<OperatorMode> {
    let json_path = format!(
        "jsonpath={{.spec.template.spec.containers[0].env[?(@.name == \"{OPERATOR_DEPLOYMENT_TYPE_ENV}\")].value}}"
    );

    let stdout = run_kubectl(&["get", "deploy", OPERATOR_DEPLOYMENT, "-o", &json_path])
        .await
        .map_err(|e| {
            Error::resource(format!(
                "unable to retrieve the operator mode from the deployment: {e}"
            ))
        })?;

    parse_operator_mode(&stdout)
}

fn parse_operator_mode(raw: &str) -> Result<OperatorMode> {
    match raw.trim().trim_matches('\'') {
        "olm" => Ok(OperatorMode::Olm),
        "helm" => Ok(OperatorMode::Plain),
        other => Err(Error::resource(format!(
            "unexpected value for {OPERATOR_DEPLOYMENT_TYPE_ENV}: {other}"
        ))),
    }
}

/// Kubectl prints lists even for a single resource
#[derive(Debug, Deserialize)]
struct EntandoAppV2List {
    #[serde(default)]
    items: Vec<EntandoAppV2>,
}

fn parse_entando_app(stdout: &str) -> Result<EntandoAppV2> {
    let list: EntandoAppV2List = serde_yaml::from_str(stdout)?;
    let mut items = list.items;
    match items.len() {
        0 => Err(Error::resource(format!(
            "resource of type {ENTANDO_APP_RESOURCE} not found"
        ))),
        1 => Ok(items.remove(0)),
        _ => Err(Error::resource(format!(
            "found multiple resources of type {ENTANDO_APP_RESOURCE}"
        ))),
    }
}

/// Base kubectl command parsed from the environment
///
/// The configured value may carry arguments of its own (context, namespace);
/// they are kept in front of the operation arguments.
fn base_command() -> Result<(String, Vec<String>)> {
    let raw = std::env::var(KUBECTL_COMMAND_ENV).unwrap_or_default();
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or(Error::Env(KUBECTL_COMMAND_ENV))?;
    Ok((program, parts.collect()))
}

async fn run_kubectl(args: &[&str]) -> Result<String> {
    let (program, base_args) = base_command()?;
    let command_line = std::iter::once(program.as_str())
        .chain(base_args.iter().map(String::as_str))
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!(command = %command_line, "running kubectl");

    let output = Command::new(&program)
        .args(&base_args)
        .args(args)
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::command(
            command_line,
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
