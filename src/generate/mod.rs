//! EntandoAppV2 custom resource document emission
//!
//! Writes the resource as a YAML document to a file or stdout. When the image
//! adaptation engine reported unresolved digests the document is annotated
//! and its syntax deliberately broken, so it cannot be applied before a human
//! replaces the placeholders.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::crd::EntandoAppV2;
use crate::{Error, Result};

/// Environment variable providing the name of the EntandoApp to upgrade
pub const APP_NAME_ENV: &str = "ENTANDO_CLI_APPNAME";

/// Environment variable providing the ingress host name of the installation
pub const INGRESS_HOST_NAME_ENV: &str = "ENTANDO_CLI_INGRESS_HOST_NAME";

const DEFAULT_RESOURCE_NAME: &str = "my-app";

const FIX_HEADER: &str = "\
# WARNING: some image digests could not be resolved automatically.
# Please replace the placeholders marked with FIXME before applying this resource.
";

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"("|')([^"'\n]*ERROR: <[^"'\n]*)("|')"#).expect("valid regex")
});

/// Write the CR in YAML format to the given file, or to stdout when no file
/// is specified
///
/// The resource name and the EntandoApp/ingress identifiers are filled in
/// before serialization; the identifiers come from the environment and their
/// absence is an error. With `needs_fix` set, a warning comment is prepended
/// and the quoting around every placeholder value is stripped (tagging it
/// with `# FIXME`), leaving the document invalid until edited.
pub fn generate_custom_resource(
    output: Option<&Path>,
    app: &mut EntandoAppV2,
    needs_fix: bool,
) -> Result<()> {
    app.metadata.name = Some(DEFAULT_RESOURCE_NAME.to_string());
    app.spec.entando_app_name = required_env(APP_NAME_ENV)?;
    app.spec.ingress_host_name = required_env(INGRESS_HOST_NAME_ENV)?;

    let yaml = serde_yaml::to_string(&*app)?;
    let body = if needs_fix {
        format!("{FIX_HEADER}{}", break_syntax(&yaml))
    } else {
        yaml
    };

    match output {
        Some(path) => {
            let mut file = File::create(path).map_err(|e| {
                Error::validation(format!("unable to create file {}. {e}", path.display()))
            })?;
            write_document(&mut file, &body)
        }
        None => write_document(&mut io::stdout(), &body),
    }
}

fn required_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Env(name)),
    }
}

fn write_document(writer: &mut dyn Write, body: &str) -> Result<()> {
    writer.write_all(b"---\n")?;
    writer.write_all(body.as_bytes())?;
    Ok(())
}

/// Strip the quotes around the error placeholders to break the YAML syntax,
/// preventing an accidental apply before human intervention
fn break_syntax(yaml: &str) -> String {
    PLACEHOLDER_RE.replace_all(yaml, "$2 # FIXME").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ComponentSpec, EntandoAppV2Spec};
    use std::sync::Mutex;

    // The generator reads process-wide environment variables; serialize the
    // tests touching them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn sample_app() -> EntandoAppV2 {
        EntandoAppV2::new(
            "",
            EntandoAppV2Spec {
                version: "7.1.0".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn writes_a_complete_document() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        std::env::set_var(APP_NAME_ENV, "my-entando-app");
        std::env::set_var(INGRESS_HOST_NAME_ENV, "quickstart.10.11.91.88.nip.io");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cr.yaml");

        let mut app = sample_app();
        generate_custom_resource(Some(&path), &mut app, false).expect("generate");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert!(content.starts_with("---\n"));
        assert!(content.contains("apiVersion: app.entando.org/v1alpha1"));
        assert!(content.contains("kind: EntandoAppV2"));
        assert!(content.contains("name: my-app"));
        assert!(content.contains("version: 7.1.0"));
        assert!(content.contains("entandoAppName: my-entando-app"));
        assert!(content.contains("ingressHostName: quickstart.10.11.91.88.nip.io"));
    }

    #[test]
    fn placeholders_break_the_syntax_and_get_flagged() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        std::env::set_var(APP_NAME_ENV, "my-entando-app");
        std::env::set_var(INGRESS_HOST_NAME_ENV, "quickstart.10.11.91.88.nip.io");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cr.yaml");

        let mut app = sample_app();
        app.spec.app_builder = ComponentSpec::with_override(
            "registry.hub.docker.com/entando/app-builder@ERROR: <unable to fetch digest of: registry.hub.docker.com/entando/app-builder:invalid-tag>",
        );
        generate_custom_resource(Some(&path), &mut app, true).expect("generate");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert!(content.contains("Please replace the placeholders"));
        assert!(content.contains(
            "ERROR: <unable to fetch digest of: registry.hub.docker.com/entando/app-builder:invalid-tag> # FIXME"
        ));
        // The quoting around the placeholder value is gone
        assert!(!content.contains("\"registry.hub.docker.com/entando/app-builder@ERROR"));
        assert!(!content.contains("'registry.hub.docker.com/entando/app-builder@ERROR"));
    }

    #[test]
    fn missing_environment_is_reported_by_name() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        std::env::remove_var(APP_NAME_ENV);
        std::env::set_var(INGRESS_HOST_NAME_ENV, "quickstart.10.11.91.88.nip.io");

        let mut app = sample_app();
        let err = generate_custom_resource(None, &mut app, false).expect_err("missing env");
        assert!(err.to_string().contains(APP_NAME_ENV));
    }

    #[test]
    fn break_syntax_only_touches_placeholder_values() {
        let yaml = "imageOverride: 'registry.hub.docker.com/entando/app-builder@ERROR: <unable to fetch digest of: x:y>'\nversion: 7.1.0\n";
        let broken = break_syntax(yaml);
        assert_eq!(
            broken,
            "imageOverride: registry.hub.docker.com/entando/app-builder@ERROR: <unable to fetch digest of: x:y> # FIXME\nversion: 7.1.0\n"
        );
    }
}
