use anyhow::{anyhow, Context, Result};
use ignore::WalkBuilder;
use log::{debug, info};
use number_prefix::NumberPrefix;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::{Builder as TempBuilder, TempDir};

use crate::services::Provisioner;

pub const DEFAULT_ROOT_PATH: &str = "/tmp/kitchen";

fn default_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.into()
}

/// The `provisioner` section of an instance file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionerOptions {
    /// Directory staged into the sandbox, relative to the instance file.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_root_path")]
    pub root_path: String,

    pub install_command: Option<String>,
    pub init_command: Option<String>,
    pub prepare_command: Option<String>,
    pub run_command: Option<String>,
}

impl Default for ProvisionerOptions {
    fn default() -> Self {
        ProvisionerOptions {
            source: default_source(),
            root_path: default_root_path(),
            install_command: None,
            init_command: None,
            prepare_command: None,
            run_command: None,
        }
    }
}

/// Stages a local directory in a temporary sandbox and runs plain shell
/// commands to provision the container.
pub struct ShellProvisioner {
    options: ProvisionerOptions,
    sandbox: Option<TempDir>,
}

impl ShellProvisioner {
    pub fn new(options: ProvisionerOptions) -> ShellProvisioner {
        ShellProvisioner {
            options,
            sandbox: None,
        }
    }

    /// Resolves a relative `source` against `base`, usually the directory
    /// of the instance file.
    pub fn relative_to<P: AsRef<Path>>(
        mut options: ProvisionerOptions,
        base: P,
    ) -> ShellProvisioner {
        if options.source.is_relative() {
            options.source = base.as_ref().join(&options.source);
        }
        ShellProvisioner::new(options)
    }

    pub fn source(&self) -> &Path {
        &self.options.source
    }
}

fn stage(source: &Path, sandbox: &Path) -> Result<u64> {
    let walk = WalkBuilder::new(source)
        .add_custom_ignore_filename(".kitchenignore")
        .ignore(false)
        .git_global(false)
        .git_ignore(false)
        .git_exclude(false)
        .hidden(false)
        .build();

    let mut staged_size = 0;
    for result in walk {
        let entry = result?;
        let relative = entry.path().strip_prefix(source)?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = sandbox.join(relative);
        let file_type = entry
            .file_type()
            .ok_or_else(|| anyhow!("cannot stage {:?}", entry.path()))?;

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            staged_size += fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to stage {:?}", entry.path()))?;
        } else {
            debug!("skipping {:?}, not a regular file", entry.path());
        }
    }

    Ok(staged_size)
}

impl Provisioner for ShellProvisioner {
    fn create_sandbox(&mut self) -> Result<()> {
        let sandbox = TempBuilder::new().prefix("kitchen-sandbox-").tempdir()?;
        let size = stage(&self.options.source, sandbox.path())?;

        match NumberPrefix::binary(size as f32) {
            NumberPrefix::Standalone(bytes) => info!("staged sandbox ({} bytes)", bytes),
            NumberPrefix::Prefixed(prefix, n) => info!("staged sandbox ({:.1} {}B)", n, prefix),
        };

        self.sandbox = Some(sandbox);
        Ok(())
    }

    fn cleanup_sandbox(&mut self) -> Result<()> {
        if let Some(sandbox) = self.sandbox.take() {
            debug!("removing sandbox {:?}", sandbox.path());
            sandbox.close()?;
        }
        Ok(())
    }

    fn sandbox_path(&self) -> &Path {
        self.sandbox
            .as_ref()
            .map(|sandbox| sandbox.path())
            .unwrap_or_else(|| Path::new(""))
    }

    fn root_path(&self) -> &str {
        &self.options.root_path
    }

    fn install_command(&self) -> Option<String> {
        self.options.install_command.clone()
    }

    fn init_command(&self) -> Option<String> {
        self.options.init_command.clone()
    }

    fn prepare_command(&self) -> Option<String> {
        self.options.prepare_command.clone()
    }

    fn run_command(&self) -> Option<String> {
        self.options.run_command.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_tree() -> TempDir {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("recipes/nested")).unwrap();
        fs::write(source.path().join("recipes/default.sh"), "echo hi\n").unwrap();
        fs::write(source.path().join("recipes/nested/extra.sh"), "true\n").unwrap();
        fs::write(source.path().join(".env"), "A=1\n").unwrap();
        fs::write(source.path().join("secret.key"), "key\n").unwrap();
        fs::write(source.path().join(".kitchenignore"), "*.key\n").unwrap();
        source
    }

    #[test]
    fn sandbox_mirrors_source_tree() {
        let source = source_tree();
        let mut provisioner = ShellProvisioner::new(ProvisionerOptions {
            source: source.path().to_path_buf(),
            ..Default::default()
        });

        provisioner.create_sandbox().unwrap();
        let sandbox = provisioner.sandbox_path().to_path_buf();

        assert_eq!(
            fs::read_to_string(sandbox.join("recipes/default.sh")).unwrap(),
            "echo hi\n"
        );
        assert!(sandbox.join("recipes/nested/extra.sh").is_file());
        assert!(sandbox.join(".env").is_file());
        assert!(!sandbox.join("secret.key").exists());

        provisioner.cleanup_sandbox().unwrap();
        assert!(!sandbox.exists());
        assert_eq!(provisioner.sandbox_path(), Path::new(""));
    }

    #[test]
    fn cleanup_without_sandbox_is_a_no_op() {
        let mut provisioner = ShellProvisioner::new(ProvisionerOptions::default());
        provisioner.cleanup_sandbox().unwrap();
        provisioner.cleanup_sandbox().unwrap();
    }

    #[test]
    fn relative_source_is_resolved_against_base() {
        let provisioner = ShellProvisioner::relative_to(
            ProvisionerOptions {
                source: PathBuf::from("cookbooks"),
                ..Default::default()
            },
            "/srv/project",
        );

        assert_eq!(provisioner.source(), Path::new("/srv/project/cookbooks"));
        assert_eq!(provisioner.root_path(), DEFAULT_ROOT_PATH);
    }

    #[test]
    fn missing_source_fails_to_stage() {
        let dir = TempDir::new().unwrap();
        let mut provisioner = ShellProvisioner::new(ProvisionerOptions {
            source: dir.path().join("missing"),
            ..Default::default()
        });

        assert!(provisioner.create_sandbox().is_err());
    }
}
