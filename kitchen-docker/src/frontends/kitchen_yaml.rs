use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::{
    backends::{ProvisionerOptions, ShellVerifier},
    config::DriverOptions,
    models::DriverConfig,
    services::InstanceFrontend,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KitchenFile {
    name: Option<String>,

    platform: String,

    #[serde(default)]
    driver: DriverOptions,

    #[serde(default)]
    provisioner: ProvisionerOptions,

    #[serde(default)]
    verifier: ShellVerifier,
}

/// Everything needed to drive one sandbox, resolved from an instance file.
#[derive(Clone, Debug)]
pub struct Instance {
    pub name: String,
    pub platform: String,
    pub driver: DriverConfig,
    pub provisioner: ProvisionerOptions,
    pub verifier: ShellVerifier,
    /// Directory containing the instance file.
    pub base_dir: PathBuf,
}

impl Instance {
    /// Where the session state of this instance is persisted.
    pub fn state_path(&self) -> PathBuf {
        self.base_dir
            .join(".kitchen")
            .join(format!("{}.yml", self.name))
    }
}

fn default_name(platform: &str) -> String {
    let platform: String = platform.chars().filter(|c| *c != '.').collect();
    format!("default-{}", platform)
}

pub struct KitchenYamlFrontend;

impl KitchenYamlFrontend {
    pub fn new() -> KitchenYamlFrontend {
        KitchenYamlFrontend
    }
}

impl Default for KitchenYamlFrontend {
    fn default() -> Self {
        KitchenYamlFrontend::new()
    }
}

impl InstanceFrontend for KitchenYamlFrontend {
    fn instance<P: AsRef<Path>>(&mut self, instance_file_path: P) -> Result<Instance> {
        let instance_file_path = instance_file_path.as_ref();
        let instance_file = File::open(instance_file_path)
            .with_context(|| format!("could not open {:?}", instance_file_path))?;

        let file: KitchenFile = serde_yaml::from_reader(instance_file)
            .with_context(|| format!("could not parse {:?}", instance_file_path))?;

        let base_dir = instance_file_path
            .parent()
            .ok_or_else(|| anyhow!("Instance file has no parent."))?
            .to_path_buf();

        let name = file.name.clone().unwrap_or_else(|| default_name(&file.platform));

        let mut driver = file.driver.resolve(&file.platform);
        if let Some(dockerfile) = driver.dockerfile.take() {
            driver.dockerfile = Some(base_dir.join(dockerfile));
        }

        Ok(Instance {
            name,
            platform: file.platform,
            driver,
            provisioner: file.provisioner,
            verifier: file.verifier,
            base_dir,
        })
    }
}
