use serde::Deserialize;
use std::path::PathBuf;

use crate::models::{DriverConfig, MapList};

pub const DEFAULT_BINARY: &str = "docker";
pub const DEFAULT_COMMAND: &str = "/bin/sh -c 'while true; do sleep 1000; done'";

/// Splits `family[-version]` on the first hyphen.
fn split_platform(platform_id: &str) -> (&str, Option<&str>) {
    match platform_id.find('-') {
        Some(index) => (&platform_id[..index], Some(&platform_id[index + 1..])),
        None => (platform_id, None),
    }
}

/// Image reference a platform identifier maps to, e.g. `ubuntu-16.04`
/// becomes `ubuntu:16.04` and `centos-7.2` becomes `centos:centos7`.
pub fn default_image(platform_id: &str) -> String {
    let (family, version) = split_platform(platform_id);

    match version {
        Some(version) if family == "centos" => {
            let digits = version
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(version.len());
            let major = match &version[..digits] {
                "" => version.split('.').next().unwrap_or(version),
                major => major,
            };
            format!("{}:centos{}", family, major)
        }
        Some(version) => format!("{}:{}", family, version),
        None => family.to_owned(),
    }
}

pub fn default_platform(platform_id: &str) -> String {
    split_platform(platform_id).0.to_owned()
}

/// User overrides for the driver, as found in the `driver` section of an
/// instance file. Unset fields fall back to defaults in [`DriverOptions::resolve`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverOptions {
    pub binary: Option<String>,
    pub use_sudo: Option<bool>,
    pub socket: Option<String>,
    pub no_cache: Option<bool>,
    pub command: Option<String>,
    pub privileged: Option<bool>,
    pub image: Option<String>,
    pub platform: Option<String>,
    pub container_name: Option<String>,
    pub publish_all: Option<bool>,
    pub memory_limit: Option<String>,
    pub cpu_shares: Option<String>,
    pub publish: Vec<String>,
    pub volume: Vec<String>,
    pub link: Vec<String>,
    pub dockerfile: Option<PathBuf>,
    pub run_command: Vec<String>,
    pub environment: MapList,
    pub remove_images: Option<bool>,
}

impl DriverOptions {
    pub fn resolve(self, platform_id: &str) -> DriverConfig {
        DriverConfig {
            binary: self.binary.unwrap_or_else(|| DEFAULT_BINARY.into()),
            use_sudo: self.use_sudo.unwrap_or(false),
            socket: self.socket,
            no_cache: self.no_cache.unwrap_or(false),
            command: self.command.unwrap_or_else(|| DEFAULT_COMMAND.into()),
            privileged: self.privileged.unwrap_or(false),
            image: self.image.unwrap_or_else(|| default_image(platform_id)),
            platform: self
                .platform
                .unwrap_or_else(|| default_platform(platform_id)),
            container_name: self.container_name,
            publish_all: self.publish_all.unwrap_or(false),
            memory_limit: self.memory_limit,
            cpu_shares: self.cpu_shares,
            publish: self.publish,
            volume: self.volume,
            link: self.link,
            dockerfile: self.dockerfile,
            run_command: self.run_command,
            environment: self.environment.into_pairs(),
            remove_images: self.remove_images.unwrap_or(false),
        }
    }
}

impl DriverConfig {
    /// Configuration with every option at its default for `platform_id`.
    pub fn for_platform(platform_id: &str) -> DriverConfig {
        DriverOptions::default().resolve(platform_id)
    }
}
