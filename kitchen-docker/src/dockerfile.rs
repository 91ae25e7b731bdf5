use log::debug;
use std::fs;

use crate::{
    error::{DriverError, Result},
    models::DriverConfig,
};

/// Package bootstrap for families we know how to prepare.
fn platform_bootstrap(platform: &str) -> &'static [&'static str] {
    match platform {
        "debian" | "ubuntu" => &[
            "RUN apt-get update",
            "RUN apt-get -y install sudo curl tar",
        ],
        "rhel" | "centos" => &["RUN yum clean all", "RUN yum -y install sudo curl tar"],
        _ => &[],
    }
}

/// Returns the build input for `config`: the user's Dockerfile if one is
/// configured, otherwise a minimal one generated from the platform.
pub fn synthesize(config: &DriverConfig) -> Result<String> {
    if let Some(path) = &config.dockerfile {
        return fs::read_to_string(path)
            .map_err(|err| DriverError::dockerfile_not_found(path.clone(), err));
    }

    let bootstrap = platform_bootstrap(&config.platform);
    if bootstrap.is_empty() {
        debug!(
            "no package bootstrap for platform {:?}, skipping",
            config.platform
        );
    }

    let mut lines = Vec::with_capacity(1 + bootstrap.len() + config.run_command.len());
    lines.push(format!("FROM {}", config.image));
    lines.extend(bootstrap.iter().map(|line| line.to_string()));
    lines.extend(config.run_command.iter().map(|cmd| format!("RUN {}", cmd)));
    lines.extend(
        config
            .environment
            .iter()
            .map(|(key, value)| format!("ENV {}={}", key, value)),
    );

    Ok(lines.join("\n"))
}
