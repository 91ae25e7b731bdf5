use anyhow::Result as AnyResult;
use std::path::Path;

use crate::{error::Result, frontends::Instance, models::RunOptions};

pub trait InstanceFrontend {
    fn instance<P: AsRef<Path>>(&mut self, instance_file_path: P) -> AnyResult<Instance>;
}

/// Runs a shell command line and returns what it printed on stdout.
pub trait CommandRunner {
    fn run(&mut self, command: &str, options: RunOptions) -> Result<String>;
}

/// Prepares a local sandbox and knows how to install and run the
/// provisioning toolchain inside the container.
pub trait Provisioner {
    fn create_sandbox(&mut self) -> AnyResult<()>;

    fn cleanup_sandbox(&mut self) -> AnyResult<()>;

    fn sandbox_path(&self) -> &Path;

    /// Directory inside the container the sandbox is copied to.
    fn root_path(&self) -> &str;

    fn install_command(&self) -> Option<String>;

    fn init_command(&self) -> Option<String>;

    fn prepare_command(&self) -> Option<String>;

    fn run_command(&self) -> Option<String>;
}

pub trait Verifier {
    fn setup_cmd(&self) -> Option<String>;

    fn sync_cmd(&self) -> Option<String>;

    fn run_cmd(&self) -> Option<String>;
}
