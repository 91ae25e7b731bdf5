mod provisioner;
mod shell;
mod verifier;

pub use provisioner::{ProvisionerOptions, ShellProvisioner, DEFAULT_ROOT_PATH};
pub use shell::ShellRunner;
pub use verifier::ShellVerifier;
