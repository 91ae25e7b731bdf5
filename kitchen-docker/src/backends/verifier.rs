use serde::Deserialize;

use crate::services::Verifier;

/// Verifier driven by plain shell commands from the `verifier` section of
/// an instance file. Blank commands count as unset.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellVerifier {
    pub setup_cmd: Option<String>,
    pub sync_cmd: Option<String>,
    pub run_cmd: Option<String>,
}

fn non_blank(cmd: &Option<String>) -> Option<String> {
    cmd.as_ref()
        .filter(|cmd| !cmd.trim().is_empty())
        .cloned()
}

impl Verifier for ShellVerifier {
    fn setup_cmd(&self) -> Option<String> {
        non_blank(&self.setup_cmd)
    }

    fn sync_cmd(&self) -> Option<String> {
        non_blank(&self.sync_cmd)
    }

    fn run_cmd(&self) -> Option<String> {
        non_blank(&self.run_cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_commands_are_unset() {
        let verifier = ShellVerifier {
            setup_cmd: Some("  ".into()),
            sync_cmd: None,
            run_cmd: Some("bats /tmp/kitchen/test".into()),
        };

        assert_eq!(verifier.setup_cmd(), None);
        assert_eq!(verifier.sync_cmd(), None);
        assert_eq!(verifier.run_cmd().as_deref(), Some("bats /tmp/kitchen/test"));
    }
}
