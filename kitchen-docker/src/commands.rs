//! Command lines for the container CLI.
//!
//! Every builder returns the arguments that follow the binary, e.g.
//! `run -d ...`; [`wrap`] turns them into a full command line. The one
//! exception is [`transfer_command`] which returns a complete pipeline.

use std::{borrow::Cow, path::Path};

use crate::models::{ContainerId, DriverConfig, ExecOptions, LoginCommand};

/// Prefixes `cmd` with the container binary, e.g. `docker build -`.
pub fn wrap(config: &DriverConfig, cmd: &str) -> String {
    let mut wrapped = String::new();

    if config.use_sudo {
        wrapped.push_str("sudo ");
    }
    wrapped.push_str(&config.binary);
    if let Some(socket) = &config.socket {
        wrapped.push_str(" -H ");
        wrapped.push_str(socket);
    }
    wrapped.push(' ');
    wrapped.push_str(cmd);

    wrapped
}

/// The build context is read from standard input.
pub fn build_command(config: &DriverConfig) -> String {
    let mut cmd = String::from("build");
    if config.no_cache {
        cmd.push_str(" --no-cache");
    }
    cmd.push_str(" -");
    cmd
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

pub fn run_command(config: &DriverConfig, image: &str) -> String {
    let mut cmd = String::from("run -d");

    if let Some(name) = non_empty(&config.container_name) {
        cmd.push_str(&format!(" --name {}", name));
    }
    if config.publish_all {
        cmd.push_str(" -P");
    }
    if let Some(memory) = non_empty(&config.memory_limit) {
        cmd.push_str(&format!(" -m {}", memory));
    }
    if let Some(cpu) = non_empty(&config.cpu_shares) {
        cmd.push_str(&format!(" -c {}", cpu));
    }
    if config.privileged {
        cmd.push_str(" --privileged");
    }
    for port in &config.publish {
        cmd.push_str(&format!(" -p {}", port));
    }
    for volume in &config.volume {
        cmd.push_str(&format!(" -v {}", volume));
    }
    for link in &config.link {
        cmd.push_str(&format!(" --link {}", link));
    }

    cmd.push_str(&format!(" {} {}", image, config.command));
    cmd
}

pub fn exec_command(container_id: &ContainerId, cmd: &str, options: ExecOptions) -> String {
    let mut exec = String::from("exec");
    if options.tty {
        exec.push_str(" -t");
    }
    if options.interactive {
        exec.push_str(" -i");
    }
    exec.push_str(&format!(" {} {}", container_id, cmd));
    exec
}

/// Empties (or creates) `root_path` inside the container.
pub fn pre_transfer_command(root_path: &str, container_id: &ContainerId) -> String {
    let script = format!(
        "mkdir -p {root} && rm -rf {root}/*",
        root = shell_quote(root_path)
    );
    exec_command(
        container_id,
        &format!("sh -c {}", shell_quote(&script)),
        ExecOptions::default(),
    )
}

/// Streams the local sandbox into `root_path` inside the container.
pub fn transfer_command(
    config: &DriverConfig,
    sandbox_path: &Path,
    root_path: &str,
    container_id: &ContainerId,
) -> String {
    let sandbox_path = sandbox_path.to_string_lossy();
    let extract = exec_command(
        container_id,
        &format!("tar -C {} -x -f -", shell_quote(root_path)),
        ExecOptions {
            tty: false,
            interactive: true,
        },
    );

    format!(
        "tar -C {} -c -f - . | {}",
        shell_quote(&sandbox_path),
        wrap(config, &extract)
    )
}

pub fn remove_container_command(container_id: &ContainerId) -> String {
    format!("rm -f {}", container_id)
}

pub fn remove_image_command(image: &str) -> String {
    format!("rmi {}", image)
}

pub fn login_command(config: &DriverConfig, container_id: &ContainerId) -> LoginCommand {
    let mut args = Vec::new();
    let program = if config.use_sudo {
        args.push(config.binary.clone());
        "sudo".to_owned()
    } else {
        config.binary.clone()
    };

    if let Some(socket) = &config.socket {
        args.push("-H".into());
        args.push(socket.clone());
    }
    args.extend(
        ["exec", "-t", "-i", container_id.0.as_str(), "/bin/bash"]
            .iter()
            .map(|arg| arg.to_string()),
    );

    LoginCommand { program, args }
}

/// Single-quotes `value` for `sh` unless it only contains characters
/// that never need quoting.
fn shell_quote(value: &str) -> Cow<'_, str> {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:@%,".contains(c));

    if safe {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> DriverConfig {
        DriverConfig::for_platform("ubuntu-16.04")
    }

    fn container() -> ContainerId {
        ContainerId("abc123".into())
    }

    #[test]
    fn wrap_uses_docker_by_default() {
        assert_eq!(wrap(&config(), "build -"), "docker build -");
    }

    #[test]
    fn wrap_with_sudo_and_socket() {
        let mut config = config();
        config.use_sudo = true;
        config.binary = "podman".into();
        config.socket = Some("unix:///run/podman.sock".into());

        assert_eq!(
            wrap(&config, "ps"),
            "sudo podman -H unix:///run/podman.sock ps"
        );
    }

    #[test]
    fn build_reads_context_from_stdin() {
        let mut config = config();
        assert_eq!(build_command(&config), "build -");

        config.no_cache = true;
        assert_eq!(build_command(&config), "build --no-cache -");
    }

    #[test]
    fn run_with_defaults() {
        let config = config();
        assert_eq!(
            run_command(&config, "0123456789ab"),
            format!("run -d 0123456789ab {}", config.command)
        );
    }

    #[test]
    fn run_fragments_in_fixed_order() {
        let mut config = config();
        config.command = "/sbin/init".into();
        config.link = vec!["db:db".into(), "cache:cache".into()];
        config.volume = vec!["/a:/a".into(), "/b:/b".into()];
        config.publish = vec!["8080:80".into(), "443:443".into()];
        config.privileged = true;
        config.cpu_shares = Some("512".into());
        config.memory_limit = Some("256m".into());
        config.publish_all = true;
        config.container_name = Some("web".into());

        assert_eq!(
            run_command(&config, "0123456789ab"),
            "run -d --name web -P -m 256m -c 512 --privileged \
             -p 8080:80 -p 443:443 -v /a:/a -v /b:/b --link db:db --link cache:cache \
             0123456789ab /sbin/init"
        );
    }

    #[test]
    fn run_with_some_optional_fragments() {
        let mut config = config();
        config.command = "sleep infinity".into();
        config.privileged = true;
        config.volume = vec!["/data:/data".into()];
        config.memory_limit = Some("1g".into());

        assert_eq!(
            run_command(&config, "img"),
            "run -d -m 1g --privileged -v /data:/data img sleep infinity"
        );
    }

    #[test]
    fn run_skips_empty_optional_values() {
        let mut config = config();
        config.command = "cmd".into();
        config.container_name = Some(String::new());
        config.memory_limit = Some(String::new());
        config.cpu_shares = Some(String::new());

        assert_eq!(run_command(&config, "img"), "run -d img cmd");
    }

    #[test]
    fn duplicate_publish_entries_are_kept() {
        let mut config = config();
        config.command = "true".into();
        config.publish = vec!["80:80".into(), "80:80".into()];

        assert_eq!(
            run_command(&config, "img"),
            "run -d -p 80:80 -p 80:80 img true"
        );
    }

    #[test]
    fn exec_flags() {
        let tty = ExecOptions {
            tty: true,
            interactive: false,
        };
        let both = ExecOptions {
            tty: true,
            interactive: true,
        };

        assert_eq!(
            exec_command(&container(), "ls -la", tty),
            "exec -t abc123 ls -la"
        );
        assert_eq!(
            exec_command(&container(), "ls", ExecOptions::default()),
            "exec abc123 ls"
        );
        assert_eq!(exec_command(&container(), "sh", both), "exec -t -i abc123 sh");
    }

    #[test]
    fn pre_transfer_clears_root() {
        assert_eq!(
            pre_transfer_command("/tmp/kitchen", &container()),
            "exec abc123 sh -c 'mkdir -p /tmp/kitchen && rm -rf /tmp/kitchen/*'"
        );
    }

    #[test]
    fn pre_transfer_quotes_root_with_spaces() {
        assert_eq!(
            pre_transfer_command("/tmp/my kitchen", &container()),
            r#"exec abc123 sh -c 'mkdir -p '\''/tmp/my kitchen'\'' && rm -rf '\''/tmp/my kitchen'\''/*'"#
        );
    }

    #[test]
    fn transfer_wraps_only_remote_half() {
        let mut config = config();
        config.use_sudo = true;

        assert_eq!(
            transfer_command(
                &config,
                &PathBuf::from("/tmp/sandbox-x1"),
                "/tmp/kitchen",
                &container()
            ),
            "tar -C /tmp/sandbox-x1 -c -f - . | sudo docker exec -i abc123 tar -C /tmp/kitchen -x -f -"
        );
    }

    #[test]
    fn transfer_quotes_sandbox_with_spaces() {
        assert_eq!(
            transfer_command(
                &config(),
                &PathBuf::from("/tmp/my sandbox"),
                "/tmp/kitchen",
                &container()
            ),
            "tar -C '/tmp/my sandbox' -c -f - . | docker exec -i abc123 tar -C /tmp/kitchen -x -f -"
        );
    }

    #[test]
    fn transfer_quotes_root_path() {
        assert_eq!(
            transfer_command(
                &config(),
                &PathBuf::from("/tmp/sandbox-x1"),
                "/tmp/it's here",
                &container()
            ),
            r#"tar -C /tmp/sandbox-x1 -c -f - . | docker exec -i abc123 tar -C '/tmp/it'\''s here' -x -f -"#
        );
    }

    #[test]
    fn removal_commands() {
        assert_eq!(remove_container_command(&container()), "rm -f abc123");
        assert_eq!(remove_image_command("0123456789ab"), "rmi 0123456789ab");
    }

    #[test]
    fn login_is_an_argument_vector() {
        let login = login_command(&config(), &container());

        assert_eq!(login.program, "docker");
        assert_eq!(login.args, vec!["exec", "-t", "-i", "abc123", "/bin/bash"]);
    }

    #[test]
    fn login_through_sudo() {
        let mut config = config();
        config.use_sudo = true;

        let login = login_command(&config, &container());

        assert_eq!(login.program, "sudo");
        assert_eq!(
            login.args,
            vec!["docker", "exec", "-t", "-i", "abc123", "/bin/bash"]
        );
    }
}
