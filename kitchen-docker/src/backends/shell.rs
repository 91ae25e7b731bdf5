use log::debug;
use std::{
    io::{self, Write},
    process::{Command, ExitStatus, Stdio},
    thread,
};

use crate::{
    error::{DriverError, Result},
    models::RunOptions,
    services::CommandRunner,
};

/// Runs command lines through `sh -c`, blocking until they exit.
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new() -> ShellRunner {
        ShellRunner::with_shell("sh")
    }

    pub fn with_shell<S: Into<String>>(shell: S) -> ShellRunner {
        ShellRunner {
            shell: shell.into(),
        }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        ShellRunner::new()
    }
}

fn failure(command: &str, status: ExitStatus, stderr: &str) -> DriverError {
    let exit = match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_owned(),
    };
    let stderr = stderr.trim();

    let reason = if stderr.is_empty() {
        exit
    } else {
        format!("{}: {}", exit, stderr)
    };

    DriverError::Execution {
        command: command.to_owned(),
        reason,
    }
}

fn spawn_failure(command: &str, err: io::Error) -> DriverError {
    DriverError::Execution {
        command: command.to_owned(),
        reason: format!("could not spawn: {}", err),
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str, options: RunOptions) -> Result<String> {
        let mut cmd = self.command(command);

        if options.tty {
            // Attached to the caller's terminal, nothing to capture.
            let status = cmd
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|err| spawn_failure(command, err))?;

            return if status.success() {
                Ok(String::new())
            } else {
                Err(failure(command, status, ""))
            };
        }

        let stdin = if options.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = cmd
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| spawn_failure(command, err))?;

        // The child may fill its stdout pipe before draining stdin.
        let writer = match (options.input, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => {
                Some(thread::spawn(move || stdin.write_all(input.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;

        let written = writer.map(|writer| writer.join());

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!("stderr: {}", line);
        }

        if !output.status.success() {
            return Err(failure(command, output.status, &stderr));
        }

        match written {
            Some(Ok(Err(err))) if err.kind() != io::ErrorKind::BrokenPipe => Err(err.into()),
            Some(Err(_)) => Err(DriverError::Execution {
                command: command.to_owned(),
                reason: "stdin writer panicked".to_owned(),
            }),
            _ => Ok(stdout),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let output = ShellRunner::new()
            .run("echo hello && echo world", RunOptions::default())
            .unwrap();

        assert_eq!(output, "hello\nworld\n");
    }

    #[test]
    fn feeds_input_to_stdin() {
        let output = ShellRunner::new()
            .run("cat", RunOptions::input("FROM scratch\n"))
            .unwrap();

        assert_eq!(output, "FROM scratch\n");
    }

    #[test]
    fn pipelines_are_run_by_the_shell() {
        let output = ShellRunner::new()
            .run("printf 'a\\nb\\n' | wc -l | tr -d ' '", RunOptions::default())
            .unwrap();

        assert_eq!(output.trim(), "2");
    }

    #[test]
    fn non_zero_exit_is_an_execution_error() {
        let err = ShellRunner::new()
            .run("echo oops >&2; exit 3", RunOptions::default())
            .unwrap_err();

        match err {
            DriverError::Execution { command, reason } => {
                assert_eq!(command, "echo oops >&2; exit 3");
                assert_eq!(reason, "exit code 3: oops");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_shell_is_an_execution_error() {
        let err = ShellRunner::with_shell("/nonexistent/shell")
            .run("true", RunOptions::default())
            .unwrap_err();

        assert!(matches!(err, DriverError::Execution { .. }));
    }
}
