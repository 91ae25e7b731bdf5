use anyhow::{anyhow, Result};
use crossterm::{
    style::{self, Colorize, Styler},
    QueueableCommand,
};
use log::{info, warn};
use std::{
    env,
    io::{stdout, Write},
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;

use kitchen_docker::{
    backends::{ShellProvisioner, ShellRunner, ShellVerifier},
    dockerfile,
    frontends::KitchenYamlFrontend,
    models::LoginCommand,
    services::InstanceFrontend,
    state, Controller, SessionState,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kitchen-docker",
    about = "Builds, provisions and verifies throwaway test containers."
)]
struct Opt {
    #[structopt(short, long, parse(from_os_str))]
    /// Instance file to use instead of searching for .kitchen.yml.
    file: Option<PathBuf>,

    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Builds the image and starts the container.
    Create,
    /// Copies the provisioner sandbox into the container and runs it.
    Converge,
    /// Prepares the verifier inside the container.
    Setup,
    /// Runs the verifier inside the container.
    Verify,
    /// Removes the container.
    Destroy,
    /// Runs create, converge, setup and verify, then destroys the container.
    Test,
    /// Runs a command inside the container.
    Exec {
        #[structopt(required = true)]
        command: Vec<String>,
    },
    /// Opens an interactive shell in the container.
    Login,
    /// Prints the Dockerfile the image is built from.
    Dockerfile,
}

fn find_instance_file<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    for path in path.as_ref().ancestors() {
        let instance_file_path = path.join(".kitchen.yml");
        if instance_file_path.exists() {
            return Some(instance_file_path);
        }

        let instance_file_path = path.join("kitchen.yml");
        if instance_file_path.exists() {
            return Some(instance_file_path);
        }
    }

    None
}

struct Session {
    name: String,
    controller: Controller,
    provisioner: ShellProvisioner,
    verifier: ShellVerifier,
    state: SessionState,
    state_path: PathBuf,
}

impl Session {
    fn create(&mut self) -> Result<()> {
        let result = self.controller.create(&mut self.state);
        // Whatever was built before a failure still has to be destroyed.
        let saved = state::save(&self.state_path, &self.state);
        first_error(result.map_err(Into::into), saved, "saving state")
    }

    fn converge(&mut self) -> Result<()> {
        Ok(self
            .controller
            .converge(&self.state, &mut self.provisioner)?)
    }

    fn setup(&mut self) -> Result<()> {
        Ok(self.controller.setup(&self.state, &self.verifier)?)
    }

    fn verify(&mut self) -> Result<()> {
        Ok(self.controller.verify(&self.state, &self.verifier)?)
    }

    fn destroy(&mut self) -> Result<()> {
        self.controller.destroy(&self.state);
        state::remove(&self.state_path)
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init_custom_env("LOG");

    let opt = Opt::from_args();

    let mut stdout = stdout();

    let instance_file_path = match opt.file {
        Some(path) => path,
        None => {
            let current_dir = env::current_dir()?;
            find_instance_file(current_dir).ok_or_else(|| anyhow!("Couldn't find a .kitchen.yml file in the current working directory or any of its parents."))?
        }
    };
    info!("found instance file {:?}", instance_file_path);

    let mut frontend = KitchenYamlFrontend::new();
    let instance = frontend.instance(&instance_file_path)?;
    info!(
        "instance {:?} on platform {:?}",
        instance.name, instance.platform
    );

    let state_path = instance.state_path();
    let state = state::load(&state_path)?;
    info!("loaded state {:?}", state);

    let mut session = Session {
        provisioner: ShellProvisioner::relative_to(instance.provisioner, &instance.base_dir),
        verifier: instance.verifier,
        controller: Controller::init(instance.driver, ShellRunner::new()),
        name: instance.name,
        state,
        state_path,
    };

    match opt.cmd {
        Cmd::Create => step(&mut stdout, &mut session, "Creating", Session::create)?,
        Cmd::Converge => step(&mut stdout, &mut session, "Converging", Session::converge)?,
        Cmd::Setup => step(&mut stdout, &mut session, "Setting up", Session::setup)?,
        Cmd::Verify => step(&mut stdout, &mut session, "Verifying", Session::verify)?,
        Cmd::Destroy => step(&mut stdout, &mut session, "Destroying", Session::destroy)?,
        Cmd::Test => {
            let result = test(&mut stdout, &mut session);
            let destroyed = step(&mut stdout, &mut session, "Destroying", Session::destroy);
            first_error(result, destroyed, "destroying")?;
        }
        Cmd::Exec { command } => {
            let output = session
                .controller
                .remote_command(&session.state, &command.join(" "))?;
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
        Cmd::Login => {
            let login = session.controller.login_command(&session.state)?;
            login_into(login)?;
        }
        Cmd::Dockerfile => {
            let dockerfile = dockerfile::synthesize(session.controller.config())?;
            writeln!(stdout, "{}", dockerfile)?;
        }
    }

    Ok(())
}

/// Returns the error of `primary` if there is one, logging a failure of
/// the `secondary` step that ran after it.
fn first_error(primary: Result<()>, secondary: Result<()>, secondary_step: &str) -> Result<()> {
    match (primary, secondary) {
        (Err(err), Err(secondary_err)) => {
            warn!("{} failed as well: {:#}", secondary_step, secondary_err);
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), secondary) => secondary,
    }
}

fn test(stdout: &mut impl Write, session: &mut Session) -> Result<()> {
    step(stdout, session, "Creating", Session::create)?;
    step(stdout, session, "Converging", Session::converge)?;
    step(stdout, session, "Setting up", Session::setup)?;
    step(stdout, session, "Verifying", Session::verify)
}

/// Prints a header for a lifecycle step, runs it and marks it as done.
fn step<F>(stdout: &mut impl Write, session: &mut Session, verb: &str, action: F) -> Result<()>
where
    F: FnOnce(&mut Session) -> Result<()>,
{
    stdout
        .queue(style::PrintStyledContent("-----> ".cyan().bold()))?
        .queue(style::Print(format!("{} {}\n", verb, session.name)))?
        .flush()?;

    action(session)?;

    stdout
        .queue(style::Print("       "))?
        .queue(style::PrintStyledContent("done".green().bold()))?
        .queue(style::Print("\n"))?
        .flush()?;

    Ok(())
}

#[cfg(unix)]
fn login_into(login: LoginCommand) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let err = process::Command::new(&login.program).args(&login.args).exec();
    Err(anyhow!("could not run {:?}: {}", login.program, err))
}

#[cfg(not(unix))]
fn login_into(login: LoginCommand) -> Result<()> {
    let status = process::Command::new(&login.program)
        .args(&login.args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{:?} exited with {}", login.program, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_keeps_primary_failure() {
        let err = first_error(Err(anyhow!("create failed")), Err(anyhow!("disk full")), "saving")
            .unwrap_err();
        assert_eq!(err.to_string(), "create failed");
    }

    #[test]
    fn first_error_reports_secondary_failure_alone() {
        let err = first_error(Ok(()), Err(anyhow!("disk full")), "saving").unwrap_err();
        assert_eq!(err.to_string(), "disk full");

        assert!(first_error(Ok(()), Ok(()), "saving").is_ok());
    }
}
