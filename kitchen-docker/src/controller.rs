use log::{info, warn};

use crate::{
    commands, dockerfile,
    error::{DriverError, Result},
    models::{
        ContainerId, DriverConfig, ExecOptions, ImageId, LoginCommand, RunOptions, SessionState,
    },
    parser,
    services::{CommandRunner, Provisioner, Verifier},
};

const TTY: ExecOptions = ExecOptions {
    tty: true,
    interactive: false,
};

/// Drives one sandbox container through create, converge, setup, verify
/// and destroy. The caller owns the [`SessionState`] and is expected to
/// call `create` before anything else.
pub struct Controller {
    config: DriverConfig,
    runner: Box<dyn CommandRunner>,
}

impl Controller {
    pub fn init<R>(config: DriverConfig, runner: R) -> Controller
    where
        R: 'static + CommandRunner,
    {
        Controller {
            config,
            runner: Box::new(runner),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn docker(&mut self, cmd: &str, options: RunOptions) -> Result<String> {
        let command = commands::wrap(&self.config, cmd);
        info!("running {:?}", command);
        self.runner.run(&command, options)
    }

    fn exec_tty(&mut self, container_id: &ContainerId, cmd: &str) -> Result<()> {
        let exec = commands::exec_command(container_id, cmd, TTY);
        self.docker(&exec, RunOptions::tty())?;
        Ok(())
    }

    /// Builds the image and starts the container, skipping whichever of
    /// the two the state already has.
    pub fn create(&mut self, state: &mut SessionState) -> Result<()> {
        let image = match state.image.clone() {
            Some(image) => image,
            None => {
                let image = self.build_image()?;
                state.image = Some(image.clone());
                image
            }
        };

        if state.container_id.is_none() {
            let run = commands::run_command(&self.config, &image.0);
            let output = self.docker(&run, RunOptions::default())?;
            let container_id = parser::parse_container_id(&output)?;
            info!("started container {}", container_id);
            state.container_id = Some(container_id);
        }

        Ok(())
    }

    fn build_image(&mut self) -> Result<ImageId> {
        let dockerfile = dockerfile::synthesize(&self.config)?;
        let build = commands::build_command(&self.config);
        let output = self.docker(&build, RunOptions::input(dockerfile))?;
        let image = parser::parse_image_id(&output)?;
        info!("built image {}", image);
        Ok(image)
    }

    /// Stages the provisioner's sandbox and runs it inside the container.
    /// The sandbox is cleaned up on every path out of this function; an
    /// error from the bootstrap wins over an error from the cleanup.
    pub fn converge(
        &mut self,
        state: &SessionState,
        provisioner: &mut dyn Provisioner,
    ) -> Result<()> {
        let result = self.bootstrap(state, provisioner);
        let cleanup = provisioner
            .cleanup_sandbox()
            .map_err(DriverError::Provisioner);

        match (result, cleanup) {
            (Err(err), Err(cleanup_err)) => {
                warn!("sandbox cleanup failed: {}", cleanup_err);
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), cleanup) => cleanup,
        }
    }

    fn bootstrap(&mut self, state: &SessionState, provisioner: &mut dyn Provisioner) -> Result<()> {
        provisioner
            .create_sandbox()
            .map_err(DriverError::Provisioner)?;

        let container_id = container_id(state)?;

        for cmd in [provisioner.install_command(), provisioner.init_command()]
            .iter()
            .flatten()
            .filter(|cmd| !cmd.is_empty())
        {
            self.exec_tty(container_id, cmd)?;
        }

        let root_path = provisioner.root_path();
        let pre_transfer = commands::pre_transfer_command(root_path, container_id);
        self.docker(&pre_transfer, RunOptions::default())?;

        let transfer = commands::transfer_command(
            &self.config,
            provisioner.sandbox_path(),
            root_path,
            container_id,
        );
        info!("running {:?}", transfer);
        self.runner.run(&transfer, RunOptions::default())?;

        for cmd in [provisioner.prepare_command(), provisioner.run_command()]
            .iter()
            .flatten()
            .filter(|cmd| !cmd.is_empty())
        {
            self.exec_tty(container_id, cmd)?;
        }

        Ok(())
    }

    pub fn setup(&mut self, state: &SessionState, verifier: &dyn Verifier) -> Result<()> {
        if let Some(cmd) = verifier.setup_cmd() {
            self.exec_tty(container_id(state)?, &cmd)?;
        }

        Ok(())
    }

    pub fn verify(&mut self, state: &SessionState, verifier: &dyn Verifier) -> Result<()> {
        if let Some(cmd) = verifier.sync_cmd() {
            self.exec_tty(container_id(state)?, &cmd)?;
        }
        if let Some(cmd) = verifier.run_cmd() {
            self.exec_tty(container_id(state)?, &cmd)?;
        }

        Ok(())
    }

    /// Force-removes the container. Teardown never fails: a removal error
    /// is logged and treated as the container already being gone.
    pub fn destroy(&mut self, state: &SessionState) {
        if let Some(container_id) = &state.container_id {
            let remove = commands::remove_container_command(container_id);
            if let Err(err) = self.docker(&remove, RunOptions::default()) {
                warn!("could not remove container {}: {}", container_id, err);
            }
        }

        if self.config.remove_images {
            if let Some(image) = &state.image {
                let remove = commands::remove_image_command(&image.0);
                if let Err(err) = self.docker(&remove, RunOptions::default()) {
                    warn!("could not remove image {}: {}", image, err);
                }
            }
        }
    }

    pub fn remote_command(&mut self, state: &SessionState, cmd: &str) -> Result<String> {
        let exec = commands::exec_command(container_id(state)?, cmd, ExecOptions::default());
        self.docker(&exec, RunOptions::default())
    }

    pub fn login_command(&self, state: &SessionState) -> Result<LoginCommand> {
        Ok(commands::login_command(&self.config, container_id(state)?))
    }
}

fn container_id(state: &SessionState) -> Result<&ContainerId> {
    state.container_id.as_ref().ok_or_else(|| {
        DriverError::action_failed("No container has been created for this instance.")
    })
}
