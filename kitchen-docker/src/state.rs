use anyhow::{Context, Result};
use log::debug;
use std::{fs, io::ErrorKind, path::Path};

use crate::models::SessionState;

/// Reads the persisted state, or an empty one if nothing was saved yet.
pub fn load(path: &Path) -> Result<SessionState> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str(&contents)
            .with_context(|| format!("could not parse state file {:?}", path)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(SessionState::default()),
        Err(err) => Err(err).with_context(|| format!("could not read state file {:?}", path)),
    }
}

pub fn save(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = serde_yaml::to_string(state)?;
    fs::write(path, contents).with_context(|| format!("could not write state file {:?}", path))?;
    debug!("saved state to {:?}", path);

    Ok(())
}

pub fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => {
            Err(err).with_context(|| format!("could not remove state file {:?}", path))
        }
        _ => Ok(()),
    }
}
