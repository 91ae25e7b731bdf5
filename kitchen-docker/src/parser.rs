use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{DriverError, Result},
    models::{ContainerId, ImageId},
};

static IMAGE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Successfully built ([a-z0-9]{12})$").unwrap());

static CONTAINER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^a-z0-9])([a-z0-9]{64})$").unwrap());

/// Last line of `output` once trailing newlines are gone.
fn last_line(output: &str) -> &str {
    let output = output.trim_end_matches(|c: char| c == '\n' || c == '\r');
    output.rsplit('\n').next().unwrap_or(output)
}

fn capture<'a>(pattern: &Regex, output: &'a str) -> Option<&'a str> {
    pattern
        .captures(last_line(output))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

pub fn parse_image_id(output: &str) -> Result<ImageId> {
    capture(&IMAGE_ID, output)
        .map(|id| ImageId(id.to_owned()))
        .ok_or_else(|| DriverError::action_failed("Could not parse IMAGE ID."))
}

pub fn parse_container_id(output: &str) -> Result<ContainerId> {
    capture(&CONTAINER_ID, output)
        .map(|id| ContainerId(id.to_owned()))
        .ok_or_else(|| DriverError::action_failed("Could not parse CONTAINER ID."))
}
