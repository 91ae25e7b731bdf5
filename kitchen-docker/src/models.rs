use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{fmt, path::PathBuf};

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageId(pub String);

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiers of a single sandbox, carried between lifecycle calls.
///
/// Both fields are filled in by `create` and left untouched afterwards,
/// `destroy` reads them but does not clear them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<ContainerId>,
}

/// Effective driver configuration, resolved once per session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    pub binary: String,
    pub use_sudo: bool,
    pub socket: Option<String>,
    pub no_cache: bool,
    pub command: String,
    pub privileged: bool,
    pub image: String,
    pub platform: String,
    pub container_name: Option<String>,
    pub publish_all: bool,
    pub memory_limit: Option<String>,
    pub cpu_shares: Option<String>,
    pub publish: Vec<String>,
    pub volume: Vec<String>,
    pub link: Vec<String>,
    pub dockerfile: Option<PathBuf>,
    pub run_command: Vec<String>,
    /// Build-time variables, kept in the order they were given.
    pub environment: Vec<(String, String)>,
    pub remove_images: bool,
}

/// Options handed to a [`CommandRunner`](crate::services::CommandRunner)
/// together with a command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Written to the process' standard input.
    pub input: Option<String>,
    /// Attach the process to the calling terminal instead of capturing it.
    pub tty: bool,
}

impl RunOptions {
    pub fn tty() -> RunOptions {
        RunOptions {
            input: None,
            tty: true,
        }
    }

    pub fn input<S: Into<String>>(input: S) -> RunOptions {
        RunOptions {
            input: Some(input.into()),
            tty: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOptions {
    pub tty: bool,
    pub interactive: bool,
}

/// A program and its arguments, meant to be executed directly rather than
/// through a shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Either a mapping or a list of `KEY=value` strings. Both keep the order
/// they were written in.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MapList {
    Map(Mapping),
    List(Vec<String>),
}

impl Default for MapList {
    fn default() -> Self {
        MapList::List(Vec::new())
    }
}

impl MapList {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            MapList::Map(map) => map
                .into_iter()
                .map(|(key, value)| (scalar(key), scalar(value)))
                .collect(),
            MapList::List(list) => list.into_iter().map(MapList::split_value).collect(),
        }
    }

    fn split_value(value: String) -> (String, String) {
        match value.find('=') {
            Some(index) => {
                let (key, value) = value.split_at(index);
                (key.to_owned(), value[1..].to_owned())
            }
            None => (value, String::new()),
        }
    }
}

/// Text of a YAML scalar, so `PORT: 8080` reads the same as `PORT: "8080"`.
fn scalar(value: Value) -> String {
    match value {
        Value::String(value) => value,
        Value::Number(value) => value.to_string(),
        Value::Bool(value) => value.to_string(),
        Value::Null => String::new(),
        value => serde_yaml::to_string(&value)
            .map(|yaml| yaml.trim_start_matches("---").trim().to_owned())
            .unwrap_or_default(),
    }
}
