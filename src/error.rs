use std::{fmt, path::PathBuf};

use crate::process::CommandError;
use crate::util::FileError;

#[derive(Debug)]
pub enum BuildError {
    Config(String),
    Usage(String),
    MissingSource(PathBuf),
    Io(std::io::Error),
    File(FileError),
    Command(CommandError),
    Parse(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(msg) => write!(f, "Config error: {}", msg),
            BuildError::Usage(msg) => write!(f, "{}", msg),
            BuildError::MissingSource(path) => {
                write!(f, "Source '{}' does not exist", path.display())
            }
            BuildError::Io(err) => write!(f, "IO error: {}", err),
            BuildError::File(err) => write!(f, "File error: {}", err),
            BuildError::Command(err) => write!(f, "Command error: {}", err),
            BuildError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Io(err) => Some(err),
            BuildError::File(err) => Some(err),
            BuildError::Command(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        BuildError::Io(err)
    }
}

impl From<FileError> for BuildError {
    fn from(err: FileError) -> Self {
        BuildError::File(err)
    }
}

impl From<CommandError> for BuildError {
    fn from(err: CommandError) -> Self {
        BuildError::Command(err)
    }
}

impl From<toml::de::Error> for BuildError {
    fn from(err: toml::de::Error) -> Self {
        BuildError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
