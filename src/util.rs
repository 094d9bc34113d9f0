use glob::{GlobError, Pattern, PatternError, glob};
use std::{
    fmt, fs,
    io::Error as IoError,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug)]
pub enum FileError {
    GlobPattern(PatternError),
    GlobExpansion(GlobError),
    Io(IoError),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::GlobPattern(e) => write!(f, "Invalid glob pattern: {}", e),
            FileError::GlobExpansion(e) => write!(f, "Failed to expand glob: {}", e),
            FileError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::GlobPattern(e) => Some(e),
            FileError::GlobExpansion(e) => Some(e),
            FileError::Io(e) => Some(e),
        }
    }
}

impl From<PatternError> for FileError {
    fn from(err: PatternError) -> Self {
        FileError::GlobPattern(err)
    }
}

impl From<GlobError> for FileError {
    fn from(err: GlobError) -> Self {
        FileError::GlobExpansion(err)
    }
}

impl From<IoError> for FileError {
    fn from(err: IoError) -> Self {
        FileError::Io(err)
    }
}

/// Parses a step timeout such as `"30s"` or `"1h30m"`. `"0"` and `""` mean no timeout.
pub fn parse_timeout(timeout: &str) -> Result<Option<Duration>, String> {
    if timeout == "0" || timeout.is_empty() {
        return Ok(None);
    }

    timeout
        .parse::<humantime::Duration>()
        .map(|duration| Some(duration.into()))
        .map_err(|e| {
            format!(
                "invalid timeout '{}': {} (use a duration like '5m', '30s', '1h30m')",
                timeout, e
            )
        })
}

/// Every non-directory entry below `dir`, at any depth.
pub fn nested_files(dir: &Path) -> Result<Vec<PathBuf>, FileError> {
    let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));

    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry?;
        if !fs::metadata(&path)?.is_dir() {
            files.push(path);
        }
    }

    Ok(files)
}

pub fn copy_file(from: &Path, to: &Path) -> Result<(), FileError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

/// Removes a file or a directory tree. A path that does not exist is not an error.
pub fn remove_path(path: &Path) -> Result<(), FileError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }

    Ok(())
}
