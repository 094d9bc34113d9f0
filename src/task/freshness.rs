use std::{
    fs::{self, Metadata},
    io::ErrorKind,
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::error::{BuildError, Result};
use crate::util::nested_files;

/// The point in time a target was last brought up to date. A directory target takes the
/// oldest modification time of the files inside it; an empty one never goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watermark {
    At(SystemTime),
    Unbounded,
}

impl Watermark {
    fn lower_to(self, mtime: SystemTime) -> Self {
        match self {
            Watermark::At(current) if current <= mtime => self,
            _ => Watermark::At(mtime),
        }
    }

    /// Equal timestamps count as up to date.
    pub fn is_older_than(&self, mtime: SystemTime) -> bool {
        match self {
            Watermark::At(watermark) => mtime > *watermark,
            Watermark::Unbounded => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    NoTargets,
    MissingTarget(PathBuf),
    NewerSource { target: PathBuf, source: PathBuf },
    UpToDate,
}

impl Staleness {
    pub fn must_run(&self) -> bool {
        !matches!(self, Staleness::UpToDate)
    }

    pub fn describe(&self) -> String {
        match self {
            Staleness::NoTargets => "no targets, always run".to_string(),
            Staleness::MissingTarget(target) => {
                format!("target '{}' is missing", target.display())
            }
            Staleness::NewerSource { target, source } => format!(
                "source '{}' is newer than target '{}'",
                source.display(),
                target.display()
            ),
            Staleness::UpToDate => "targets up to date".to_string(),
        }
    }
}

/// Decides whether a step with the given targets and sources has to run.
///
/// Targets are visited in order. A missing target decides immediately. Otherwise each
/// source (or every file below a source directory) is compared against the target's
/// watermark and the first newer one decides. A source that does not exist is an error.
pub fn check(targets: &[PathBuf], sources: &[PathBuf]) -> Result<Staleness> {
    if targets.is_empty() {
        return Ok(Staleness::NoTargets);
    }

    for target in targets {
        let metadata = match fs::metadata(target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Staleness::MissingTarget(target.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let watermark = target_watermark(target, &metadata)?;

        for source in sources {
            if let Some(newer) = newer_source(source, watermark)? {
                return Ok(Staleness::NewerSource {
                    target: target.clone(),
                    source: newer,
                });
            }
        }
    }

    Ok(Staleness::UpToDate)
}

pub fn target_watermark(target: &Path, metadata: &Metadata) -> Result<Watermark> {
    if !metadata.is_dir() {
        return Ok(Watermark::At(metadata.modified()?));
    }

    let mut watermark = Watermark::Unbounded;
    for file in nested_files(target)? {
        watermark = watermark.lower_to(fs::metadata(&file)?.modified()?);
    }
    Ok(watermark)
}

fn newer_source(source: &Path, watermark: Watermark) -> Result<Option<PathBuf>> {
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(BuildError::MissingSource(source.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Ok(watermark
            .is_older_than(metadata.modified()?)
            .then(|| source.to_path_buf()));
    }

    for file in nested_files(source)? {
        if watermark.is_older_than(fs::metadata(&file)?.modified()?) {
            return Ok(Some(file));
        }
    }

    Ok(None)
}
