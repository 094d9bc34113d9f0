use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};

use crate::error::{BuildError, Result};
use crate::util::{FileError, copy_file};

const TEMPLATE_SUFFIX: &str = ".template";

/// Converts `comp-name` to `CompName`.
pub fn dash_to_pascal(s: &str) -> String {
    s.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts `comp-name` to `compName`.
pub fn dash_to_camel(s: &str) -> String {
    let pascal = dash_to_pascal(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Placeholder substitutions applied to `.template` files and their names.
#[derive(Debug, Clone)]
pub struct Placeholders {
    replacements: Vec<(&'static str, String)>,
}

impl Placeholders {
    pub fn new(package_namespace: &str, component_name: &str) -> Self {
        Self {
            replacements: vec![
                ("pck-ns", package_namespace.to_string()),
                ("PckNs", dash_to_pascal(package_namespace)),
                ("comp-name", component_name.to_string()),
                ("componentName", dash_to_camel(component_name)),
                ("CompName", dash_to_pascal(component_name)),
            ],
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.replacements
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
    }
}

/// Instantiates `template_dir` into `target_dir`, which must not exist yet.
///
/// Every file and directory name goes through `placeholders`. Files named `*.template`
/// also lose the suffix and get their contents substituted, everything else is copied
/// verbatim.
pub fn instantiate(
    template_dir: &Path,
    target_dir: &Path,
    placeholders: &Placeholders,
) -> Result<()> {
    if target_dir.exists() {
        return Err(BuildError::Usage(format!(
            "{} already exists!",
            target_dir.display()
        )));
    }
    if !template_dir.is_dir() {
        return Err(BuildError::Config(format!(
            "template directory '{}' not found",
            template_dir.display()
        )));
    }

    println!("Creating directory {}", target_dir.display());
    fs::create_dir_all(target_dir)?;

    for entry in template_entries(template_dir)? {
        let relative = entry
            .strip_prefix(template_dir)
            .map_err(|e| BuildError::Io(std::io::Error::other(e)))?;

        let relative = placeholders.apply(&relative.to_string_lossy());

        if entry.is_dir() {
            let target = target_dir.join(&relative);
            println!("Creating directory {}", target.display());
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(stripped) = relative.strip_suffix(TEMPLATE_SUFFIX) {
            let target = target_dir.join(stripped);
            println!("Generating {} from {}", target.display(), entry.display());

            let contents = fs::read_to_string(&entry)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, placeholders.apply(&contents))?;
            continue;
        }

        let target = target_dir.join(&relative);
        println!("Copying {} to {}", entry.display(), target.display());
        copy_file(&entry, &target)?;
    }

    Ok(())
}

fn template_entries(template_dir: &Path) -> std::result::Result<Vec<PathBuf>, FileError> {
    let pattern = format!("{}/**/*", Pattern::escape(&template_dir.to_string_lossy()));
    let mut entries = glob(&pattern)?.collect::<std::result::Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}
