use std::{
    collections::HashMap,
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::{BuildError, Result};
use crate::output::OutputMode;
use crate::task::Dependencies;
use crate::util::parse_timeout;

static VARIABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)\b")
        .expect("variable pattern is a valid regex")
});

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    project: ProjectSection,
    #[serde(default)]
    dependencies: Dependencies,
    #[serde(default)]
    variables: HashMap<String, String>,
    #[serde(default, rename = "step")]
    steps: Vec<StepSection>,
    test: Option<TestSection>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ProjectSection {
    package_namespace: String,
    out_dir: String,
    components_dir: String,
    lib_dir: String,
    generated_dir: String,
    template_dir: String,
    cli: String,
    cli_args: Vec<String>,
    output: Option<OutputMode>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            package_namespace: "pack-ns".to_string(),
            out_dir: "out".to_string(),
            components_dir: "components".to_string(),
            lib_dir: "lib".to_string(),
            generated_dir: "binding".to_string(),
            template_dir: "component-template/component".to_string(),
            cli: "golem-cli".to_string(),
            cli_args: Vec::new(),
            output: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StepSection {
    name: String,
    run_message: Option<String>,
    skip_message: Option<String>,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    sources: Vec<String>,
    command: Vec<String>,
    timeout: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TestSection {
    command: Vec<String>,
}

/// A per-component build step. Every string is a template expanded with the component's
/// variables before the step runs.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub run_message: String,
    pub skip_message: String,
    pub targets: Vec<String>,
    pub sources: Vec<String>,
    pub command: Vec<String>,
    pub timeout: Option<Duration>,
}

/// Everything the commands need, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Project {
    pub package_namespace: String,
    pub out_dir: PathBuf,
    pub components_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub generated_dir: String,
    pub template_dir: PathBuf,
    pub cli: String,
    /// Arguments placed before every platform CLI invocation, e.g. `cli = "npx"` with
    /// `cli_args = ["golem-cli"]`.
    pub cli_args: Vec<String>,
    pub dependencies: Dependencies,
    pub variables: HashMap<String, String>,
    pub steps: Vec<Step>,
    pub test_command: Option<Vec<String>>,
    pub output: OutputMode,
    pub verbose: bool,
    pub dry_run: bool,
}

/// Paths of one component's sources and build products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLayout {
    pub name: String,
    pub dir: PathBuf,
    pub wit_dir: PathBuf,
    pub binding_dir: PathBuf,
    pub build_dir: PathBuf,
    pub component_wasm: PathBuf,
    pub target_wasm: PathBuf,
}

/// Paths of the RPC stub generated for a component other components call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubLayout {
    pub dir: PathBuf,
    pub wasm: PathBuf,
    pub wit_dir: PathBuf,
}

pub fn load_project(config_path: &str) -> Result<Project> {
    let contents = fs::read_to_string(config_path).map_err(|e| {
        BuildError::Config(format!("failed to read {}: {}", config_path, e))
    })?;
    let root = Path::new(config_path)
        .parent()
        .unwrap_or_else(|| Path::new(""));
    parse_project(&contents, root)
}

/// Parses project file contents. Relative directories are resolved against `root`.
pub fn parse_project(contents: &str, root: &Path) -> Result<Project> {
    let config: ConfigFile = toml::from_str(contents)?;
    process_config(config, root)
}

fn process_config(config: ConfigFile, root: &Path) -> Result<Project> {
    let section = config.project;

    let mut variables = config.variables;
    add_builtin_variables(&mut variables);

    let steps = config
        .steps
        .into_iter()
        .map(build_step)
        .collect::<Result<Vec<_>>>()?;

    let test_command = match config.test {
        Some(test) if test.command.is_empty() => {
            return Err(BuildError::Config(
                "[test] command must not be empty".to_string(),
            ));
        }
        Some(test) => Some(test.command),
        None => None,
    };

    Ok(Project {
        package_namespace: section.package_namespace,
        out_dir: root.join(section.out_dir),
        components_dir: root.join(section.components_dir),
        lib_dir: root.join(section.lib_dir),
        generated_dir: section.generated_dir,
        template_dir: root.join(section.template_dir),
        cli: section.cli,
        cli_args: section.cli_args,
        dependencies: config.dependencies,
        variables,
        steps,
        test_command,
        output: section.output.unwrap_or_default(),
        verbose: false,
        dry_run: false,
    })
}

fn build_step(step: StepSection) -> Result<Step> {
    if step.command.is_empty() {
        return Err(BuildError::Config(format!(
            "step '{}' has an empty command",
            step.name
        )));
    }

    let timeout = match step.timeout.as_deref() {
        Some(timeout) => parse_timeout(timeout)
            .map_err(|e| BuildError::Config(format!("step '{}': {}", step.name, e)))?,
        None => None,
    };

    Ok(Step {
        run_message: step
            .run_message
            .unwrap_or_else(|| format!("Running {} for ${{component}}", step.name)),
        skip_message: step.skip_message.unwrap_or_else(|| step.name.clone()),
        name: step.name,
        targets: step.targets,
        sources: step.sources,
        command: step.command,
        timeout,
    })
}

fn add_builtin_variables(variables: &mut HashMap<String, String>) {
    for (key, value) in env::vars() {
        variables.insert(format!("ENV_{}", key), value);
    }

    if let Ok(pwd) = env::current_dir() {
        variables.insert("PWD".to_string(), pwd.to_string_lossy().to_string());
    }
}

/// Replaces `${NAME}` and `$NAME` with known variables. Unknown references are kept as is.
pub fn substitute_variables(text: &str, variables: &HashMap<String, String>) -> String {
    VARIABLE_REGEX
        .replace_all(text, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

impl Project {
    /// Directories found in the components directory, sorted. A missing components
    /// directory means there are no components.
    pub fn component_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.components_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn component(&self, name: &str) -> ComponentLayout {
        let dir = self.components_dir.join(name);
        let build_dir = self.out_dir.join("build").join(name);
        ComponentLayout {
            name: name.to_string(),
            wit_dir: dir.join("wit"),
            binding_dir: dir.join(&self.generated_dir),
            component_wasm: build_dir.join("component.wasm"),
            target_wasm: self.components_out_dir().join(format!("{}.wasm", name)),
            build_dir,
            dir,
        }
    }

    pub fn stub(&self, name: &str) -> StubLayout {
        let dir = self.out_dir.join("stub").join(name);
        StubLayout {
            wasm: dir.join("stub.wasm"),
            wit_dir: dir.join("wit"),
            dir,
        }
    }

    pub fn components_out_dir(&self) -> PathBuf {
        self.out_dir.join("components")
    }

    /// User and built-in variables plus the paths of `component`.
    pub fn component_variables(&self, component: &ComponentLayout) -> HashMap<String, String> {
        let mut variables = self.variables.clone();
        let path = |p: &Path| p.to_string_lossy().to_string();

        variables.insert("component".to_string(), component.name.clone());
        variables.insert("component_dir".to_string(), path(&component.dir));
        variables.insert("wit_dir".to_string(), path(&component.wit_dir));
        variables.insert("binding_dir".to_string(), path(&component.binding_dir));
        variables.insert("build_dir".to_string(), path(&component.build_dir));
        variables.insert("component_wasm".to_string(), path(&component.component_wasm));
        variables.insert(
            "components_out_dir".to_string(),
            path(&self.components_out_dir()),
        );
        variables.insert("components_dir".to_string(), path(&self.components_dir));
        variables.insert("lib_dir".to_string(), path(&self.lib_dir));
        variables.insert("out_dir".to_string(), path(&self.out_dir));
        variables.insert(
            "package_namespace".to_string(),
            self.package_namespace.clone(),
        );
        variables
    }
}
