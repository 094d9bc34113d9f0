use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::compose::{CliComposer, StubComposer, StubInput, compose_stubs};
use crate::config::{ComponentLayout, Project, Step, substitute_variables};
use crate::error::{BuildError, Result};
use crate::process;
use crate::task::{
    Task, TaskOutcome, TaskRunner, all_dependencies, report_unknown_dependencies,
    stub_dependency_pairs,
};
use crate::template::{Placeholders, instantiate};
use crate::util::{copy_file, remove_path};

fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// The project's build commands, run strictly one step at a time.
pub struct Pipeline<'a> {
    project: &'a Project,
    runner: TaskRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            runner: TaskRunner::new(project.verbose, project.dry_run),
        }
    }

    pub async fn build_all(&self) -> Result<()> {
        for name in self.project.component_names()? {
            self.build_component(&name).await?;
        }
        Ok(())
    }

    pub async fn build_component(&self, name: &str) -> Result<()> {
        println!("Build component: {}", name);

        let layout = self.project.component(name);
        if !self.project.dry_run {
            fs::create_dir_all(&layout.build_dir)?;
            fs::create_dir_all(self.project.components_out_dir())?;
        }

        for step in &self.project.steps {
            self.run_step(&layout, step).await?;
        }

        self.compose_component(&layout).await?;
        Ok(())
    }

    async fn run_step(&self, layout: &ComponentLayout, step: &Step) -> Result<TaskOutcome> {
        let variables = self.project.component_variables(layout);
        let expand = |text: &String| substitute_variables(text, &variables);

        let task = Task::new(expand(&step.run_message), expand(&step.skip_message))
            .targets(step.targets.iter().map(expand))
            .sources(step.sources.iter().map(expand));
        let command: Vec<String> = step.command.iter().map(expand).collect();

        if self.project.verbose {
            println!(
                "Info: step '{}' for {}: {}",
                step.name,
                layout.name,
                command.join(" ")
            );
        }

        self.runner
            .run(&task, || self.run_tool(&command[0], &command[1..], step.timeout))
            .await
    }

    async fn run_tool(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<()> {
        process::run(program, args, &self.project.output, timeout).await?;
        Ok(())
    }

    async fn run_cli(&self, args: &[String]) -> Result<()> {
        let mut full_args = self.project.cli_args.clone();
        full_args.extend_from_slice(args);
        self.run_tool(&self.project.cli, &full_args, None).await
    }

    pub async fn compose_component(&self, layout: &ComponentLayout) -> Result<TaskOutcome> {
        let stubs: Vec<StubInput> = self
            .project
            .dependencies
            .get(&layout.name)
            .into_iter()
            .flatten()
            .map(|dependency| StubInput {
                dependency: dependency.clone(),
                wasm: self.project.stub(dependency).wasm,
            })
            .collect();

        let stub_list = stubs
            .iter()
            .map(|stub| arg(&stub.wasm))
            .collect::<Vec<_>>()
            .join(", ");
        let task = Task::new(
            format!("Composing [{}] into component: {}", stub_list, layout.name),
            "stub compose",
        )
        .targets([&layout.target_wasm])
        .sources(
            std::iter::once(layout.component_wasm.clone())
                .chain(stubs.iter().map(|stub| stub.wasm.clone())),
        );

        let composer = CliComposer::new(self.project.cli.as_str(), self.project.cli_args.clone());
        self.runner
            .run(&task, || compose_into_target(&composer, layout, &stubs))
            .await
    }

    /// Builds a stub for every component another component calls, then adds those stubs
    /// to the WIT dependencies of their callers.
    pub async fn update_rpc_stubs(&self) -> Result<()> {
        let dependencies = &self.project.dependencies;
        report_unknown_dependencies(
            dependencies,
            &self.project.component_names()?,
            self.project.verbose,
        );

        for name in all_dependencies(dependencies) {
            self.build_stub_component(&name).await?;
        }

        for (component, dependency) in stub_dependency_pairs(dependencies) {
            self.add_stub_dependency(component, dependency).await?;
        }

        Ok(())
    }

    pub async fn build_stub_component(&self, name: &str) -> Result<TaskOutcome> {
        let source_wit = self.project.component(name).wit_dir;
        let stub = self.project.stub(name);

        let task = Task::new(
            format!("Building stub component for: {}", name),
            "stub component build",
        )
        .targets([&stub.wasm, &stub.wit_dir])
        .sources([&source_wit]);

        let args = vec![
            "stubgen".to_string(),
            "build".to_string(),
            "--source-wit-root".to_string(),
            arg(&source_wit),
            "--dest-wasm".to_string(),
            arg(&stub.wasm),
            "--dest-wit-root".to_string(),
            arg(&stub.wit_dir),
        ];
        self.runner.run(&task, || self.run_cli(&args)).await
    }

    pub async fn add_stub_dependency(
        &self,
        component: &str,
        dependency: &str,
    ) -> Result<TaskOutcome> {
        let stub_wit = self.project.stub(dependency).wit_dir;
        let dest_wit = self.project.component(component).wit_dir;
        let deps_dir = dest_wit.join("deps");
        let ns = &self.project.package_namespace;

        let task = Task::new(
            format!("Adding stub dependency for {} to {}", dependency, component),
            "add stub dependency",
        )
        .targets([
            deps_dir.join(format!("{}_{}", ns, dependency)),
            deps_dir.join(format!("{}_{}-stub", ns, dependency)),
        ])
        .sources([&stub_wit]);

        let args = vec![
            "stubgen".to_string(),
            "add-stub-dependency".to_string(),
            "--overwrite".to_string(),
            "--stub-wit-root".to_string(),
            arg(&stub_wit),
            "--dest-wit-root".to_string(),
            arg(&dest_wit),
        ];
        self.runner.run(&task, || self.run_cli(&args)).await
    }

    pub fn generate_new_component(&self, name: &str) -> Result<()> {
        let target = self.project.component(name).dir;
        let placeholders = Placeholders::new(&self.project.package_namespace, name);
        instantiate(&self.project.template_dir, &target, &placeholders)
    }

    pub async fn deploy_all(&self) -> Result<()> {
        for name in self.project.component_names()? {
            self.deploy_component(&name).await?;
        }
        Ok(())
    }

    pub async fn deploy_component(&self, name: &str) -> Result<()> {
        let wasm = self.project.component(name).target_wasm;
        let task = Task::new(format!("Deploying {}", name), "deploy");

        let args = vec![
            "component".to_string(),
            "add".to_string(),
            "--non-interactive".to_string(),
            "--component-name".to_string(),
            name.to_string(),
            arg(&wasm),
        ];
        self.runner.run(&task, || self.run_cli(&args)).await?;
        Ok(())
    }

    pub async fn test(&self) -> Result<()> {
        let command = self
            .project
            .test_command
            .as_ref()
            .ok_or_else(|| BuildError::Config("no [test] command configured".to_string()))?;

        let task = Task::new(format!("Running tests: {}", command.join(" ")), "tests");
        self.runner
            .run(&task, || self.run_tool(&command[0], &command[1..], None))
            .await?;
        Ok(())
    }

    /// Deletes the output directory and every component's generated bindings.
    pub fn clean(&self) -> Result<()> {
        let mut paths: Vec<PathBuf> = vec![self.project.out_dir.clone()];
        for name in self.project.component_names()? {
            paths.push(self.project.component(&name).binding_dir);
        }

        for path in paths {
            if self.project.dry_run {
                println!("Would delete {}", path.display());
                continue;
            }
            println!("Deleting {}", path.display());
            remove_path(&path)?;
        }

        Ok(())
    }
}

async fn compose_into_target<C: StubComposer>(
    composer: &C,
    layout: &ComponentLayout,
    stubs: &[StubInput],
) -> Result<()> {
    let composed =
        compose_stubs(composer, &layout.component_wasm, stubs, &layout.build_dir).await?;
    copy_file(&composed, &layout.target_wasm)?;
    Ok(())
}
