use std::{
    future::Future,
    path::{Path, PathBuf},
};

use crate::error::Result;
use crate::process::{CommandError, CommandOutput, run_capture};

/// Emitted by the compose tool when the component never calls the stub's interface.
const UNUSED_STUB_PREFIX: &str = "Error: no dependencies of component";
const UNUSED_STUB_SUFFIX: &str = "were found";

/// Links one stub into a component, producing `dest_wasm`.
pub trait StubComposer {
    fn compose(
        &self,
        source_wasm: &Path,
        stub_wasm: &Path,
        dest_wasm: &Path,
    ) -> impl Future<Output = std::result::Result<CommandOutput, CommandError>>;
}

/// Composes through `<cli> [cli_args..] stubgen compose`.
#[derive(Debug, Clone)]
pub struct CliComposer {
    cli: String,
    cli_args: Vec<String>,
}

impl CliComposer {
    pub fn new(cli: impl Into<String>, cli_args: Vec<String>) -> Self {
        Self {
            cli: cli.into(),
            cli_args,
        }
    }
}

impl StubComposer for CliComposer {
    async fn compose(
        &self,
        source_wasm: &Path,
        stub_wasm: &Path,
        dest_wasm: &Path,
    ) -> std::result::Result<CommandOutput, CommandError> {
        let mut args = self.cli_args.clone();
        args.extend([
            "stubgen".to_string(),
            "compose".to_string(),
            "--source-wasm".to_string(),
            source_wasm.to_string_lossy().to_string(),
            "--stub-wasm".to_string(),
            stub_wasm.to_string_lossy().to_string(),
            "--dest-wasm".to_string(),
            dest_wasm.to_string_lossy().to_string(),
        ]);
        run_capture(&self.cli, &args).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubInput {
    pub dependency: String,
    pub wasm: PathBuf,
}

impl StubInput {
    /// Last path segment of the dependency name, used for intermediate file names.
    fn file_stem(&self) -> &str {
        Path::new(&self.dependency)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.dependency)
    }
}

pub fn is_unused_stub(stderr: &str) -> bool {
    stderr.contains(UNUSED_STUB_PREFIX) && stderr.contains(UNUSED_STUB_SUFFIX)
}

/// Folds `stubs` into `component_wasm` one at a time, in order. Step `i` writes
/// `compose-<i>-<dependency>.wasm` into `work_dir` and feeds it to the next step.
///
/// A stub the component does not use is skipped and the previous artifact carries on.
/// Any other failure replays the tool's output and aborts. Returns the last artifact,
/// which is `component_wasm` itself when nothing was composed.
pub async fn compose_stubs<C: StubComposer>(
    composer: &C,
    component_wasm: &Path,
    stubs: &[StubInput],
    work_dir: &Path,
) -> Result<PathBuf> {
    let mut composed = component_wasm.to_path_buf();

    for (i, stub) in stubs.iter().enumerate() {
        let dest = work_dir.join(format!("compose-{}-{}.wasm", i + 1, stub.file_stem()));

        let output = composer.compose(&composed, &stub.wasm, &dest).await?;
        if output.success() {
            composed = dest;
            continue;
        }

        if is_unused_stub(&output.stderr) {
            println!("Skipping composing {}, not used", stub.wasm.display());
            continue;
        }

        output.replay();
        return Err(CommandError::Exit {
            command: output.command,
            code: output.code,
        }
        .into());
    }

    Ok(composed)
}
