use std::{fmt, io::Error as IoError, process::Stdio, time::Duration};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command as TokioCommand;

use crate::output::OutputMode;

#[derive(Debug)]
pub enum CommandError {
    Spawn { command: String, error: IoError },
    Io(IoError),
    Timeout { command: String },
    Exit { command: String, code: Option<i32> },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Spawn { command, error } => {
                write!(f, "Failed to start [{}]: {}", command, error)
            }
            CommandError::Io(e) => write!(f, "Command execution error: {}", e),
            CommandError::Timeout { command } => write!(f, "Command [{}] timed out", command),
            CommandError::Exit {
                command,
                code: Some(code),
            } => write!(f, "Command [{}] failed with exit code {}", command, code),
            CommandError::Exit {
                command,
                code: None,
            } => write!(f, "Command [{}] was terminated by a signal", command),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Spawn { error, .. } => Some(error),
            CommandError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Captured result of a finished external tool.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub command: String,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn into_result(self) -> Result<CommandOutput, CommandError> {
        if self.success() {
            Ok(self)
        } else {
            Err(CommandError::Exit {
                command: self.command,
                code: self.code,
            })
        }
    }

    /// Writes captured output to the terminal, stdout first.
    pub fn replay(&self) {
        if !self.stdout.is_empty() {
            print!("{}", self.stdout);
        }
        if !self.stderr.is_empty() {
            eprint!("{}", self.stderr);
        }
    }
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a tool and fails on a non-zero exit. In stream mode output is forwarded live,
/// in group mode it is printed as one block once the tool exits.
pub async fn run(
    program: &str,
    args: &[String],
    mode: &OutputMode,
    timeout: Option<Duration>,
) -> Result<(), CommandError> {
    let stream_output = matches!(mode, OutputMode::Stream);
    let output = run_command_with_timeout(program, args, timeout, stream_output).await?;

    if !stream_output {
        output.replay();
    }

    output.into_result().map(|_| ())
}

/// Runs a tool with its output captured. The exit status is left to the caller.
pub async fn run_capture(program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
    run_command_with_timeout(program, args, None, false).await
}

pub async fn run_command_with_timeout(
    program: &str,
    args: &[String],
    timeout: Option<Duration>,
    stream_output: bool,
) -> Result<CommandOutput, CommandError> {
    let command = command_line(program, args);

    let mut cmd = TokioCommand::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null());

    let mut child = cmd.spawn().map_err(|error| CommandError::Spawn {
        command: command.clone(),
        error,
    })?;

    let stdout_handle = tokio::spawn(drain(
        child.stdout.take(),
        tokio::io::stdout(),
        stream_output,
    ));
    let stderr_handle = tokio::spawn(drain(
        child.stderr.take(),
        tokio::io::stderr(),
        stream_output,
    ));

    let status = match timeout {
        Some(duration) => {
            tokio::select! {
                result = child.wait() => result.map_err(CommandError::Io)?,
                _ = tokio::time::sleep(duration) => {
                    if let Err(kill_err) = child.kill().await {
                        eprintln!("Warning: Failed to kill timed-out process: {}", kill_err);
                    }
                    let _ = child.wait().await;
                    return Err(CommandError::Timeout { command });
                }
            }
        }
        None => child.wait().await.map_err(CommandError::Io)?,
    };

    let stdout = join_pipe(stdout_handle).await?;
    let stderr = join_pipe(stderr_handle).await?;

    Ok(CommandOutput {
        command,
        code: status.code(),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

async fn drain<R, W>(
    pipe: Option<R>,
    mut sink: W,
    stream_output: bool,
) -> Result<Vec<u8>, CommandError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut collected: Vec<u8> = Vec::new();
    if let Some(mut pipe) = pipe {
        let mut buf = [0u8; 8192];
        loop {
            let n = pipe.read(&mut buf).await.map_err(CommandError::Io)?;
            if n == 0 {
                break;
            }
            collected.extend_from_slice(&buf[..n]);
            if stream_output {
                sink.write_all(&buf[..n]).await.map_err(CommandError::Io)?;
            }
        }
        if stream_output {
            sink.flush().await.map_err(CommandError::Io)?;
        }
    }
    Ok(collected)
}

async fn join_pipe(
    handle: tokio::task::JoinHandle<Result<Vec<u8>, CommandError>>,
) -> Result<Vec<u8>, CommandError> {
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(CommandError::Io(IoError::other(e))),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn capture_collects_both_streams_and_exit_code() {
        let output = run_capture("sh", &args(&["-c", "echo out; echo err >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.command, "sh -c echo out; echo err >&2; exit 3");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn run_reports_command_line_and_code_on_failure() {
        let err = run("sh", &args(&["-c", "exit 7"]), &OutputMode::Group, None)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Command [sh -c exit 7] failed with exit code 7"
        );
    }

    #[tokio::test]
    async fn run_succeeds_on_zero_exit() {
        run("true", &[], &OutputMode::Stream, None).await.unwrap();
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = run_capture("definitely-not-a-real-tool-4242", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let err = run_command_with_timeout(
            "sleep",
            &args(&["5"]),
            Some(Duration::from_millis(100)),
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CommandError::Timeout { .. }));
    }
}
