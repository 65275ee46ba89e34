//! Command execution.
//!
//! Commands come from the panel document as plain strings. Simple ones
//! (`brightnessctl get`) are split into an argv and executed directly; anything
//! using shell syntax goes through `sh -c`. Reads run asynchronously with a
//! timeout and report back on the main loop. User actions are launched
//! detached and never waited on.

use std::{
    io,
    os::unix::process::CommandExt as _,
    process::{Command as StdCommand, Stdio},
    result::Result as StdResult,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{process::Command, runtime::Handle, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{Error, Result, UiHandle};

/// Characters that force a command through the shell. Quotes are absent on
/// purpose: the argv splitter understands them.
pub const SHELL_METACHARACTERS: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '*', '?', '#', '~', '!', '[', ']', '{', '}',
    '=', '\n',
];

/// Title used for terminal windows when the item has none.
const FALLBACK_TITLE: &str = "Panel Terminal";

/// How a command string will be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Exec the argv directly.
    Direct(Vec<String>),
    /// Run through `sh -c`.
    Shell(String),
}

impl Invocation {
    /// Decide how to run `command`.
    pub fn plan(command: &str) -> Self {
        if command.contains(SHELL_METACHARACTERS) {
            return Self::Shell(command.to_string());
        }
        match shlex::split(command) {
            Some(argv) if !argv.is_empty() => Self::Direct(argv),
            _ => Self::Shell(command.to_string()),
        }
    }

    /// Whether this invocation avoids the shell.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// Full argv including the shell wrapper when needed.
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Direct(argv) => argv.clone(),
            Self::Shell(cmd) => vec!["sh".to_string(), "-c".to_string(), cmd.clone()],
        }
    }
}

/// Why a command produced no usable output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The process could not be started.
    #[error("spawn failed: {0}")]
    Spawn(String),
    /// The process outlived its timeout and was killed.
    #[error("timed out")]
    Timeout,
    /// The process exited unsuccessfully.
    #[error("exited with status {0:?}")]
    Exit(Option<i32>),
    /// The process succeeded but printed nothing.
    #[error("no output")]
    Empty,
    /// A file read in place of a command failed.
    #[error("read failed: {0}")]
    Read(String),
}

/// Process boundary used by the engine.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and return trimmed stdout. Dropping the future must
    /// kill the process.
    async fn output(&self, invocation: &Invocation) -> StdResult<String, Failure>;

    /// Start `argv` detached from the panel and return immediately.
    fn spawn_detached(&self, argv: &[String]) -> io::Result<()>;
}

/// [`CommandRunner`] backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn output(&self, invocation: &Invocation) -> StdResult<String, Failure> {
        let argv = invocation.argv();
        let Some((program, args)) = argv.split_first() else {
            return Err(Failure::Empty);
        };
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Failure::Spawn(e.to_string()))?;
        if !out.status.success() {
            return Err(Failure::Exit(out.status.code()));
        }
        let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if text.is_empty() {
            Err(Failure::Empty)
        } else {
            Ok(text)
        }
    }

    fn spawn_detached(&self, argv: &[String]) -> io::Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty argv"));
        };
        let mut child = StdCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()?;
        // Reap in the background so finished launches don't linger as zombies.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Cancels one asynchronous invocation. Cloning shares the same invocation.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    /// Unique per invocation.
    id: u64,
    /// Cancelled at most once.
    token: CancellationToken,
}

impl CancelHandle {
    /// Suppress the completion callback and kill the process. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether both handles refer to the same invocation.
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Launcher prefix and terminal wrapper for user actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Prepended to every launched argv.
    pub launcher: Vec<String>,
    /// Terminal command; `{title}` is replaced with the sanitized title.
    pub terminal: Vec<String>,
}

impl LaunchConfig {
    /// Build the argv for a user action.
    pub fn argv_for(&self, command: &str, title: &str, terminal: bool) -> Result<Vec<String>> {
        let command = command.trim();
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }
        let mut argv = self.launcher.clone();
        if terminal {
            let title = sanitize_title(title);
            argv.extend(self.terminal.iter().map(|a| a.replace("{title}", &title)));
            argv.extend(["sh".to_string(), "-c".to_string(), command.to_string()]);
        } else {
            argv.extend(Invocation::plan(command).argv());
        }
        Ok(argv)
    }
}

/// Collapse control characters and runs of whitespace into single spaces.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        joined
    }
}

/// Runs commands off the main loop and reports results back onto it.
#[derive(Clone)]
pub struct Executor {
    /// Process boundary.
    runner: Arc<dyn CommandRunner>,
    /// Where completions run.
    ui: UiHandle,
    /// Runtime invocations are spawned on.
    rt: Handle,
    /// Source of [`CancelHandle`] ids.
    next_id: Arc<AtomicU64>,
    /// Launch settings for user actions.
    launch: Arc<LaunchConfig>,
}

impl Executor {
    /// Create an executor bound to the current tokio runtime.
    pub fn new(runner: Arc<dyn CommandRunner>, ui: UiHandle, launch: LaunchConfig) -> Result<Self> {
        let rt = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self {
            runner,
            ui,
            rt,
            next_id: Arc::new(AtomicU64::new(1)),
            launch: Arc::new(launch),
        })
    }

    /// Allocate a handle for an invocation started with [`run_with`](Self::run_with).
    pub fn new_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        }
    }

    /// Run `command` and deliver the result to `on_complete` on the main loop.
    ///
    /// A zero `timeout` disables the timeout.
    pub fn run_async<F>(&self, command: &str, timeout: Duration, on_complete: F) -> CancelHandle
    where
        F: FnOnce(StdResult<String, Failure>) + Send + 'static,
    {
        let handle = self.new_handle();
        self.run_with(&handle, command, timeout, on_complete);
        handle
    }

    /// Like [`run_async`](Self::run_async) with a caller-allocated handle.
    pub fn run_with<F>(&self, handle: &CancelHandle, command: &str, timeout: Duration, on_complete: F)
    where
        F: FnOnce(StdResult<String, Failure>) + Send + 'static,
    {
        let invocation = Invocation::plan(command);
        trace!(command = %command, direct = invocation.is_direct(), "exec_start");
        let token = handle.token.clone();
        let runner = self.runner.clone();
        let ui = self.ui.clone();
        let command = command.to_string();

        self.rt.spawn(async move {
            let run = async {
                if timeout.is_zero() {
                    runner.output(&invocation).await
                } else {
                    time::timeout(timeout, runner.output(&invocation))
                        .await
                        .unwrap_or(Err(Failure::Timeout))
                }
            };
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!(command = %command, "exec_cancelled");
                    return;
                }
                r = run => r,
            };
            if let Err(failure) = &result {
                debug!(command = %command, error = %failure, "command failed");
            }
            let delivered = ui.invoke(move || {
                if !token.is_cancelled() {
                    on_complete(result);
                }
            });
            if delivered.is_err() {
                trace!("exec_result_dropped_main_loop_gone");
            }
        });
    }

    /// Launch a user action detached from the panel.
    pub fn launch(&self, command: &str, title: &str, terminal: bool) -> Result<()> {
        let argv = self.launch.argv_for(command, title, terminal)?;
        debug!(?argv, "launch");
        self.runner.spawn_detached(&argv)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::sync::oneshot;

    use super::*;
    use crate::MainLoop;

    /// Run `command` through `exec` and wait for its completion callback.
    async fn output(exec: &Executor, command: &str, timeout: Duration) -> StdResult<String, Failure> {
        let (tx, rx) = oneshot::channel();
        exec.run_async(command, timeout, move |r| {
            let _ = tx.send(r);
        });
        rx.await.unwrap()
    }

    #[test]
    fn simple_commands_run_directly() {
        assert_eq!(
            Invocation::plan("brightnessctl get"),
            Invocation::Direct(vec!["brightnessctl".into(), "get".into()])
        );
        assert_eq!(
            Invocation::plan("notify-send 'two words'"),
            Invocation::Direct(vec!["notify-send".into(), "two words".into()])
        );
    }

    #[test]
    fn shell_syntax_uses_shell() {
        for cmd in [
            "cat /a | grep b",
            "echo $HOME",
            "ls ~/x",
            "a && b",
            "FOO=1 run",
            "echo *.txt",
            "one\ntwo",
        ] {
            assert_eq!(Invocation::plan(cmd), Invocation::Shell(cmd.into()), "{cmd}");
        }
    }

    #[test]
    fn malformed_or_empty_falls_back_to_shell() {
        assert!(!Invocation::plan("echo 'unterminated").is_direct());
        assert_eq!(
            Invocation::plan("   ").argv(),
            vec!["sh".to_string(), "-c".to_string(), "   ".to_string()]
        );
    }

    #[test]
    fn launch_argv_wraps_terminal_and_launcher() {
        let cfg = LaunchConfig {
            launcher: vec!["uwsm-app".into(), "--".into()],
            terminal: vec!["kitty".into(), "--title".into(), "{title}".into(), "--hold".into()],
        };
        assert_eq!(
            cfg.argv_for("htop", "System\tMonitor\n", true).unwrap(),
            vec!["uwsm-app", "--", "kitty", "--title", "System Monitor", "--hold", "sh", "-c", "htop"]
        );
        assert_eq!(
            cfg.argv_for(" pavucontrol ", "Audio", false).unwrap(),
            vec!["uwsm-app", "--", "pavucontrol"]
        );
        assert_eq!(
            cfg.argv_for("a | b", "x", false).unwrap(),
            vec!["uwsm-app", "--", "sh", "-c", "a | b"]
        );
        assert!(matches!(cfg.argv_for("  ", "x", false), Err(Error::EmptyCommand)));
    }

    #[test]
    fn titles_are_sanitized() {
        assert_eq!(sanitize_title("  a \x07 b  "), "a b");
        assert_eq!(sanitize_title("\n"), FALLBACK_TITLE);
    }

    #[test]
    fn cancel_handles_compare_by_identity() {
        let a = CancelHandle {
            id: 1,
            token: CancellationToken::new(),
        };
        let b = a.clone();
        let c = CancelHandle {
            id: 2,
            token: CancellationToken::new(),
        };
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
        b.cancel();
        b.cancel();
        assert!(a.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn real_processes_report_output_and_failures() {
        let main_loop = MainLoop::new();
        let ui = main_loop.handle();
        tokio::spawn(main_loop.run());
        let exec = Executor::new(Arc::new(ProcessRunner), ui, LaunchConfig::default()).unwrap();
        let limit = Duration::from_secs(10);

        assert_eq!(
            output(&exec, r"printf '  hi there \n'", limit).await,
            Ok("hi there".to_string())
        );
        assert_eq!(output(&exec, "echo oops 1>&2", limit).await, Err(Failure::Empty));
        assert_eq!(output(&exec, "false", limit).await, Err(Failure::Exit(Some(1))));
        assert!(matches!(
            output(&exec, "no-such-binary-for-panel-tests", limit).await,
            Err(Failure::Spawn(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timed_out_processes_are_killed() {
        let main_loop = MainLoop::new();
        let ui = main_loop.handle();
        tokio::spawn(main_loop.run());
        let exec = Executor::new(Arc::new(ProcessRunner), ui, LaunchConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");

        let started = Instant::now();
        let command = format!("sleep 1; touch '{}'", marker.display());
        assert_eq!(
            output(&exec, &command, Duration::from_millis(200)).await,
            Err(Failure::Timeout)
        );
        assert!(started.elapsed() < Duration::from_secs(1));

        time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
