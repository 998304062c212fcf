//! Running external OS commands with a timeout.
//!
//! Every strategy that needs the OS to do something (empty the recycle bin,
//! stop or start a service) goes through [`CommandRunner`], so tests can swap
//! in a recording fake.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::CleanError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when killed by a signal or on timeout.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

pub trait CommandRunner: Send + Sync {
    /// Run to completion or until `timeout`. `Err` only when the process could
    /// not be started or waited on.
    fn run(&self, command: &CommandSpec, timeout: Duration) -> std::io::Result<CommandOutput>;
}

/// How long to wait for output still buffered in the pipes once the
/// process itself is done.
const PIPE_GRACE: Duration = Duration::from_millis(250);

/// Spawns real processes.
///
/// On unix the child leads its own process group and a timeout kills the
/// whole group. Output is collected off-thread; whatever has not arrived
/// within the deadline is dropped, so a descendant holding the pipes open
/// cannot stretch the call past `timeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec, timeout: Duration) -> std::io::Result<CommandOutput> {
        debug!("running `{}` (timeout {:?})", command.display(), timeout);
        let started = Instant::now();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd.spawn()?;

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let (exit_code, timed_out) = match child.wait_timeout(timeout)? {
            Some(status) => (status.code(), false),
            None => {
                kill_tree(&mut child);
                let _ = child.wait();
                (None, true)
            }
        };

        let grace = if timed_out {
            PIPE_GRACE
        } else {
            timeout.saturating_sub(started.elapsed()).max(PIPE_GRACE)
        };
        let deadline = Instant::now() + grace;
        let collect = |rx: mpsc::Receiver<Vec<u8>>| collect_until(rx, deadline, &command.program);

        Ok(CommandOutput {
            exit_code,
            stdout: collect(stdout),
            stderr: collect(stderr),
            timed_out,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let Some(mut pipe) = pipe else { return };
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Everything the pipe produced before it closed or `deadline` passed.
fn collect_until(rx: mpsc::Receiver<Vec<u8>>, deadline: Instant, program: &str) -> String {
    let mut out = Vec::new();
    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => out.extend_from_slice(&chunk),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                debug!("`{program}` left a pipe open, keeping partial output");
                break;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The child is its own group leader, so its pid is the group id.
    match libc::pid_t::try_from(child.id()) {
        Ok(pgid) => unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        },
        Err(_) => {
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

pub fn empty_recycle_bin() -> CommandSpec {
    CommandSpec::new(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "Clear-RecycleBin -Force -ErrorAction SilentlyContinue",
        ],
    )
}

pub fn stop_service(service: &str) -> CommandSpec {
    CommandSpec::new("net", &["stop", service])
}

pub fn start_service(service: &str) -> CommandSpec {
    CommandSpec::new("net", &["start", service])
}

/// Run a command and treat spawn errors, timeouts and non-zero exits as
/// failures. The command's stderr becomes the error text; `fallback` is used
/// when stderr is empty.
pub fn run_checked(
    runner: &dyn CommandRunner,
    command: &CommandSpec,
    timeout: Duration,
    fallback: &str,
) -> Result<CommandOutput, CleanError> {
    let output = runner
        .run(command, timeout)
        .map_err(|source| CleanError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    if output.timed_out {
        return Err(CleanError::Timeout {
            program: command.display(),
            secs: timeout.as_secs(),
        });
    }
    if !output.success() {
        let message = if output.stderr.trim().is_empty() {
            fallback.to_string()
        } else {
            output.stderr.clone()
        };
        return Err(CleanError::Command(message));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(CommandOutput);

    impl CommandRunner for Canned {
        fn run(&self, _: &CommandSpec, _: Duration) -> std::io::Result<CommandOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn non_zero_exit_uses_stderr_verbatim() {
        let runner = Canned(CommandOutput {
            exit_code: Some(2),
            stderr: "The service is not started.\r\n".to_string(),
            ..Default::default()
        });
        let err = run_checked(&runner, &stop_service("wuauserv"), Duration::from_secs(1), "fallback")
            .unwrap_err();
        assert_eq!(err.to_string(), "The service is not started.\r\n");
    }

    #[test]
    fn empty_stderr_falls_back() {
        let runner = Canned(CommandOutput {
            exit_code: Some(1),
            ..Default::default()
        });
        let err = run_checked(&runner, &empty_recycle_bin(), Duration::from_secs(1), "Failed to empty Recycle Bin")
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to empty Recycle Bin");
    }

    #[test]
    fn timeout_is_a_failure() {
        let runner = Canned(CommandOutput {
            timed_out: true,
            ..Default::default()
        });
        let err = run_checked(&runner, &start_service("wuauserv"), Duration::from_secs(30), "x")
            .unwrap_err();
        assert!(matches!(err, CleanError::Timeout { secs: 30, .. }));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new("reclaim-no-such-program-xyz", &[]);
        let err = run_checked(&SystemRunner, &spec, Duration::from_secs(5), "x").unwrap_err();
        assert!(matches!(err, CleanError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_output_and_exit_code() {
        let spec = CommandSpec::new("sh", &["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.run(&spec, Duration::from_secs(10)).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_kills_on_timeout() {
        let spec = CommandSpec::new("sleep", &["5"]);
        let started = std::time::Instant::now();
        let output = SystemRunner.run(&spec, Duration::from_millis(200)).unwrap();
        assert!(output.timed_out);
        assert_eq!(output.exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_is_not_held_up_by_descendants() {
        // the shell forks `sleep`, which inherits both pipes
        let spec = CommandSpec::new("sh", &["-c", "sleep 6; true"]);
        let started = std::time::Instant::now();
        let output = SystemRunner.run(&spec, Duration::from_millis(200)).unwrap();
        assert!(output.timed_out);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn background_child_does_not_block_a_finished_command() {
        let spec = CommandSpec::new("sh", &["-c", "echo done; sleep 6 &"]);
        let started = std::time::Instant::now();
        let output = SystemRunner.run(&spec, Duration::from_secs(1)).unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert!(!output.timed_out);
        assert_eq!(output.stdout, "done\n");
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
