// src/exec/command.rs

//! Shell commands as workloads and cleanup callbacks.
//!
//! Used by the `graceful` binary: the wrapped command becomes the primary
//! workload and every `--on-shutdown` command becomes a cleanup callback.
//!
//! On unix every command is started as the leader of its own process
//! group and tracked in [`ChildGroups`], so the binary can stop the whole
//! tree (the command plus anything it forked) before it exits, including
//! when the watchdog forces the exit.

use std::collections::HashSet;
use std::process::Stdio;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::exec::cleanup::{Closable, closable};
use crate::host::Terminator;

/// Exit code reported when a command could not be spawned at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Time children get to exit after `SIGTERM` before they are killed.
pub const CHILD_GRACE: Duration = Duration::from_secs(2);

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    let mut c = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };
    supervise(&mut c);
    c
}

/// Command for the wrapped workload.
///
/// A single argument is a shell snippet (`graceful -- 'make && ./run'`);
/// several arguments are executed directly, keeping their quoting.
pub fn workload_command(argv: &[String]) -> Option<Command> {
    match argv {
        [] => None,
        [snippet] => Some(shell_command(snippet)),
        [program, args @ ..] => {
            let mut c = Command::new(program);
            c.args(args);
            supervise(&mut c);
            Some(c)
        }
    }
}

fn supervise(c: &mut Command) {
    c.stdin(Stdio::null()).kill_on_drop(true);
    #[cfg(unix)]
    c.process_group(0);
}

/// Signal used to stop a child process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Terminate,
    Kill,
}

/// Process groups of the commands that are still running.
///
/// Cloning is cheap; all clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ChildGroups {
    inner: Arc<GroupsInner>,
}

#[derive(Debug, Default)]
struct GroupsInner {
    pids: Mutex<HashSet<u32>>,
    changed: Notify,
}

impl ChildGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids().is_empty()
    }

    /// Send `signal` to every tracked group.
    ///
    /// Synchronous, so a [`Terminator`] can call it right before exiting.
    pub fn signal_all(&self, signal: StopSignal) {
        let pids: Vec<u32> = self.pids().iter().copied().collect();
        for pid in pids {
            signal_group(pid, signal);
        }
    }

    /// Ask every remaining group to stop, escalating to a kill after
    /// `grace`, and wait until their leaders have been reaped.
    pub async fn shutdown(&self, grace: Duration) {
        if self.is_empty() {
            return;
        }
        info!(groups = self.len(), "stopping remaining child processes");
        self.signal_all(StopSignal::Terminate);

        if tokio::time::timeout(grace, self.drained()).await.is_ok() {
            return;
        }
        warn!(
            groups = self.len(),
            grace_ms = grace.as_millis() as u64,
            "child processes still running after SIGTERM; killing them"
        );
        self.signal_all(StopSignal::Kill);
        if tokio::time::timeout(grace, self.drained()).await.is_err() {
            error!(groups = self.len(), "child processes could not be reaped");
        }
    }

    /// Resolves once no group is tracked any more.
    async fn drained(&self) {
        loop {
            let notified = self.inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }

    fn track(&self, pid: u32) -> GroupGuard {
        self.pids().insert(pid);
        GroupGuard {
            groups: self.clone(),
            pid,
            reaped: false,
        }
    }

    fn pids(&self) -> MutexGuard<'_, HashSet<u32>> {
        self.inner
            .pids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a group tracked while its leader runs. Dropping it before the
/// leader was reaped (the awaiting task was aborted) kills the group.
struct GroupGuard {
    groups: ChildGroups,
    pid: u32,
    reaped: bool,
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if !self.reaped {
            signal_group(self.pid, StopSignal::Kill);
        }
        self.groups.pids().remove(&self.pid);
        self.groups.inner.changed.notify_waiters();
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: StopSignal) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let sig = match signal {
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Kill => Signal::SIGKILL,
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), sig) {
        Ok(()) => debug!(pid, signal = ?sig, "signalled child process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, signal = ?sig, error = %e, "cannot signal child process group"),
    }
}

#[cfg(not(unix))]
fn signal_group(pid: u32, signal: StopSignal) {
    debug!(pid, ?signal, "process groups are unix-only; relying on kill_on_drop");
}

/// Terminator for the binary: kill every child process group, then exit.
#[derive(Debug, Clone)]
pub struct KillChildrenExit {
    children: ChildGroups,
}

impl KillChildrenExit {
    pub fn new(children: ChildGroups) -> Self {
        Self { children }
    }
}

impl Terminator for KillChildrenExit {
    fn terminate(&self, code: i32) {
        self.children.signal_all(StopSignal::Kill);
        std::process::exit(code);
    }
}

/// Spawn `command`, track its group and wait for it. Returns the exit code
/// (`-1` when killed by a signal).
async fn run_child(mut command: Command, label: &str, children: &ChildGroups) -> Result<i32> {
    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for command '{label}'"))?;
    let mut guard = child.id().map(|pid| children.track(pid));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for command '{label}'"))?;
    if let Some(guard) = guard.as_mut() {
        guard.reaped = true;
    }
    Ok(status.code().unwrap_or(-1))
}

/// Run the shell snippet `cmd` to completion and return its exit code.
pub async fn run_command(cmd: &str, children: &ChildGroups) -> Result<i32> {
    run_child(shell_command(cmd), cmd, children).await
}

/// Primary workload running `argv`; its exit code is stored in `exit_code`.
pub async fn command_workload(argv: Vec<String>, exit_code: Arc<AtomicI32>, children: ChildGroups) {
    let label = argv.join(" ");
    let Some(command) = workload_command(&argv) else {
        return;
    };
    info!(cmd = %label, "starting primary command");
    let code = match run_child(command, &label, &children).await {
        Ok(code) => {
            info!(cmd = %label, exit_code = code, "primary command exited");
            code
        }
        Err(err) => {
            error!(cmd = %label, error = %format!("{err:#}"), "primary command failed");
            SPAWN_FAILURE_CODE
        }
    };
    exit_code.store(code, Ordering::SeqCst);
}

/// Cleanup callback running `cmd`; a non-zero exit is a failure.
pub fn command_closable(cmd: String, children: ChildGroups) -> Closable {
    let cmd = Arc::new(cmd);
    closable(move || {
        let cmd = Arc::clone(&cmd);
        let children = children.clone();
        async move {
            info!(cmd = %cmd, "running shutdown command");
            let code = run_command(&cmd, &children).await?;
            if code != 0 {
                bail!("shutdown command '{cmd}' exited with status {code}");
            }
            Ok::<(), anyhow::Error>(())
        }
    })
}
