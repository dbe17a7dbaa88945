//! Launching and tearing down the engine process.
//!
//! # Lifecycle
//!
//! ```text
//! start ─► [spawn ─► settle ─► connect ─► handshake tick] × launch_retries
//!             │                    │            │
//!             └── failure ─────────┴────────────┴─► kill process group, retry
//! ```
//!
//! The engine runs in its own process group so that a single signal also
//! reaches any children it forks.  Teardown never fails: a process that is
//! already gone is logged and ignored.

use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use tc_core::EngineParams;

use crate::session::{Connector, ProtocolSession, connect_with_retries};
use crate::{EngineError, EngineResult};

/// How long teardown waits for SIGTERM before escalating to SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(2);
const WAIT_POLL: Duration = Duration::from_millis(20);

// ── EngineCommand ─────────────────────────────────────────────────────────────

/// A fully resolved engine command line.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args:    Vec<String>,
    pub port:    u16,
}

impl EngineCommand {
    /// Build the command line for one launch on `port`.
    pub fn from_params(params: &EngineParams, scenario_name: &str, port: u16) -> Self {
        let mut args = vec![
            "-c".to_string(),
            params.config_path.display().to_string(),
            "--remote-port".to_string(),
            port.to_string(),
            "--step-length".to_string(),
            params.step_length.to_string(),
        ];
        if params.no_step_log {
            args.push("--no-step-log".into());
        }
        if let Some(res) = params.lateral_resolution {
            args.push("--lateral-resolution".into());
            args.push(res.to_string());
        }
        if let Some(dir) = &params.emission_path {
            args.push("--emission-output".into());
            args.push(dir.join(format!("{scenario_name}-emission.xml")).display().to_string());
        }
        if params.overtake_right {
            args.push("--lanechange.overtake-right".into());
            args.push("true".into());
        }
        if params.ballistic {
            args.push("--step-method.ballistic".into());
            args.push("true".into());
        }
        if let Some(seed) = params.seed {
            args.push("--seed".into());
            args.push(seed.to_string());
        }
        Self { program: params.binary.clone(), args, port }
    }
}

/// Ask the OS for a currently unused TCP port.
///
/// The port is released before returning, so another process could grab it
/// before the engine binds; a failed launch is retried on a fresh port.
pub fn free_port() -> EngineResult<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

// ── Launcher ──────────────────────────────────────────────────────────────────

/// A running engine process.
#[derive(Debug)]
pub struct EngineHandle {
    pub pid:  u32,
    pub port: u16,
    child:    Option<Child>,
}

impl EngineHandle {
    /// A handle with no OS child attached, for launchers that do not spawn
    /// real processes.
    pub fn detached(pid: u32, port: u16) -> Self {
        Self { pid, port, child: None }
    }
}

/// Starts and stops engine processes.
pub trait Launcher {
    /// Pick the port for the next launch when none is configured.
    fn reserve_port(&mut self) -> EngineResult<u16> {
        free_port()
    }

    fn spawn(&mut self, command: &EngineCommand) -> EngineResult<EngineHandle>;

    /// Stop the process group.  Must not fail; problems are logged.
    fn terminate(&mut self, handle: &mut EngineHandle);
}

/// Spawns the engine as a real OS process in a fresh process group.
#[derive(Debug, Default)]
pub struct CommandLauncher;

impl Launcher for CommandLauncher {
    fn spawn(&mut self, command: &EngineCommand) -> EngineResult<EngineHandle> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let child = cmd.spawn()?;
        let pid = child.id();
        debug!(pid, program = %command.program.display(), "engine process spawned");
        Ok(EngineHandle { pid, port: command.port, child: Some(child) })
    }

    fn terminate(&mut self, handle: &mut EngineHandle) {
        signal_group(handle.pid, false);
        let Some(child) = handle.child.as_mut() else {
            return;
        };
        let deadline = Instant::now() + TERM_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(pid = handle.pid, %status, "engine process exited");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(WAIT_POLL),
                Ok(None) => break,
                Err(e) => {
                    warn!(pid = handle.pid, error = %e, "could not poll engine process");
                    break;
                }
            }
        }
        warn!(pid = handle.pid, "engine ignored SIGTERM, killing process group");
        signal_group(handle.pid, true);
        if let Err(e) = child.wait() {
            warn!(pid = handle.pid, error = %e, "could not reap engine process");
        }
    }
}

/// Send SIGTERM (or SIGKILL when `force`) to the process group led by `pid`.
#[cfg(unix)]
fn signal_group(pid: u32, force: bool) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    #[allow(clippy::cast_possible_wrap)]
    let group = Pid::from_raw(pid as i32);
    match killpg(group, signal) {
        Ok(()) => {}
        Err(Errno::ESRCH) => debug!(pid, "engine process group already gone"),
        Err(e) => warn!(pid, error = %e, "failed to signal engine process group"),
    }
}

#[cfg(not(unix))]
fn signal_group(pid: u32, _force: bool) {
    debug!(pid, "process groups unsupported on this platform");
}

// ── ProcessSupervisor ─────────────────────────────────────────────────────────

/// Owns the engine process for its whole life.
///
/// Dropping the supervisor tears down any process it still holds.
pub struct ProcessSupervisor<L: Launcher = CommandLauncher> {
    params:   EngineParams,
    launcher: L,
    handle:   Option<EngineHandle>,
}

impl<L: Launcher> ProcessSupervisor<L> {
    pub fn new(params: EngineParams, launcher: L) -> Self {
        Self { params, launcher, handle: None }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Replace the engine binary used by subsequent launches.
    pub fn set_binary(&mut self, binary: impl Into<PathBuf>) {
        self.params.binary = binary.into();
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Port of the running engine.
    pub fn port(&self) -> Option<u16> {
        self.handle.as_ref().map(|h| h.port)
    }

    /// Launch the engine and return a connected session that has already
    /// performed the handshake tick.
    ///
    /// Any process still held from an earlier start is torn down first.
    pub fn start<C: Connector>(
        &mut self,
        connector: &mut C,
        scenario_name: &str,
    ) -> EngineResult<C::Session> {
        self.teardown();
        if let Some(dir) = &self.params.emission_path {
            fs::create_dir_all(dir)?;
        }

        let attempts = self.params.launch_retries;
        let mut last_err = None;
        for attempt in 1..=attempts {
            let port = match self.params.port {
                Some(port) => port,
                None => match self.launcher.reserve_port() {
                    Ok(port) => port,
                    Err(e) => {
                        warn!(attempt, error = %e, "no free port for the engine");
                        last_err = Some(e);
                        continue;
                    }
                },
            };
            let command = EngineCommand::from_params(&self.params, scenario_name, port);
            info!(attempt, port, program = %command.program.display(), "starting engine");

            let mut handle = match self.launcher.spawn(&command) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(attempt, port, error = %e, "engine spawn failed");
                    last_err = Some(e);
                    continue;
                }
            };
            thread::sleep(self.params.settle_duration());

            match self.connect_and_handshake(connector, port) {
                Ok(session) => {
                    info!(attempt, port, pid = handle.pid, "engine ready");
                    self.handle = Some(handle);
                    return Ok(session);
                }
                Err(e) => {
                    warn!(attempt, port, error = %e, "engine start attempt failed");
                    self.launcher.terminate(&mut handle);
                    last_err = Some(e);
                }
            }
        }

        let source = last_err.unwrap_or_else(|| {
            EngineError::Protocol("launch_retries is zero".into())
        });
        Err(EngineError::Launch { attempts, source: Box::new(source) })
    }

    fn connect_and_handshake<C: Connector>(
        &self,
        connector: &mut C,
        port: u16,
    ) -> EngineResult<C::Session> {
        let mut session = connect_with_retries(
            connector,
            port,
            self.params.connect_retries,
            self.params.connect_retry_delay(),
        )?;
        if let Err(e) = session.advance() {
            session.close();
            return Err(e);
        }
        Ok(session)
    }

    /// Signal the engine's process group.  Idempotent.
    pub fn teardown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            info!(pid = handle.pid, port = handle.port, "tearing down engine");
            self.launcher.terminate(&mut handle);
        }
    }
}

impl<L: Launcher> Drop for ProcessSupervisor<L> {
    fn drop(&mut self) {
        self.teardown();
    }
}
