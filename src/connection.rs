//! External engine processes.
//!
//! An [`EngineConnection`] owns one child process. Lines the child writes to
//! stdout and stderr, and its eventual exit, are delivered to a
//! [`ConnectionHandler`] from background reader threads. The connection knows
//! nothing about the protocol spoken over the pipes.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// How often the exit watcher polls a child whose stdout has closed.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle of an engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    /// Exit code, or `None` if the process was killed by a signal.
    Exited(Option<i32>),
}

/// Receives everything a process emits. Called from reader threads.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn on_stdout(&self, line: &str);
    fn on_stderr(&self, line: &str);
    /// Called exactly once, after the last stdout line.
    fn on_exit(&self, code: Option<i32>);
}

/// The writing half of an engine: anything that accepts command lines.
pub trait Device: Send {
    fn send_line(&mut self, text: &str) -> io::Result<()>;
    /// Terminate immediately.
    fn kill(&mut self);
    /// Ask the engine to exit and close its input.
    fn shutdown(&mut self);
}

pub struct EngineConnection {
    stdin: Option<ChildStdin>,
    child: Arc<Mutex<Child>>,
}

impl EngineConnection {
    /// Launch `path` with `args` and start delivering its output to `handler`.
    pub fn start(
        path: &Path,
        args: &[String],
        handler: Arc<dyn ConnectionHandler>,
    ) -> io::Result<Self> {
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        debug!(path = %path.display(), pid = child.id(), "engine process started");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let child = Arc::new(Mutex::new(child));

        if let Some(stderr) = stderr {
            let handler = handler.clone();
            thread::spawn(move || {
                for_each_line(stderr, |line| handler.on_stderr(line));
            });
        }

        let watched = child.clone();
        thread::spawn(move || {
            if let Some(stdout) = stdout {
                for_each_line(stdout, |line| handler.on_stdout(line));
            }
            let code = wait_for_exit(&watched);
            handler.on_exit(code);
        });

        Ok(Self { stdin, child })
    }

    fn lock_child(&self) -> std::sync::MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn for_each_line(stream: impl Read, mut f: impl FnMut(&str)) {
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(line) => f(&line),
            Err(err) => {
                debug!(%err, "engine stream closed");
                break;
            }
        }
    }
}

fn wait_for_exit(child: &Mutex<Child>) -> Option<i32> {
    loop {
        {
            let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
            match child.try_wait() {
                Ok(Some(status)) => return status.code(),
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, "failed to query engine exit status");
                    return None;
                }
            }
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

impl Device for EngineConnection {
    fn send_line(&mut self, text: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine input closed"))?;
        writeln!(stdin, "{text}")?;
        stdin.flush()
    }

    fn kill(&mut self) {
        if let Err(err) = self.lock_child().kill() {
            debug!(%err, "kill on a finished engine");
        }
    }

    fn shutdown(&mut self) {
        if let Err(err) = self.send_line(crate::protocol::END) {
            debug!(%err, "engine input already closed");
        }
        self.stdin = None;
    }
}
