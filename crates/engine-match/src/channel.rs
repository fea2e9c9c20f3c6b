//! Line-oriented transport to a child engine process.
//!
//! [`ProcessChannel`] owns the engine subprocess. Writes go straight to the
//! child's stdin; a background thread forwards every stdout line through an
//! mpsc channel so that reads can give up after a deadline instead of
//! blocking forever on a hung engine.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// How long a child gets to honour `quit` before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(300);

/// Transport-level failures. All of them leave the owning client unusable.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The executable could not be started.
    #[error("Failed to spawn {path}: {source}")]
    SpawnFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// No complete line arrived within the read timeout.
    #[error("No response from engine within {0:?}")]
    ProcessTimeout(Duration),
    /// The engine closed its output or its input pipe is gone.
    #[error("Engine process exited")]
    ProcessExited,
    /// Any other I/O failure on the pipes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can exchange UCI lines with an engine.
///
/// [`ProcessChannel`] is the production implementation; tests drive the
/// protocol client through scripted in-memory transports.
pub trait Transport {
    /// Write one line. No response is expected.
    fn send(&mut self, line: &str) -> Result<(), ChannelError>;

    /// Block until the engine emits a line, or fail after `timeout`.
    fn read_line(&mut self, timeout: Duration) -> Result<String, ChannelError>;
}

/// A spawned engine process with piped stdin/stdout.
pub struct ProcessChannel {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
    program: PathBuf,
    closed: bool,
}

impl ProcessChannel {
    /// Spawns `path` with `args` and starts the stdout reader thread.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::SpawnFailure`] if the executable is missing or
    /// cannot be executed.
    pub fn spawn<P: AsRef<Path>>(path: P, args: &[String]) -> Result<Self, ChannelError> {
        let program = path.as_ref().to_path_buf();
        let spawn_failure = |source| ChannelError::SpawnFailure {
            path: program.clone(),
            source,
        };

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_failure)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_failure(std::io::Error::new(ErrorKind::Other, "no stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failure(std::io::Error::new(ErrorKind::Other, "no stdout")))?;

        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        // Engines are not required to emit valid UTF-8.
                        let line = String::from_utf8_lossy(&buf).into_owned();
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });

        debug!("Spawned engine {} (pid {})", program.display(), child.id());

        Ok(Self {
            child,
            stdin: BufWriter::new(stdin),
            lines: rx,
            program,
            closed: false,
        })
    }

    /// Path of the running executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Asks the engine to quit, then kills it if it has not exited after a
    /// short grace period. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let _ = self.send("quit");
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                debug!("Engine {} exited", self.program.display());
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        debug!("Killing engine {}", self.program.display());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Transport for ProcessChannel {
    fn send(&mut self, line: &str) -> Result<(), ChannelError> {
        trace!("> {}", line);
        let written = writeln!(self.stdin, "{}", line).and_then(|_| self.stdin.flush());
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(ChannelError::ProcessExited),
            Err(e) => Err(e.into()),
        }
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, ChannelError> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => {
                let line = line.trim().to_string();
                trace!("< {}", line);
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::ProcessTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::ProcessExited),
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
