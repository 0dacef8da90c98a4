//! External process execution.
//!
//! Every toolchain interaction (version probes, package listings, package
//! manager invocations, installer launches) goes through [`ProcessRunner`],
//! so detection and orchestration can run against scripted fakes in tests.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a running child is polled for exit while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Options for a single process invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Kill the process if it runs longer than this.
    pub timeout: Option<Duration>,

    /// Echo output lines to the terminal as they arrive.
    pub stream: bool,
}

impl RunOptions {
    /// Capture-only invocation with a timeout, used for probes.
    pub fn probe(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }

    /// Live-streamed invocation without a timeout, used for installs.
    pub fn streaming() -> Self {
        Self {
            stream: true,
            ..Default::default()
        }
    }
}

/// Output of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// Why a process could not be run to completion.
///
/// A process that ran and exited nonzero is *not* a launch error; it is a
/// [`ProcessOutput`] with a nonzero exit code.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The program does not exist or is not executable.
    #[error("program not found: {program}")]
    NotFound { program: String },

    /// The program exceeded its timeout and was killed.
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    /// Any other OS-level failure while spawning or waiting.
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs external programs.
pub trait ProcessRunner {
    /// Run `argv[0]` with the remaining arguments and wait for it to finish.
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<ProcessOutput, LaunchError>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String], options: &RunOptions) -> Result<ProcessOutput, LaunchError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(LaunchError::NotFound {
                program: String::new(),
            });
        };

        tracing::debug!("Running command: {}", argv.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = &options.cwd {
            tracing::debug!("In directory: {}", cwd.display());
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| launch_error(program, e))?;

        let stdout_handle = child.stdout.take().map(|out| collect(out, options.stream, false));
        let stderr_handle = child.stderr.take().map(|err| collect(err, options.stream, true));

        let exit_code = wait_with_timeout(&mut child, program, options.timeout)?;

        let stdout = stdout_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stderr = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        Ok(ProcessOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn launch_error(program: &str, e: std::io::Error) -> LaunchError {
    match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            LaunchError::NotFound {
                program: program.to_string(),
            }
        }
        _ => LaunchError::Io {
            program: program.to_string(),
            source: e,
        },
    }
}

/// Read a child stream to the end on its own thread, optionally echoing lines.
///
/// Lines are decoded lossily: a stray non-UTF-8 byte becomes U+FFFD and the
/// rest of the stream is still read.
fn collect<R: Read + Send + 'static>(
    stream: R,
    echo: bool,
    to_stderr: bool,
) -> thread::JoinHandle<String> {
    thread::spawn(move || read_lossy_lines(BufReader::new(stream), echo, to_stderr))
}

fn read_lossy_lines(mut reader: impl BufRead, echo: bool, to_stderr: bool) -> String {
    let mut output = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Stopped reading child output: {}", e);
                break;
            }
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        if echo {
            if to_stderr {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
        output.push_str(line);
        output.push('\n');
    }
    output
}

fn wait_with_timeout(
    child: &mut Child,
    program: &str,
    timeout: Option<Duration>,
) -> Result<Option<i32>, LaunchError> {
    let io_err = |source| LaunchError::Io {
        program: program.to_string(),
        source,
    };

    let Some(timeout) = timeout else {
        return child.wait().map(|s| s.code()).map_err(io_err);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(io_err)? {
            return Ok(status.code());
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!("{} exceeded {}s, killed", program, timeout.as_secs());
            return Err(LaunchError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Build an argv vector from string-like parts.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
