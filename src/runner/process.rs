//! Build executor invocation.
//!
//! The executor's standard output and error are forwarded to ours from two
//! reader threads while the main thread waits for it to exit.

use camino::Utf8Path;
use std::io::{self, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use tracing::{debug, info, warn};

/// Assemble the executor command line: `<program> -j <jobs> -f <makefile>`.
#[must_use]
pub fn executor_command(program: &str, jobs: usize, makefile: &Utf8Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("-j").arg(jobs.to_string());
    cmd.arg("-f").arg(makefile.as_std_path());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

/// Run `program` on `makefile` with `jobs` parallel jobs.
///
/// # Errors
///
/// Returns an [`io::Error`] if the executor fails to spawn, its standard
/// streams are unavailable, or it exits unsuccessfully.
pub fn run_executor(program: &str, jobs: usize, makefile: &Utf8Path) -> io::Result<()> {
    let mut cmd = executor_command(program, jobs, makefile);
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    info!("Running command: {} {}", program, args.join(" "));
    let child = cmd.spawn()?;
    let status = stream_output(child)?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("{program} exited with {status}")))
    }
}

fn stream_output(mut child: Child) -> io::Result<ExitStatus> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(io::Error::other("child process missing stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(io::Error::other("child process missing stderr pipe"));
    };

    let out_handle = thread::spawn(move || {
        let mut lock = io::stdout().lock();
        forward_child_output(BufReader::new(stdout), &mut lock, "stdout")
    });
    let err_handle = thread::spawn(move || {
        let mut lock = io::stderr().lock();
        forward_child_output(BufReader::new(stderr), &mut lock, "stderr")
    });

    let status = child.wait()?;
    log_forwarding(out_handle.join(), "stdout");
    log_forwarding(err_handle.join(), "stderr");
    Ok(status)
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        debug!("failed to kill child after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        debug!("failed to reap child after {context}: {err}");
    }
}

fn log_forwarding(result: thread::Result<Forwarded>, stream_name: &str) {
    match result {
        Ok(Forwarded::Complete) => {}
        Ok(Forwarded::Truncated) => {
            debug!("{stream_name} forwarding encountered closed pipe; output truncated");
        }
        Err(err) => warn!("{stream_name} forwarding thread panicked: {err:?}"),
    }
}

/// Outcome of forwarding one child stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Forwarded {
    Complete,
    Truncated,
}

/// Copy `reader` into `writer`. If the writer fails, the rest of the
/// child's output is drained so the child never blocks on a full pipe.
fn forward_child_output<R, W>(mut reader: R, mut writer: W, stream_name: &'static str) -> Forwarded
where
    R: Read,
    W: Write,
{
    match io::copy(&mut reader, &mut writer) {
        Ok(_) => Forwarded::Complete,
        Err(err) => {
            debug!(
                "Failed to write child {stream_name} output to parent: {err}; discarding remaining bytes"
            );
            if let Err(drain_err) = io::copy(&mut reader, &mut io::sink()) {
                debug!("Failed to drain child {stream_name} output: {drain_err}");
            }
            Forwarded::Truncated
        }
    }
}
