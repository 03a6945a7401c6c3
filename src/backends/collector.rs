//! Bounded streaming collector
//!
//! Spawns the search process, consumes its output one line at a time and
//! stops on whichever comes first: the process finishing, the match cap, or
//! the deadline. Whatever was read before the stop is always returned.
//!
//! Process lifecycle:
//!
//! ```text
//! Running ──(cap | deadline)──> StopRequested ──(exit | kill)──> Terminated
//!    └──────────────(natural exit / already gone)──────────────────┘
//! ```

use log::{debug, info, warn};
use std::io;
use std::path::Path;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr};

use crate::backends::rg::{self, MAX_LINE_BYTES};
use crate::core::error::SearchError;
use crate::core::model::{CollectionResult, RawEvent, SearchRequest, Truncation};
use crate::core::util::truncate_string;

/// How long a stopped process gets to exit before it is killed
pub const TERMINATE_GRACE: Duration = Duration::from_millis(250);

/// Bytes of stderr kept for diagnostics
const STDERR_KEEP_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    StopRequested,
    Terminated,
}

/// A spawned search process and where it is in its lifecycle
struct SearchProcess {
    child: Child,
    state: ProcessState,
    status: Option<ExitStatus>,
}

impl SearchProcess {
    fn new(child: Child) -> Self {
        Self {
            child,
            state: ProcessState::Running,
            status: None,
        }
    }

    /// Wait for the process to exit on its own, up to `deadline`
    async fn wait_until(&mut self, deadline: tokio::time::Instant) -> bool {
        match tokio::time::timeout_at(deadline, self.child.wait()).await {
            Ok(Ok(status)) => {
                self.mark_terminated(Some(status));
                true
            }
            Ok(Err(e)) => {
                debug!("waiting for search process failed: {}", e);
                self.mark_terminated(None);
                true
            }
            Err(_) => false,
        }
    }

    /// Ask the process to stop. A process that is already gone counts as
    /// stopped.
    fn request_stop(&mut self) {
        if self.state != ProcessState::Running {
            return;
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.mark_terminated(Some(status));
                return;
            }
            Ok(None) => {}
            Err(e) => debug!("polling search process failed: {}", e),
        }

        self.state = ProcessState::StopRequested;
        send_graceful_stop(&mut self.child);
    }

    /// Drive the process to Terminated: graceful stop, bounded grace period,
    /// then a forced kill. Returns once the process has been reaped.
    async fn terminate(&mut self, grace: Duration) {
        self.request_stop();
        if self.state == ProcessState::Terminated {
            return;
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                self.mark_terminated(Some(status));
                return;
            }
            Ok(Err(e)) => debug!("waiting for stopped search process failed: {}", e),
            Err(_) => debug!("search process ignored stop request, killing it"),
        }

        if let Err(e) = self.child.start_kill() {
            // Already exited between the checks above
            debug!("kill after grace period failed: {}", e);
        }
        match self.child.wait().await {
            Ok(status) => self.mark_terminated(Some(status)),
            Err(e) => {
                debug!("reaping search process failed: {}", e);
                self.mark_terminated(None);
            }
        }
    }

    fn mark_terminated(&mut self, status: Option<ExitStatus>) {
        self.state = ProcessState::Terminated;
        if status.is_some() {
            self.status = status;
        }
    }
}

#[cfg(unix)]
fn send_graceful_stop(child: &mut Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped
        return;
    };
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => debug!("SIGTERM to search process {} failed: {}", pid, e),
    }
}

#[cfg(not(unix))]
fn send_graceful_stop(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!("stopping search process failed: {}", e);
    }
}

/// One line read from the search process
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Complete(Vec<u8>),
    /// Longer than the ceiling; only its length is kept
    Oversized(usize),
}

/// Newline-delimited reader that never buffers more than `limit` bytes of a
/// single line
struct LineReader<R> {
    reader: R,
    limit: usize,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    fn new(reader: R, limit: usize) -> Self {
        Self {
            reader,
            limit,
            buf: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> io::Result<Option<Line>> {
        self.buf.clear();
        let mut seen = 0usize;
        let mut oversized = false;

        loop {
            let (consumed, done) = {
                let available = self.reader.fill_buf().await?;
                if available.is_empty() {
                    if seen == 0 {
                        return Ok(None);
                    }
                    break;
                }

                let (consumed, done) = match available.iter().position(|b| *b == b'\n') {
                    Some(i) => (i + 1, true),
                    None => (available.len(), false),
                };

                // the terminator does not count against the ceiling
                let content = if done { consumed - 1 } else { consumed };
                if !oversized {
                    if self.buf.len() + content > self.limit {
                        oversized = true;
                        self.buf.clear();
                    } else {
                        self.buf.extend_from_slice(&available[..consumed]);
                    }
                }
                (consumed, done)
            };

            self.reader.consume(consumed);
            seen += consumed;
            if done {
                break;
            }
        }

        if oversized {
            return Ok(Some(Line::Oversized(seen)));
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(Line::Complete(std::mem::take(&mut self.buf))))
    }
}

/// Read stderr to the end so the process never blocks on it, keeping the head
async fn drain_stderr(mut stderr: ChildStderr) -> String {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match stderr.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = STDERR_KEEP_BYTES.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    String::from_utf8_lossy(&kept).into_owned()
}

/// Run `program` for `request` and collect its events.
///
/// Only a failure to launch the process is an error. Timeouts, the result cap,
/// unreadable output and undecodable lines all end in a well-formed
/// [`CollectionResult`].
pub async fn collect(program: &Path, request: &SearchRequest) -> Result<CollectionResult, SearchError> {
    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + request.time_limit();

    let child = rg::build_command(program, request)
        .spawn()
        .map_err(|source| SearchError::Launch {
            program: program.display().to_string(),
            source,
        })?;
    let mut process = SearchProcess::new(child);
    debug!(
        "spawned {} for {:?} in {}",
        program.display(),
        request.pattern(),
        request.root().display()
    );

    let stderr_task = process.child.stderr.take().map(|s| tokio::spawn(drain_stderr(s)));
    let Some(stdout) = process.child.stdout.take() else {
        process.terminate(TERMINATE_GRACE).await;
        return Err(SearchError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "search process stdout was not captured",
        )));
    };

    let collected = read_events(
        BufReader::new(stdout),
        request.max_results(),
        request.context_lines(),
        deadline,
    )
    .await;

    match collected.truncation {
        Truncation::None => {
            if !process.wait_until(deadline).await {
                // stdout closed but the process lingers past the budget
                process.terminate(TERMINATE_GRACE).await;
            }
        }
        Truncation::Count | Truncation::Time => process.terminate(TERMINATE_GRACE).await,
    }

    if let Some(task) = stderr_task {
        if let Ok(Ok(stderr)) = tokio::time::timeout(TERMINATE_GRACE, task).await {
            log_stderr(&process, &stderr, collected.truncation);
        }
    }

    let result = CollectionResult {
        elapsed: started.elapsed(),
        ..collected
    };

    match result.truncation {
        Truncation::Count => info!(
            "search for {:?} stopped at {} matches",
            request.pattern(),
            request.max_results()
        ),
        Truncation::Time => info!(
            "search for {:?} stopped after {:?} with {} matches",
            request.pattern(),
            request.time_limit(),
            result.match_count()
        ),
        Truncation::None => debug!(
            "search for {:?} finished with {} matches in {:?}",
            request.pattern(),
            result.match_count(),
            result.elapsed
        ),
    }
    if result.decode_failures > 0 {
        warn!(
            "dropped {} undecodable line(s) of search output",
            result.decode_failures
        );
    }

    Ok(result)
}

/// Consume output until EOF, the match cap, or the deadline.
///
/// Reaching `max_results` matches ends collection with [`Truncation::Count`]
/// without waiting for further output. Up to `context_lines` context events
/// that directly follow the last kept match are still collected; any other
/// event ends the tail.
async fn read_events<R>(
    reader: R,
    max_results: usize,
    context_lines: usize,
    deadline: tokio::time::Instant,
) -> CollectionResult
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LineReader::new(reader, MAX_LINE_BYTES);
    let timer = tokio::time::sleep_until(deadline);
    tokio::pin!(timer);

    let mut result = CollectionResult::default();
    let mut matches = 0usize;
    // Some(n): cap reached, n trailing context lines still wanted
    let mut tail: Option<usize> = None;

    loop {
        if tail == Some(0) {
            result.truncation = Truncation::Count;
            break;
        }

        tokio::select! {
            biased;

            _ = &mut timer => {
                result.truncation = if tail.is_some() {
                    Truncation::Count
                } else {
                    Truncation::Time
                };
                break;
            }

            next = lines.next_line() => match next {
                Ok(Some(Line::Complete(bytes))) => {
                    if bytes.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    match (rg::decode_line(&bytes), tail) {
                        (Ok(event @ RawEvent::Context(_)), Some(wanted)) => {
                            tail = Some(wanted - 1);
                            result.events.push(event);
                        }
                        (Ok(_), Some(_)) => {
                            result.truncation = Truncation::Count;
                            break;
                        }
                        (Ok(RawEvent::Other), None) => {}
                        (Ok(event), None) => {
                            let is_match = event.is_match();
                            result.events.push(event);
                            if is_match {
                                matches += 1;
                                if matches >= max_results {
                                    tail = Some(context_lines);
                                }
                            }
                        }
                        (Err(e), _) => {
                            result.decode_failures += 1;
                            debug!("skipping search output line: {}", e);
                        }
                    }
                }
                Ok(Some(Line::Oversized(len))) => {
                    result.decode_failures += 1;
                    warn!(
                        "skipping search output line of {} bytes (limit {})",
                        len, MAX_LINE_BYTES
                    );
                }
                Ok(None) => {
                    if tail.is_some() {
                        result.truncation = Truncation::Count;
                    }
                    break;
                }
                Err(e) => {
                    warn!("reading search output failed, keeping partial results: {}", e);
                    if tail.is_some() {
                        result.truncation = Truncation::Count;
                    }
                    break;
                }
            },
        }
    }

    result
}

fn log_stderr(process: &SearchProcess, stderr: &str, truncation: Truncation) {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        return;
    }
    let (head, _) = truncate_string(stderr, 2048);

    // rg exits 2 on errors; 1 only means "no match"
    let failed = truncation == Truncation::None
        && process.status.and_then(|s| s.code()).is_some_and(|c| c > 1);
    if failed {
        warn!("search process reported: {}", head);
    } else {
        debug!("search process stderr: {}", head);
    }
}
