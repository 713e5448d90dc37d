//! Thin helpers for driving the system `ffmpeg`/`ffprobe` binaries over pipes.
//!
//! Input bytes are streamed to the child's stdin from a scoped writer thread while stdout/stderr
//! are collected, and every child is waited on before returning. Payloads only touch the
//! filesystem when a demuxer has to seek (see [`SpillFile`]).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Output, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}

fn tool_on_path(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Spawn `cmd`, feed its stdin through `feed`, and collect its output.
///
/// A broken pipe while feeding is not an error by itself: the child may legitimately stop reading
/// early, and its exit status carries the real outcome. Callers must check `Output::status`.
pub(crate) fn run_piped<F>(cmd: &mut Command, feed: F) -> std::io::Result<Output>
where
    F: FnOnce(&mut ChildStdin) -> std::io::Result<()> + Send,
{
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| std::io::Error::other("failed to open child stdin"))?;

    std::thread::scope(|s| {
        let writer = s.spawn(move || {
            let res = feed(&mut stdin);
            drop(stdin);
            match res {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        });

        let out = child.wait_with_output();
        let fed = writer
            .join()
            .map_err(|_| std::io::Error::other("stdin writer thread panicked"))?;
        let out = out?;
        if out.status.success() {
            fed?;
        }
        Ok(out)
    })
}

/// Run `cmd` with `input` as its entire stdin.
pub(crate) fn run_with_input(cmd: &mut Command, input: &[u8]) -> std::io::Result<Output> {
    run_piped(cmd, |stdin| {
        use std::io::Write as _;
        stdin.write_all(input)
    })
}

/// Run `cmd` reading its input from a file argument; stdin is closed.
pub(crate) fn run_detached(cmd: &mut Command) -> std::io::Result<Output> {
    cmd.stdin(Stdio::null()).output()
}

/// Scratch copy of a payload for inputs that cannot be demuxed from a pipe. Removed on drop.
pub(crate) struct SpillFile {
    path: PathBuf,
}

impl SpillFile {
    pub(crate) fn write(bytes: &[u8]) -> std::io::Result<Self> {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let path = std::env::temp_dir().join(format!(
            "overlaid_spill_{}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        let spill = Self { path };
        std::fs::write(&spill.path, bytes)?;
        Ok(spill)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpillFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Parse an ffmpeg rational such as `"30000/1001"` or `"25"`.
pub(crate) fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim().parse().ok()?, d.trim().parse().ok()?),
        None => (s.trim().parse().ok()?, 1),
    };
    if num == 0 || den == 0 {
        return None;
    }
    Some((num, den))
}

/// Last non-empty line of ffmpeg's stderr, which usually names the actual failure.
pub(crate) fn stderr_summary(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output")
        .to_owned()
}
