//! External downloader tool abstraction.
//!
//! The queue drives a third-party command-line downloader as a subprocess.
//! [`MediaTool`] is the seam the workers call through; [`YtDlp`] is the real
//! implementation. Cancellation is observed between output lines (download)
//! or between wait polls (metadata fetch), in which case the subprocess is
//! terminated and the partial output is left on disk untouched.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::worker::CancelToken;

/// How often the metadata fetch polls the child process and the token.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a tool invocation that may be cancelled cooperatively.
#[derive(Debug)]
pub enum ToolOutcome<T> {
    /// The invocation ran to completion.
    Completed(T),
    /// The cancel token was observed and the invocation was abandoned.
    Cancelled,
}

/// One download request handed to the tool.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Media URL.
    pub url: String,
    /// Directory the output file is written to.
    pub output_dir: PathBuf,
    /// Combined format string for `-f`, when the user picked one.
    pub format: Option<String>,
    /// Extra command-line arguments passed through verbatim.
    pub extra_args: Vec<String>,
}

/// The external downloader, consumed as an opaque capability.
pub trait MediaTool: Send + Sync {
    /// Fetch the metadata blob for a URL.
    fn fetch_info(&self, url: &str, token: &CancelToken) -> Result<ToolOutcome<Value>>;

    /// Download a URL, reporting each progress line through `progress`
    /// (percent when the line carried one, plus the raw line).
    fn download(
        &self,
        request: &DownloadRequest,
        token: &CancelToken,
        progress: &mut dyn FnMut(Option<f32>, &str),
    ) -> Result<ToolOutcome<()>>;
}

/// yt-dlp subprocess wrapper.
#[derive(Debug)]
pub struct YtDlp {
    binary: PathBuf,
    progress_re: Regex,
}

impl YtDlp {
    /// Create a wrapper around the given yt-dlp binary.
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self> {
        let progress_re = Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%")
            .map_err(|e| Error::Tool(format!("invalid progress pattern: {e}")))?;
        Ok(Self {
            binary: binary.into(),
            progress_re,
        })
    }

    /// Percent value carried by a progress line, if any.
    #[must_use]
    pub fn progress_percent(&self, line: &str) -> Option<f32> {
        self.progress_re
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Command-line arguments for a download request.
    #[must_use]
    pub fn download_args(request: &DownloadRequest) -> Vec<String> {
        let mut args = vec!["--newline".to_string(), "--no-warnings".to_string()];
        if let Some(fmt) = &request.format {
            args.push("-f".to_string());
            args.push(fmt.clone());
        }
        args.push("-o".to_string());
        args.push(
            request
                .output_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .into_owned(),
        );
        args.extend(request.extra_args.iter().cloned());
        args.push(request.url.clone());
        args
    }

    fn kill_child(child: &mut Child, what: &str) {
        if let Err(e) = child.kill() {
            warn!("Could not terminate {} subprocess: {}", what, e);
        }
        let _ = child.wait();
    }
}

impl MediaTool for YtDlp {
    fn fetch_info(&self, url: &str, token: &CancelToken) -> Result<ToolOutcome<Value>> {
        debug!("Fetching metadata for {}", url);
        let mut child = Command::new(&self.binary)
            .args(["--dump-json", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Tool(format!("could not start {}: {e}", self.binary.display())))?;

        // Poll so the token is observed while the tool talks to the network.
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut stdout = String::new();
                    if let Some(out) = child.stdout.as_mut() {
                        out.read_to_string(&mut stdout)?;
                    }
                    if !status.success() {
                        let mut stderr = String::new();
                        if let Some(err) = child.stderr.as_mut() {
                            let _ = err.read_to_string(&mut stderr);
                        }
                        let reason = stderr.lines().last().unwrap_or("tool failed").to_string();
                        return Err(Error::InfoFetch(reason));
                    }
                    let info: Value = serde_json::from_str(stdout.trim())
                        .map_err(|e| Error::InfoFetch(format!("invalid metadata JSON: {e}")))?;
                    return Ok(ToolOutcome::Completed(info));
                }
                Ok(None) => {
                    if token.is_cancelled() {
                        debug!("Metadata fetch for {} cancelled", url);
                        Self::kill_child(&mut child, "metadata");
                        return Ok(ToolOutcome::Cancelled);
                    }
                    std::thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn download(
        &self,
        request: &DownloadRequest,
        token: &CancelToken,
        progress: &mut dyn FnMut(Option<f32>, &str),
    ) -> Result<ToolOutcome<()>> {
        let args = Self::download_args(request);
        info!("Starting download: {} {:?}", self.binary.display(), args);
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Tool(format!("could not start {}: {e}", self.binary.display())))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Tool("no stdout handle on subprocess".to_string()))?;

        let mut last_line = String::new();
        for line in BufReader::new(stdout).lines() {
            // Poll point: one check per output line.
            if token.is_cancelled() {
                info!("Download of {} cancelled, terminating subprocess", request.url);
                Self::kill_child(&mut child, "download");
                return Ok(ToolOutcome::Cancelled);
            }
            let line = line?;
            progress(self.progress_percent(&line), &line);
            if !line.is_empty() {
                last_line = line;
            }
        }

        let status = child.wait()?;
        if status.success() {
            return Ok(ToolOutcome::Completed(()));
        }
        if token.is_cancelled() {
            return Ok(ToolOutcome::Cancelled);
        }
        let mut stderr = String::new();
        if let Some(err) = child.stderr.as_mut() {
            let _ = err.read_to_string(&mut stderr);
        }
        let reason = stderr
            .lines()
            .last()
            .filter(|l| !l.is_empty())
            .unwrap_or(&last_line)
            .to_string();
        Err(Error::Download(reason))
    }
}
