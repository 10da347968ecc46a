use super::{ConversionBackend, ConversionSession, types::*};
use crate::{config::EngineConfig, interrupt};
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const RUNNER_SOURCE: &str = include_str!("../../scripts/pdf2docx_runner.py");
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const CLOSE_GRACE: Duration = Duration::from_secs(10);
const STDERR_TAIL_BYTES: usize = 2048;

/// Runs `pdf2docx` in a Python child process, one process per session.
pub struct PythonBackend {
    python_exe: PathBuf,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    keep_python_stderr: bool,
}

impl PythonBackend {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            python_exe: resolve_python_exe(&cfg.python_exe),
            env: cfg.env.clone(),
            timeout: (cfg.timeout_seconds > 0).then(|| Duration::from_secs(cfg.timeout_seconds)),
            keep_python_stderr: cfg.keep_python_stderr,
        }
    }

    pub fn python_exe(&self) -> &Path {
        &self.python_exe
    }
}

impl ConversionBackend for PythonBackend {
    fn open(&self, input: &Path) -> Result<Box<dyn ConversionSession>> {
        debug!("spawning pdf2docx runner: {}", self.python_exe.display());
        let mut child = Command::new(&self.python_exe)
            .arg("-u")
            .arg("-c")
            .arg(RUNNER_SOURCE)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning python: {}", self.python_exe.display()))?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("python runner pipes unavailable"));
        };

        // Both pipes are drained on their own threads so a chatty converter
        // can't block on a full buffer while we wait for a reply.
        let (tx, replies) = mpsc::channel();
        std::thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stderr_buf);
        let stderr_thread = std::thread::spawn(move || {
            let mut reader = stderr;
            let mut chunk = [0u8; 4096];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });

        let mut session = PythonSession {
            child,
            stdin: Some(stdin),
            replies,
            stderr: stderr_buf,
            stderr_thread: Some(stderr_thread),
            timeout: self.timeout,
            keep_python_stderr: self.keep_python_stderr,
            finished: false,
        };

        session
            .request(
                "open",
                &serde_json::json!({"cmd": "open", "input_pdf": input}),
                self.timeout,
            )
            .with_context(|| format!("opening {} in pdf2docx", input.display()))?;

        Ok(Box::new(session))
    }
}

struct PythonSession {
    child: Child,
    stdin: Option<ChildStdin>,
    replies: Receiver<std::io::Result<String>>,
    stderr: Arc<Mutex<Vec<u8>>>,
    stderr_thread: Option<JoinHandle<()>>,
    timeout: Option<Duration>,
    keep_python_stderr: bool,
    finished: bool,
}

impl PythonSession {
    fn request(
        &mut self,
        cmd: &str,
        payload: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let mut line = serde_json::to_vec(payload)?;
        line.push(b'\n');

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("python runner stdin already closed"))?;
        let sent = stdin.write_all(&line).and_then(|()| stdin.flush());
        if let Err(err) = sent {
            let tail = self.stderr_tail();
            return Err(anyhow::Error::new(err).context(format!("sending {cmd} to python runner{tail}")));
        }

        let started = Instant::now();
        loop {
            if interrupt::requested() {
                self.kill();
                return Err(interrupt::Interrupted.into());
            }

            match self.replies.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let reply: RunnerReply = serde_json::from_str(&line)
                        .with_context(|| format!("parsing python runner reply: {line}"))?;
                    if reply.ok {
                        return Ok(());
                    }
                    if let Some(tb) = reply.traceback.as_deref() {
                        debug!("python traceback for {cmd}:\n{}", tb.trim_end());
                    }
                    return Err(anyhow!(
                        "pdf2docx {cmd} failed: {}",
                        reply.error.unwrap_or_else(|| "unknown error".to_string())
                    ));
                }
                Ok(Err(err)) => {
                    return Err(anyhow::Error::new(err).context("reading python runner reply"));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if interrupt::requested() {
                        self.kill();
                        return Err(interrupt::Interrupted.into());
                    }
                    let status = self.child.wait().with_context(|| "waiting for python runner")?;
                    self.finished = true;
                    return Err(anyhow!(
                        "python runner exited during {cmd} ({status}){}",
                        self.stderr_tail()
                    ));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(limit) = timeout {
                        if started.elapsed() > limit {
                            warn!("python runner timed out after {:?} during {cmd}", limit);
                            self.kill();
                            return Err(anyhow!(
                                "python runner exceeded timeout ({:?}) during {cmd}{}",
                                limit,
                                self.stderr_tail()
                            ));
                        }
                    }
                }
            }
        }
    }

    fn stderr_tail(&self) -> String {
        let Ok(buf) = self.stderr.lock() else {
            return String::new();
        };
        let start = buf.len().saturating_sub(STDERR_TAIL_BYTES);
        let text = String::from_utf8_lossy(&buf[start..]);
        let text = text.trim();
        if text.is_empty() {
            String::new()
        } else {
            format!("; stderr: {text}")
        }
    }

    fn kill(&mut self) {
        self.stdin = None;
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.finished = true;
    }

    /// Waits for the runner to exit on its own after stdin closes.
    fn reap(&mut self) {
        self.stdin = None;
        let started = Instant::now();
        while !self.finished {
            match self.child.try_wait() {
                Ok(Some(_)) => self.finished = true,
                Ok(None) if started.elapsed() < CLOSE_GRACE => std::thread::sleep(POLL_INTERVAL),
                _ => {
                    warn!("python runner did not exit after close; killing it");
                    self.kill();
                }
            }
        }
        if let Some(handle) = self.stderr_thread.take() {
            let _ = handle.join();
        }
    }
}

impl ConversionSession for PythonSession {
    fn convert(&mut self, req: &ConvertIn) -> Result<()> {
        let mut payload = serde_json::to_value(req)?;
        payload["cmd"] = serde_json::Value::from("convert");
        debug!(
            "pdf2docx convert output={} start={} end={:?}",
            req.output_docx, req.start_page, req.end_page
        );
        self.request("convert", &payload, self.timeout)
    }

    fn close(&mut self) -> Result<()> {
        let result = if self.finished {
            Ok(())
        } else {
            self.request("close", &serde_json::json!({"cmd": "close"}), Some(CLOSE_GRACE))
        };
        self.reap();

        if self.keep_python_stderr {
            if let Ok(buf) = self.stderr.lock() {
                if !buf.is_empty() {
                    debug!("python stderr: {}", String::from_utf8_lossy(&buf).trim());
                }
            }
        }
        result
    }
}

impl Drop for PythonSession {
    fn drop(&mut self) {
        if !self.finished {
            self.kill();
        }
    }
}

fn resolve_python_exe(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("PDF2DOCX_PYTHON") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return p;
            }
        }
        return PathBuf::from("python3");
    }
    expand_tilde(raw)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
