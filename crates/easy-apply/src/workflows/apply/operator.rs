use std::io::{self as std_io, BufRead, BufReader, Read};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{self, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

/// What the operator answered at a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSignal {
    Skip,
    Proceed,
}

impl OperatorSignal {
    /// `y` (any case, surrounding whitespace ignored) skips; anything else proceeds.
    pub fn from_input(line: &str) -> Self {
        if line.trim().eq_ignore_ascii_case("y") {
            OperatorSignal::Skip
        } else {
            OperatorSignal::Proceed
        }
    }
}

/// Human-in-the-loop input. `None` timeout waits indefinitely; a `None`
/// result means no answer arrived in time or input is closed.
#[async_trait]
pub trait OperatorConsole: Send + Sync {
    async fn await_signal(&self, prompt: &str, timeout: Option<Duration>) -> Option<OperatorSignal>;
}

/// Prompts on stdout and reads answers line by line from stdin.
///
/// Lines are read on a dedicated OS thread and handed over a channel, so a
/// prompt that times out leaves nothing pending on the async runtime.
pub struct StdinOperator {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl StdinOperator {
    pub fn new() -> Self {
        Self::from_reader(std_io::stdin())
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let spawned = thread::Builder::new()
            .name("operator-input".to_string())
            .spawn(move || {
                for line in BufReader::new(reader).lines() {
                    match line {
                        Ok(line) => {
                            if sender.send(line).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "unable to read operator input");
                            break;
                        }
                    }
                }
            });
        if let Err(err) = spawned {
            tracing::error!(error = %err, "unable to start operator input thread");
        }

        Self {
            lines: Mutex::new(receiver),
        }
    }
}

impl Default for StdinOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperatorConsole for StdinOperator {
    async fn await_signal(&self, prompt: &str, timeout: Option<Duration>) -> Option<OperatorSignal> {
        let mut stdout = io::stdout();
        if let Err(err) = stdout.write_all(prompt.as_bytes()).await {
            tracing::warn!(error = %err, "unable to write operator prompt");
        }
        let _ = stdout.flush().await;

        let mut lines = self.lines.lock().await;
        let line = match timeout {
            Some(limit) => match tokio::time::timeout(limit, lines.recv()).await {
                Ok(line) => line,
                Err(_) => {
                    tracing::debug!(?limit, "operator prompt timed out");
                    return None;
                }
            },
            None => lines.recv().await,
        };
        line.map(|line| OperatorSignal::from_input(&line))
    }
}
