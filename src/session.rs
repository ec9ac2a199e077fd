//! Request/response front door to a shared machine.
//!
//! There is exactly one machine per session and every caller sees the same
//! one. Actions are serialized through a mutex, so concurrent callers never
//! interleave inside a step. Every response carries the machine state, even
//! when the action failed.
//!
//! Wire format, one JSON object per line:
//! ```text
//! -> {"action": "load", "code": "MOV AX, 5\nADD AX, 3"}
//! <- {"success": true, "registers": {...}, "flags": {...}, ..., "status": "ready", "ip": 0}
//! -> {"action": "step"}
//! ```

use crate::cpu::{Cpu, StateSnapshot};
use log::{debug, warn};
use serde::{Serialize, Deserialize};
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One action against the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request {
    Reset,
    Step,
    Run,
    Load {
        #[serde(default)]
        code: String,
    },
}

/// The outcome of an action plus the machine state after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub state: StateSnapshot,
}

/// Session settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on instructions per `run` action. `None` runs until the
    /// program halts, which never happens for a program that loops forever.
    pub step_budget: Option<u64>,
}

/// A single shared machine behind a lock.
#[derive(Debug, Default)]
pub struct Session {
    cpu: Mutex<Cpu>,
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            cpu: Mutex::new(Cpu::new()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cpu> {
        // A panic mid-action leaves the machine as it was at that point,
        // which is the same guarantee a fault gives.
        self.cpu.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform one action and report the resulting state.
    pub fn handle(&self, request: &Request) -> Response {
        let mut cpu = self.lock();
        debug!("session request: {:?}", request);

        let outcome = match request {
            Request::Reset => {
                cpu.reset();
                Ok(())
            }
            Request::Step => cpu.step().map(|_| ()),
            Request::Run => match self.config.step_budget {
                Some(budget) => cpu.run_limited(budget).map(|_| ()),
                None => cpu.run().map(|_| ()),
            },
            Request::Load { code } => {
                cpu.load(code);
                Ok(())
            }
        };

        let state = cpu.get_state();
        match outcome {
            Ok(()) => Response { success: true, error: None, state },
            Err(e) => {
                warn!("action failed: {}", e);
                Response { success: false, error: Some(e.to_string()), state }
            }
        }
    }

    /// Parse a JSON request and handle it. Unparsable input is reported as a
    /// failed response carrying the current state.
    pub fn handle_json(&self, text: &str) -> Response {
        match serde_json::from_str::<Request>(text) {
            Ok(request) => self.handle(&request),
            Err(e) => Response {
                success: false,
                error: Some(format!("invalid request: {}", e)),
                state: self.snapshot(),
            },
        }
    }

    /// Current machine state without performing an action.
    pub fn snapshot(&self) -> StateSnapshot {
        self.lock().get_state()
    }

    /// Answer newline-delimited JSON requests until `input` is exhausted.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_json(&line);
            serde_json::to_writer(&mut output, &response).map_err(io::Error::from)?;
            output.write_all(b"\n")?;
            output.flush()?;
        }
        Ok(())
    }
}
