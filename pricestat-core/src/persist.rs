//! Interactive, overwrite-safe persistence of a stats batch.
//!
//! File naming is a small state machine driven by operator answers:
//!
//! ```text
//! AwaitingName ──"cancel"──────────────────────────────▶ Cancelled
//!      │ name
//!      ▼
//! CheckingExistence ──exists──▶ ConfirmOverwrite ──n──▶ AwaitingName
//!      │ new file                     │ y
//!      ▼                              ▼
//!   Writing ◀─────────────────────────┘
//!      │ open failed ─────────────────────────────────▶ AwaitingName
//!      ▼
//!    Done
//! ```
//!
//! The batch is written as one JSON array. Failing to open the target sends
//! the operator back to naming; failing mid-write is reported but still ends
//! in `Done`.

use crate::domain::TickerStats;
use crate::prompt::{ask_yes_no, Operator, PromptError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Name that abandons saving.
pub const CANCEL_KEYWORD: &str = "cancel";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot open {} for writing: {source}", .path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write results to {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Interrupted(#[from] PromptError),
}

/// States of the file-naming negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    AwaitingName,
    CheckingExistence(PathBuf),
    ConfirmOverwrite(PathBuf),
    Writing(PathBuf),
    /// `written` is false when serialization failed after the file was opened.
    Done { path: PathBuf, written: bool },
    Cancelled,
}

impl SaveState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Cancelled)
    }
}

/// How a persistence run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { path: PathBuf, complete: bool },
    Cancelled,
}

/// Drives [`SaveState`] transitions for one batch.
pub struct Persister<'a, O: Operator + ?Sized> {
    batch: &'a [TickerStats],
    operator: &'a mut O,
}

impl<'a, O: Operator + ?Sized> Persister<'a, O> {
    pub fn new(batch: &'a [TickerStats], operator: &'a mut O) -> Self {
        Self { batch, operator }
    }

    /// Perform one transition. Terminal states map to themselves.
    ///
    /// Only operator input failures are returned as errors.
    pub fn step(&mut self, state: SaveState) -> Result<SaveState, PersistError> {
        let next = match state {
            SaveState::AwaitingName => {
                let name = self
                    .operator
                    .ask("Enter a file name to save the results (or 'cancel'): ")?;
                let name = name.trim();
                if name.eq_ignore_ascii_case(CANCEL_KEYWORD) {
                    SaveState::Cancelled
                } else if name.is_empty() {
                    self.operator.tell("A file name is required.");
                    SaveState::AwaitingName
                } else {
                    SaveState::CheckingExistence(PathBuf::from(name))
                }
            }
            SaveState::CheckingExistence(path) => {
                if path.exists() {
                    SaveState::ConfirmOverwrite(path)
                } else {
                    SaveState::Writing(path)
                }
            }
            SaveState::ConfirmOverwrite(path) => {
                let question = format!("{} already exists. Overwrite it? (y/n): ", path.display());
                if ask_yes_no(&mut *self.operator, &question)? {
                    SaveState::Writing(path)
                } else {
                    SaveState::AwaitingName
                }
            }
            SaveState::Writing(path) => self.write(path),
            terminal => terminal,
        };
        Ok(next)
    }

    /// Run transitions from `AwaitingName` until a terminal state.
    pub fn run(mut self) -> Result<SaveOutcome, PersistError> {
        let mut state = SaveState::AwaitingName;
        while !state.is_terminal() {
            state = self.step(state)?;
        }
        Ok(match state {
            SaveState::Done { path, written } => SaveOutcome::Written {
                path,
                complete: written,
            },
            _ => SaveOutcome::Cancelled,
        })
    }

    fn write(&mut self, path: PathBuf) -> SaveState {
        let file = match File::create(&path) {
            Ok(file) => file,
            Err(source) => {
                let err = PersistError::Unwritable { path, source };
                warn!(error = %err, "save target rejected");
                self.operator.tell(&format!("{err}. Choose another file."));
                return SaveState::AwaitingName;
            }
        };

        // The writer (and file handle) drops at the end of this scope either way.
        let written = match write_batch(BufWriter::new(file), self.batch) {
            Ok(()) => {
                info!(path = %path.display(), count = self.batch.len(), "results saved");
                self.operator
                    .tell(&format!("Saved {} result(s) to {}", self.batch.len(), path.display()));
                true
            }
            Err(source) => {
                let err = PersistError::Serialization {
                    path: path.clone(),
                    source,
                };
                warn!(error = %err, "results not fully written");
                self.operator.tell(&err.to_string());
                false
            }
        };
        SaveState::Done { path, written }
    }
}

fn write_batch<W: Write>(mut writer: W, batch: &[TickerStats]) -> Result<(), serde_json::Error> {
    serde_json::to_writer(&mut writer, batch)?;
    writer.flush().map_err(serde_json::Error::io)
}

/// Negotiate a file name with the operator and save `batch` there as JSON.
pub fn persist<O: Operator + ?Sized>(
    batch: &[TickerStats],
    operator: &mut O,
) -> Result<SaveOutcome, PersistError> {
    Persister::new(batch, operator).run()
}

/// Read a saved batch back. Used to check what a previous run wrote.
pub fn load_batch(path: &Path) -> Result<Vec<TickerStats>, std::io::Error> {
    let file = File::open(path)?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(std::io::Error::from)
}
