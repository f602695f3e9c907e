//! Driving the external picker process.
//!
//! The picker is opaque: it gets the encoded payload on stdin and prints the
//! chosen line on stdout. A non-zero exit (ESC, Ctrl-C, no match) or empty
//! output is a cancellation, not an error. Only failing to run the program at
//! all is reported as `AzfError::SelectorError`.

use crate::core::config::{ColumnWidths, SelectorConfig};
use crate::core::error::AzfError;
use crate::core::resource::Resource;
use crate::plugins::selector;
use std::io::{self, ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Raw result of one picker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutput {
    /// The picker exited successfully and printed this (possibly empty) text.
    Chosen(String),
    /// The picker exited non-zero.
    Aborted(Option<i32>),
}

/// Outcome of an interactive selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Selected(Resource),
    Cancelled,
}

pub trait Picker {
    fn pick(&self, payload: &str, initial_query: &str) -> Result<PickerOutput, AzfError>;
}

/// fzf, or anything accepting fzf's flags.
pub struct FzfPicker {
    config: SelectorConfig,
}

impl FzfPicker {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    /// Arguments passed to the picker for a given initial query.
    pub fn args(&self, initial_query: &str) -> Vec<String> {
        vec![
            "--ansi".to_string(),
            "--delimiter".to_string(),
            selector::FIELD_DELIMITER.to_string(),
            "--with-nth".to_string(),
            selector::field::VISIBLE.to_string(),
            "--nth".to_string(),
            format!("1..{}", selector::FIELD_COUNT),
            "--preview".to_string(),
            selector::preview_template(),
            "--preview-window".to_string(),
            self.config.preview_window.clone(),
            format!("--query={initial_query}"),
        ]
    }

    fn spawn_error(&self, source: io::Error) -> AzfError {
        AzfError::SelectorError {
            program: self.config.program.clone(),
            source,
        }
    }
}

impl Picker for FzfPicker {
    fn pick(&self, payload: &str, initial_query: &str) -> Result<PickerOutput, AzfError> {
        let mut child = Command::new(&self.config.program)
            .args(self.args(initial_query))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Feed stdin from its own thread: a picker that echoes while still
        // reading would otherwise fill stdout and block us both.
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = stdin.map(|mut stdin| {
                scope.spawn(move || match stdin.write_all(payload.as_bytes()) {
                    // The picker may exit before reading everything (e.g. Ctrl-C right away).
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(()),
                })
            });
            let output = child.wait_with_output();
            let written = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (output, written)
        });
        let output = output.map_err(|e| self.spawn_error(e))?;
        written.map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            debug!(code = ?output.status.code(), "picker exited without a selection");
            return Ok(PickerOutput::Aborted(output.status.code()));
        }
        Ok(PickerOutput::Chosen(
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

/// Map a raw picker result onto `resources`.
pub fn resolve(output: PickerOutput, resources: &[Resource]) -> Selection {
    let text = match output {
        PickerOutput::Aborted(_) => return Selection::Cancelled,
        PickerOutput::Chosen(text) => text,
    };
    match selector::decode_selection(&text, resources) {
        Some(r) => Selection::Selected(r.clone()),
        None => {
            if !text.trim().is_empty() {
                debug!(line = %text.trim_end(), "picker output did not resolve to a cached resource");
            }
            Selection::Cancelled
        }
    }
}

/// Encode `resources`, run the picker, and decode its answer.
///
/// An empty resource set is cancelled without launching the picker.
pub fn select_resource<P: Picker + ?Sized>(
    picker: &P,
    resources: &[Resource],
    initial_query: &str,
    widths: &ColumnWidths,
) -> Result<Selection, AzfError> {
    if resources.is_empty() {
        return Ok(Selection::Cancelled);
    }
    let payload = selector::encode_payload(resources, widths);
    let output = picker.pick(&payload, initial_query)?;
    Ok(resolve(output, resources))
}
