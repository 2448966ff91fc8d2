// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Stream appliers - delivering a fragment stream to its destination.
//!
//! Two delivery modes exist:
//!
//! - **Progressive render**: each fragment is appended verbatim to a
//!   [`ChatSink`] as it arrives. A mid-stream failure leaves the emitted
//!   output in place and is returned to the caller.
//! - **Buffer replace**: the target buffer is cleared in full, then each
//!   fragment is appended at the continuously advancing tail. A mid-stream
//!   failure is rendered into the buffer as a final visible fragment rather
//!   than propagated; this error-as-content behavior is deliberate.
//!
//! Both modes are strictly sequential: fragment N+1 is never pulled before
//! fragment N has been applied. Cancellation is cooperative - the consumer
//! stops pulling, and whatever was already applied remains.

use std::path::Path;

use tracing::warn;

use crate::error::{EditError, ProviderError};
use crate::types::FragmentStream;

// ============================================================================
// Progressive Render
// ============================================================================

/// Destination for progressively rendered chat output.
///
/// Implemented by the host chat surface; the CLI binary ships a terminal
/// implementation and tests use an in-memory one.
pub trait ChatSink: Send {
    /// Append a fragment of markdown output.
    fn markdown(&mut self, fragment: &str);

    /// Report transient progress (e.g. "Thinking ...").
    fn progress(&mut self, _message: &str) {}

    /// Echo an attached file reference back to the user.
    fn reference(&mut self, _path: &Path) {}
}

/// Render a fragment stream progressively into a sink.
///
/// Fragments are forwarded in arrival order with no buffering or
/// coalescing. On failure the already-rendered output is not retracted;
/// the error is returned for the caller to handle.
pub async fn render_markdown(
    mut stream: FragmentStream,
    sink: &mut dyn ChatSink,
) -> Result<(), ProviderError> {
    while let Some(item) = stream.next().await {
        sink.markdown(&item?);
    }
    Ok(())
}

/// A [`ChatSink`] that collects output into a string. Useful for tests and
/// for callers that want the full response after the fact.
#[derive(Debug, Default)]
pub struct CollectingSink {
    output: String,
    progress: Vec<String>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn progress_messages(&self) -> &[String] {
        &self.progress
    }
}

impl ChatSink for CollectingSink {
    fn markdown(&mut self, fragment: &str) {
        self.output.push_str(fragment);
    }

    fn progress(&mut self, message: &str) {
        self.progress.push(message.to_string());
    }
}

// ============================================================================
// Buffer Replace
// ============================================================================

/// An editable text buffer.
///
/// Each operation is all-or-nothing; a failed edit is fatal for the
/// current request and is never retried. Concurrent external edits during
/// streaming are not coordinated against - a host document may interleave
/// them unpredictably, which is a documented limitation.
pub trait EditBuffer: Send {
    /// Delete the entire contents.
    fn clear_all(&mut self) -> Result<(), EditError>;

    /// Insert text at the end of the last line.
    fn append_at_end(&mut self, text: &str) -> Result<(), EditError>;

    /// Current full contents.
    fn contents(&self) -> String;
}

/// Replace a buffer's contents with a fragment stream.
///
/// Clears the full extent first, then appends each fragment at the tail.
/// If the stream fails mid-sequence, the error's message text is appended
/// as the final fragment so the failure is visible in the rebuilt buffer;
/// the function still returns `Ok`. Only an edit failure is an error here.
pub async fn replace_with_stream(
    buffer: &mut dyn EditBuffer,
    mut stream: FragmentStream,
) -> Result<(), EditError> {
    buffer.clear_all()?;

    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => buffer.append_at_end(&fragment)?,
            Err(err) => {
                warn!(code = err.code(), "response stream failed mid-edit");
                buffer.append_at_end(&err.to_string())?;
                return Ok(());
            }
        }
    }

    Ok(())
}

/// In-memory line-oriented [`EditBuffer`].
///
/// Models an editor document: the buffer always has at least one line, and
/// the append position is the end of the last line.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl TextBuffer {
    /// Create an empty buffer (a single empty line).
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    /// Create a buffer holding existing text.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(String::from).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditBuffer for TextBuffer {
    fn clear_all(&mut self) -> Result<(), EditError> {
        self.lines = vec![String::new()];
        Ok(())
    }

    fn append_at_end(&mut self, text: &str) -> Result<(), EditError> {
        let mut tail = self.lines.pop().unwrap_or_default();
        tail.push_str(text);
        self.lines.extend(tail.split('\n').map(String::from));
        Ok(())
    }

    fn contents(&self) -> String {
        self.lines.join("\n")
    }
}
