//! Cursor, input modes and pop-up state of the terminal UI.
//!
//! None of this is persisted or shared with the application store.

use crate::library::{FileHandle, TrackId};

use super::model::AppState;

/// What a text prompt is collecting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    Search,
    OpenFolder,
    OpenFiles,
}

/// Destructive actions waiting for a y/n answer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Confirm {
    DeleteTrack(TrackId),
    ClearLibrary,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    Input(InputKind),
    Confirm(Confirm),
    /// Waiting for the user to allow reads below a picked folder.
    Permission(FileHandle),
}

#[derive(Debug, Default)]
pub struct Browse {
    /// Position in the visible subset.
    pub cursor: usize,
    pub mode: Mode,
    pub input: String,
    pub metadata_window: bool,
    /// One-line message shown in the status box.
    pub notice: Option<String>,
    /// Imports still running on worker threads.
    pub imports_running: usize,
    /// Two-key `gg` prefix.
    pub pending_g: bool,
}

impl Browse {
    /// True while a text field owns the keyboard.
    pub fn input_focused(&self) -> bool {
        matches!(self.mode, Mode::Input(_))
    }

    pub fn selected_id(&self, state: &AppState) -> Option<TrackId> {
        state.visible_ids().get(self.cursor).copied()
    }

    /// Keep the cursor inside a list of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    /// Move down one row, wrapping to the top.
    pub fn down(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    /// Move up one row, wrapping to the bottom.
    pub fn up(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    pub fn top(&mut self) {
        self.cursor = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.cursor = len.saturating_sub(1);
    }

    /// Put the cursor on the current track if it is listed.
    pub fn follow_current(&mut self, state: &AppState) {
        if let Some(current) = state.current_id() {
            if let Some(pos) = state.visible_ids().iter().position(|&id| id == current) {
                self.cursor = pos;
            }
        }
    }

    pub fn begin_input(&mut self, kind: InputKind, initial: &str) {
        self.pending_g = false;
        self.input = initial.to_string();
        self.mode = Mode::Input(kind);
    }

    /// Leave the current mode and hand back whatever was typed.
    pub fn finish_input(&mut self) -> String {
        self.mode = Mode::Normal;
        std::mem::take(&mut self.input)
    }
}
