//! Translating key presses into runtime commands.
//!
//! Which keys mean what depends on the UI mode: while a text prompt has
//! focus every printable key is typed into it, so global shortcuts such as
//! `space` or `ctrl+arrow` are suppressed.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Mode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePlay,
    Next,
    Previous,
    Down,
    Up,
    /// First half of `gg`.
    G,
    Bottom,
    PlaySelected,
    ScrubForward,
    ScrubBack,
    Search,
    SwitchView,
    ToggleFavorite,
    ToggleShuffle,
    ToggleLoop,
    VolumeUp,
    VolumeDown,
    OpenFolder,
    OpenFiles,
    Delete,
    Clear,
    Metadata,
    /// Close pop-ups / clear the search.
    Escape,
    Type(char),
    Backspace,
    Submit,
    Yes,
    No,
}

pub fn command_for(key: KeyEvent, mode: &Mode) -> Option<Command> {
    match mode {
        Mode::Normal => normal_command(key),
        Mode::Input(_) => input_command(key),
        Mode::Confirm(_) | Mode::Permission(_) => answer_command(key),
    }
}

fn normal_command(key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let cmd = match key.code {
        KeyCode::Right if ctrl => Command::Next,
        KeyCode::Left if ctrl => Command::Previous,
        KeyCode::Char(' ') | KeyCode::Char('p') => Command::TogglePlay,
        KeyCode::Char('l') => Command::Next,
        KeyCode::Char('h') => Command::Previous,
        KeyCode::Char('j') | KeyCode::Down => Command::Down,
        KeyCode::Char('k') | KeyCode::Up => Command::Up,
        KeyCode::Char('g') => Command::G,
        KeyCode::Char('G') => Command::Bottom,
        KeyCode::Enter => Command::PlaySelected,
        KeyCode::Char('L') => Command::ScrubForward,
        KeyCode::Char('H') => Command::ScrubBack,
        KeyCode::Char('/') => Command::Search,
        KeyCode::Tab => Command::SwitchView,
        KeyCode::Char('f') => Command::ToggleFavorite,
        KeyCode::Char('s') => Command::ToggleShuffle,
        KeyCode::Char('r') => Command::ToggleLoop,
        KeyCode::Char('+') | KeyCode::Char('=') => Command::VolumeUp,
        KeyCode::Char('-') => Command::VolumeDown,
        KeyCode::Char('o') => Command::OpenFolder,
        KeyCode::Char('O') => Command::OpenFiles,
        KeyCode::Char('d') => Command::Delete,
        KeyCode::Char('X') => Command::Clear,
        KeyCode::Char('K') => Command::Metadata,
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Esc => Command::Escape,
        _ => return None,
    };
    Some(cmd)
}

fn input_command(key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Esc => Some(Command::Escape),
        KeyCode::Enter => Some(Command::Submit),
        KeyCode::Backspace => Some(Command::Backspace),
        KeyCode::Char(c) if !c.is_control() && !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Type(c))
        }
        _ => None,
    }
}

fn answer_command(key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Command::Yes),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Command::No),
        _ => None,
    }
}
