use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config;
use crate::library::TrackStore;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::keymap::command_for;
use crate::runtime::mpris_sync::update_mpris;
use crate::runtime::session::Session;
use crate::ui;

/// Main terminal event loop: handles input, UI drawing, sync with the audio
/// thread and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<S: TrackStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    session: &mut Session<'_, S>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        session.tick();

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        update_mpris(mpris, session.store.state());

        let progress = session.engine.progress();
        terminal.draw(|f| {
            ui::draw(
                f,
                session.store.state(),
                &session.browse,
                progress,
                &settings.ui,
                &settings.controls,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if session.handle_control(cmd) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(cmd) = command_for(key, &session.browse.mode) {
                    if session.handle_command(cmd) {
                        return Ok(());
                    }
                }
            }
        }
    }
}
