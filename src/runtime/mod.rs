use std::env;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use crate::app::{Action, Store};
use crate::audio::AudioPlayer;
use crate::library::SqliteStore;
use crate::mpris::ControlCmd;

mod event_loop;
mod import;
mod keymap;
mod logging;
mod mpris_sync;
mod session;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings::LoadedSettings {
        settings,
        fallback_reason,
    } = settings::load_settings();
    if let Some(log) = logging::init(&settings) {
        info!(log = %log.display(), "hearth starting");
    }
    if let Some(reason) = fallback_reason {
        warn!(%reason, "running with default settings");
    }

    let db_path = settings
        .database_path()
        .ok_or("cannot locate a data directory; set library.database_path")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = SqliteStore::open(&db_path)?;

    let mut store = Store::new(storage);
    if let Err(err) = store.dispatch(Action::LoadLibrary) {
        // Start with an empty library rather than refusing to run.
        error!(%err, db = %db_path.display(), "could not load library");
        eprintln!("hearth: could not load library: {err}");
    }
    startup::apply_playback_defaults(&mut store, &settings);

    let audio_player = AudioPlayer::start();
    let mut session = session::Session::new(store, audio_player.engine(), &settings);

    for request in import::requests_from_args(env::args_os().skip(1).map(PathBuf::from)) {
        session.start_import(request);
    }

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);
    mpris_sync::update_mpris(&mpris, session.store.state());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut session, &mpris, &control_rx);

    audio_player.shutdown(Duration::from_millis(settings.audio.quit_fade_out_ms));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("hearth stopped");
    run_result
}
