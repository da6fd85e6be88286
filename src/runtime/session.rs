//! Everything the event loop mutates between two frames.
//!
//! A `Session` turns key commands, MPRIS requests, finished imports and
//! engine events into store dispatches, then keeps the playback engine and
//! the cursor in step with the result.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::{Action, Browse, Confirm, InputKind, Mode, Store};
use crate::audio::{Engine, EngineEvent, Permissions};
use crate::config::Settings;
use crate::library::{FileHandle, ImportRequest, TrackSource, TrackStore};
use crate::mpris::ControlCmd;

use super::import::{ImportDone, Importer, parse_file_list};
use super::keymap::Command;

pub struct Session<'a, S: TrackStore> {
    pub store: Store<S>,
    pub browse: Browse,
    pub engine: Engine,
    pub permissions: Permissions,
    /// Permission request that arrived while another prompt had the keyboard.
    deferred_permission: Option<FileHandle>,
    importer: Importer,
    settings: &'a Settings,
}

impl<'a, S: TrackStore> Session<'a, S> {
    pub fn new(store: Store<S>, engine: Engine, settings: &'a Settings) -> Self {
        Self {
            store,
            browse: Browse::default(),
            engine,
            permissions: Permissions::default(),
            deferred_permission: None,
            importer: Importer::new(settings.library.clone()),
            settings,
        }
    }

    /// Apply `action`, reporting a failed write in the status line.
    pub fn dispatch(&mut self, action: Action) {
        let name = action.name();
        if let Err(err) = self.store.dispatch(action) {
            self.browse.notice = Some(format!("{name} failed: {err}"));
        }
        self.browse.clamp(self.store.state().visible_ids().len());
        self.sync_engine();
    }

    fn sync_engine(&mut self) {
        if let Some(event) = self.engine.sync(self.store.state(), &self.permissions) {
            self.handle_engine_event(event);
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::NeedsPermission(handle) if self.browse.mode == Mode::Normal => {
                self.browse.pending_g = false;
                self.browse.mode = Mode::Permission(handle);
            }
            EngineEvent::NeedsPermission(handle) => {
                debug!(root = %handle.root().display(), "permission prompt deferred");
                self.deferred_permission = Some(handle);
            }
            EngineEvent::Failed(reason) => {
                self.browse.notice = Some(format!("cannot play: {reason}"));
                self.dispatch(Action::SetPlaying(false));
            }
            EngineEvent::Ended => self.track_ended(),
        }
    }

    /// Ask again for a deferred permission once the keyboard is free. The
    /// engine resolves from scratch, so a request for a track that is no
    /// longer current or no longer playing just goes away.
    fn raise_deferred_permission(&mut self) {
        if self.browse.mode != Mode::Normal || self.deferred_permission.take().is_none() {
            return;
        }
        self.engine.permission_answered();
        self.sync_engine();
    }

    fn track_ended(&mut self) {
        let state = self.store.state();
        if state.repeat() {
            self.engine.restart();
            return;
        }

        let before = state.current_id();
        self.dispatch(Action::Next);

        let state = self.store.state();
        if state.current_id() == before {
            // Next wrapped around to the same track, or had nowhere to go.
            let listed = before.is_some_and(|id| state.visible_ids().contains(&id));
            if listed {
                self.engine.restart();
            } else {
                self.dispatch(Action::SetPlaying(false));
            }
        } else {
            self.browse.follow_current(self.store.state());
        }
    }

    /// Collect finished imports and check the engine for end-of-track.
    pub fn tick(&mut self) {
        for done in self.importer.finished() {
            self.import_finished(done);
        }
        if let Some(event) = self.engine.poll() {
            self.handle_engine_event(event);
        }
        self.raise_deferred_permission();
    }

    pub fn start_import(&mut self, request: ImportRequest) {
        self.browse.imports_running += 1;
        self.importer.spawn(request);
    }

    fn import_finished(&mut self, done: ImportDone) {
        self.browse.imports_running = self.browse.imports_running.saturating_sub(1);

        // Picking a folder is what grants reads below it.
        if let ImportRequest::Directory(_) = done.request {
            for track in &done.tracks {
                if let TrackSource::Handle(handle) = &track.source {
                    self.permissions.grant(handle.root());
                }
            }
        }

        let before = self.store.state().tracks().len();
        let found = done.tracks.len();
        self.dispatch(Action::AddTracks(done.tracks));
        let added = self.store.state().tracks().len().saturating_sub(before);
        info!(found, added, "import applied");
        if found == 0 {
            self.browse.notice = Some("No audio files found".to_string());
        } else if self.browse.notice.is_none() || added > 0 {
            self.browse.notice = Some(format!("Added {added} of {found} tracks"));
        }
        self.browse.top();
    }

    fn toggle_play(&mut self) {
        if self.store.state().current_id().is_some() {
            self.dispatch(Action::TogglePlay);
        } else if let Some(id) = self.browse.selected_id(self.store.state()) {
            self.dispatch(Action::PlayTrack(id));
        }
    }

    fn change_track(&mut self, action: Action) {
        self.dispatch(action);
        self.browse.follow_current(self.store.state());
    }

    fn nudge_volume(&mut self, up: bool) {
        let step = self.settings.controls.volume_step;
        let volume = self.store.state().volume();
        let target = if up { volume + step } else { volume - step };
        self.dispatch(Action::SetVolume(target));
    }

    fn scrub_seconds(&self) -> i32 {
        self.settings.controls.scrub_seconds.min(i32::MAX as u64) as i32
    }

    /// Handle one key command. Returns `true` when the user asked to quit.
    pub fn handle_command(&mut self, cmd: Command) -> bool {
        if cmd == Command::G {
            if self.browse.pending_g {
                self.browse.pending_g = false;
                self.browse.top();
            } else {
                self.browse.pending_g = true;
            }
            return false;
        }
        self.browse.pending_g = false;

        let len = self.store.state().visible_ids().len();
        match cmd {
            Command::Quit => return true,
            Command::TogglePlay => self.toggle_play(),
            Command::Next => self.change_track(Action::Next),
            Command::Previous => self.change_track(Action::Previous),
            Command::Down => self.browse.down(len),
            Command::Up => self.browse.up(len),
            Command::G => {}
            Command::Bottom => self.browse.bottom(len),
            Command::PlaySelected => {
                if let Some(id) = self.browse.selected_id(self.store.state()) {
                    self.dispatch(Action::PlayTrack(id));
                }
            }
            Command::ScrubForward => self.engine.seek_by(self.scrub_seconds()),
            Command::ScrubBack => self.engine.seek_by(-self.scrub_seconds()),
            Command::Search => {
                let current = self.store.state().search().to_string();
                self.browse.begin_input(InputKind::Search, &current);
            }
            Command::SwitchView => {
                let view = self.store.state().view().toggled();
                self.dispatch(Action::SetView(view));
                self.browse.top();
            }
            Command::ToggleFavorite => {
                if let Some(id) = self.browse.selected_id(self.store.state()) {
                    self.dispatch(Action::ToggleFavorite(id));
                }
            }
            Command::ToggleShuffle => self.dispatch(Action::ToggleShuffle),
            Command::ToggleLoop => self.dispatch(Action::ToggleLoop),
            Command::VolumeUp => self.nudge_volume(true),
            Command::VolumeDown => self.nudge_volume(false),
            Command::OpenFolder => self.browse.begin_input(InputKind::OpenFolder, ""),
            Command::OpenFiles => self.browse.begin_input(InputKind::OpenFiles, ""),
            Command::Delete => {
                if let Some(id) = self.browse.selected_id(self.store.state()) {
                    self.browse.mode = Mode::Confirm(Confirm::DeleteTrack(id));
                }
            }
            Command::Clear => {
                if self.store.state().has_tracks() {
                    self.browse.mode = Mode::Confirm(Confirm::ClearLibrary);
                }
            }
            Command::Metadata => self.browse.metadata_window = !self.browse.metadata_window,
            Command::Escape => self.escape(),
            Command::Type(c) => {
                self.browse.input.push(c);
                self.live_search();
            }
            Command::Backspace => {
                self.browse.input.pop();
                self.live_search();
            }
            Command::Submit => self.submit(),
            Command::Yes => self.answer(true),
            Command::No => self.answer(false),
        }
        self.raise_deferred_permission();
        false
    }

    fn live_search(&mut self) {
        if self.browse.mode == Mode::Input(InputKind::Search) {
            let query = self.browse.input.clone();
            self.dispatch(Action::SetSearch(query));
            self.browse.top();
        }
    }

    fn escape(&mut self) {
        match self.browse.mode {
            Mode::Input(InputKind::Search) => {
                self.browse.finish_input();
                self.dispatch(Action::SetSearch(String::new()));
            }
            Mode::Input(_) => {
                self.browse.finish_input();
            }
            _ if self.browse.metadata_window => self.browse.metadata_window = false,
            _ if !self.store.state().search().is_empty() => {
                self.dispatch(Action::SetSearch(String::new()));
            }
            _ => self.browse.notice = None,
        }
    }

    fn submit(&mut self) {
        let Mode::Input(kind) = self.browse.mode else {
            return;
        };
        let text = self.browse.finish_input();
        match kind {
            InputKind::Search => {}
            InputKind::OpenFolder => {
                let text = text.trim();
                if !text.is_empty() {
                    self.start_import(ImportRequest::Directory(expand_home(text)));
                }
            }
            InputKind::OpenFiles => {
                let files: Vec<PathBuf> = parse_file_list(&text)
                    .iter()
                    .map(|p| expand_home(&p.to_string_lossy()))
                    .collect();
                if !files.is_empty() {
                    self.start_import(ImportRequest::Files(files));
                }
            }
        }
    }

    fn answer(&mut self, yes: bool) {
        match std::mem::take(&mut self.browse.mode) {
            Mode::Confirm(Confirm::DeleteTrack(id)) if yes => self.dispatch(Action::DeleteTrack(id)),
            Mode::Confirm(Confirm::ClearLibrary) if yes => self.dispatch(Action::ClearLibrary),
            Mode::Permission(handle) => {
                self.engine.permission_answered();
                if yes {
                    self.permissions.grant(handle.root());
                    self.sync_engine();
                } else {
                    info!(root = %handle.root().display(), "read access denied");
                    self.dispatch(Action::SetPlaying(false));
                }
            }
            _ => {}
        }
    }

    /// Handle a request from the MPRIS service. Returns `true` on quit.
    pub fn handle_control(&mut self, cmd: ControlCmd) -> bool {
        let playing = self.store.state().is_playing();
        match cmd {
            ControlCmd::Quit => return true,
            ControlCmd::Play if !playing => self.toggle_play(),
            ControlCmd::Play => {}
            ControlCmd::Pause => self.dispatch(Action::SetPlaying(false)),
            ControlCmd::PlayPause => self.toggle_play(),
            ControlCmd::Stop => {
                self.dispatch(Action::SetPlaying(false));
                self.engine.seek_to(Duration::ZERO);
            }
            ControlCmd::Next => self.change_track(Action::Next),
            ControlCmd::Prev => self.change_track(Action::Previous),
        }
        false
    }
}

/// Expand a leading `~` to `$HOME`.
fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest.trim_start_matches('/')),
            None => {
                warn!("HOME is not set; cannot expand ~");
                PathBuf::from(input)
            }
        },
        _ => PathBuf::from(input),
    }
}
