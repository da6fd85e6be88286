//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{AppState, Browse, Confirm, InputKind, Mode, View};
use crate::config::{ControlsSettings, UiSettings};
use crate::library::Track;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("space", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("/", "search");
    map.insert("tab", "library/favorites");
    map.insert("f", "favorite");
    map.insert("s", "shuffle");
    map.insert("r", "loop");
    map.insert("+/-", "volume");
    map.insert("o/O", "open folder/files");
    map.insert("d/X", "delete/clear");
    map.insert("K", "metadata");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space", "gg/G", "/", "tab", "f", "s", "r", "+/-", "o/O",
        "d/X", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{scrub_seconds}s"))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Format a duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Duration) -> String {
    if d.is_zero() {
        return "-".to_string();
    }

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes}:{seconds:02} ({total_secs}s)")
}

/// One list row: markers, title and artist.
fn row_text(track: &Track, now_playing: bool) -> String {
    let marker = if now_playing { "♪" } else { " " };
    let heart = if track.favorite { "♥" } else { " " };
    let length = if track.duration.is_zero() {
        String::new()
    } else {
        format!("  [{}]", format_mmss(track.duration))
    };
    format!("{marker}{heart} {} - {}{length}", track.title, track.artist)
}

/// Fraction of the track played, for the progress gauge.
fn progress_ratio(position: Duration, total: Option<Duration>) -> f64 {
    match total {
        Some(t) if !t.is_zero() => (position.as_secs_f64() / t.as_secs_f64()).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn progress_label(position: Duration, total: Option<Duration>) -> String {
    match total {
        Some(t) => format!("{} / {}", format_mmss(position), format_mmss(t)),
        None => format_mmss(position),
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    state: &AppState,
    browse: &Browse,
    progress: Option<(Duration, Option<Duration>)>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state, browse, ui_settings);
    draw_status(frame, chunks[1], state, browse, progress);
    draw_list(frame, chunks[2], state, browse);

    if browse.metadata_window {
        draw_metadata(frame, chunks[2], state, browse);
    }
    draw_prompt(frame, chunks[2], state, browse);

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(left_padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState, browse: &Browse, ui: &UiSettings) {
    let tab = |label: &'static str, view: View| {
        if state.view() == view {
            Span::styled(format!("[{label}]"), Style::default().add_modifier(Modifier::BOLD))
        } else {
            Span::raw(format!(" {label} "))
        }
    };

    let mut spans = vec![
        tab("Library", View::Library),
        Span::raw(" "),
        tab("Favorites", View::Favorites),
        Span::raw("   "),
    ];
    if browse.mode == Mode::Input(InputKind::Search) {
        spans.push(Span::raw(format!("search: {}_", browse.input)));
    } else if !state.search().is_empty() {
        spans.push(Span::raw(format!("search: {}", state.search())));
    } else {
        spans.push(Span::raw(ui.header_text.as_str()).italic());
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" hearth ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, area);
}

fn draw_status(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    browse: &Browse,
    progress: Option<(Duration, Option<Duration>)>,
) {
    let block = Block::bordered().title(" status ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let now_playing = match state.current_track() {
        Some(track) => {
            let what = if state.is_playing() { "Playing" } else { "Paused" };
            format!(" {what}: {} - {}", track.title, track.artist)
        }
        None => " Stopped".to_string(),
    };
    frame.render_widget(Paragraph::new(now_playing), rows[0]);

    let (position, total) = progress.unwrap_or((Duration::ZERO, None));
    let gauge = Gauge::default()
        .ratio(progress_ratio(position, total))
        .label(progress_label(position, total))
        .use_unicode(true);
    frame.render_widget(gauge, rows[1]);

    let mut parts = vec![
        format!(" SHUFFLE: {}", if state.shuffle() { "On" } else { "Off" }),
        format!("LOOP: {}", if state.repeat() { "Repeat-one" } else { "Off" }),
        format!("VOLUME: {:>3}%", (state.volume() * 100.0).round() as u32),
        format!("TRACKS: {}/{}", state.visible_ids().len(), state.tracks().len()),
    ];
    if browse.imports_running > 0 {
        parts.push("Importing…".to_string());
    }
    if let Some(notice) = &browse.notice {
        parts.push(notice.clone());
    }
    frame.render_widget(Paragraph::new(parts.join(" • ")), rows[2]);
}

fn draw_list(frame: &mut Frame, area: Rect, state: &AppState, browse: &Browse) {
    let ids = state.visible_ids();
    let total = ids.len();
    let title = match state.view() {
        View::Library => " library ",
        View::Favorites => " favorites ",
    };

    if total == 0 {
        let hint = if state.has_tracks() {
            "Nothing matches."
        } else {
            "Library is empty. Press [o] to open a folder or [O] to add files."
        };
        let empty = Paragraph::new(hint)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, area);
        return;
    }

    // Center the selected item when possible by creating a visible window.
    // Only build ListItems for the visible window.
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = browse.cursor.min(total - 1);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let current = state.current_id();
    let items: Vec<ListItem> = ids[start..end]
        .iter()
        .filter_map(|&id| state.track(id))
        .map(|track| {
            let playing = track.id.is_some() && track.id == current;
            let item = ListItem::new(row_text(track, playing));
            if playing {
                item.bold()
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    list_state.select(Some(selected_pos_in_visible));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_metadata(frame: &mut Frame, list_area: Rect, state: &AppState, browse: &Browse) {
    // Keep the popup inside the list area so it doesn't cover header/status/footer.
    let popup_area = centered_rect_sized(72, 10, list_area);
    frame.render_widget(Clear, popup_area);

    let meta = match browse.selected_id(state).and_then(|id| state.track(id)) {
        Some(track) => format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nFormat: {}\nPath: {}\nFavorite: {}",
            track.title,
            track.artist,
            track.album,
            format_duration_mmss_ceil(track.duration),
            if track.format.is_empty() { "-" } else { track.format.as_str() },
            track.path,
            if track.favorite { "yes" } else { "no" },
        ),
        None => "No track selected".to_string(),
    };
    let meta_paragraph = Paragraph::new(meta)
        .block(left_padded(" metadata (K closes) "))
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

fn draw_prompt(frame: &mut Frame, list_area: Rect, state: &AppState, browse: &Browse) {
    let (title, body) = match &browse.mode {
        Mode::Normal | Mode::Input(InputKind::Search) => return,
        Mode::Input(InputKind::OpenFolder) => (
            " open folder (enter to import, esc to cancel) ",
            format!("{}_", browse.input),
        ),
        Mode::Input(InputKind::OpenFiles) => (
            " open files, comma separated (enter to import, esc to cancel) ",
            format!("{}_", browse.input),
        ),
        Mode::Confirm(Confirm::DeleteTrack(id)) => {
            let name = state
                .track(*id)
                .map(|t| t.title.as_str())
                .unwrap_or("this track");
            (" confirm ", format!("Delete \"{name}\" from the library? [y/n]"))
        }
        Mode::Confirm(Confirm::ClearLibrary) => (
            " confirm ",
            "Delete every track from the library? [y/n]".to_string(),
        ),
        Mode::Permission(handle) => (
            " permission ",
            format!(
                "Allow reading files below {}? [y/n]",
                handle.root().display()
            ),
        ),
    };

    let area = centered_rect_sized(72, 5, list_area);
    frame.render_widget(Clear, area);
    let prompt = Paragraph::new(body)
        .block(left_padded(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(prompt, area);
}
