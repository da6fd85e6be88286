//! Application module: the state store used by the TUI and runtime.
//!
//! `AppState` and the `Action` vocabulary live in `app::model`; the `Store`
//! that applies actions and mirrors them to storage lives in `app::store`.
//! Cursor and input modes of the terminal UI live in `app::browse`.

mod browse;
mod model;
mod store;

pub use browse::{Browse, Confirm, InputKind, Mode};
pub use model::{Action, AppState, View};
pub use store::Store;

#[cfg(test)]
mod tests;
