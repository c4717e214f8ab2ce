//! Window coordination: at most one live window per active note.
//!
//! The coordinator maps note identities to window handles, translates
//! window lifecycle events into repository operations, and guards the two
//! teardown transitions that look identical at the window level:
//!
//! - a **delete** is followed by the platform's own close sequence, and the
//!   close must not re-record the note as soft-closed (delete wins);
//! - a **quit-time teardown** destroys every window, and none of those
//!   closes are user intent - the notes stay active and reopen on launch.
//!
//! The first is handled by a tagged per-window phase set before the close
//! sequence fires; the second by the coordinator-wide terminating flag,
//! which the shell must raise before any window is torn down.

use std::collections::HashMap;

use tracing::{debug, info};

use super::model::{Note, NoteFrame, NoteId};
use super::store::{NoteStore, StoreEvent};

/// Stacking level for a note window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLevel {
    Normal,
    /// Above normal windows; used for pinned notes.
    Floating,
}

impl WindowLevel {
    pub fn for_note(note: &Note) -> Self {
        if note.is_pinned {
            WindowLevel::Floating
        } else {
            WindowLevel::Normal
        }
    }
}

/// A live note window, owned exclusively by the coordinator.
pub trait NoteWindow {
    /// Raise the window above its peers and focus it.
    fn bring_to_front(&mut self);
    /// Apply a stacking level; called whenever the pin flag changes.
    fn set_level(&mut self, level: WindowLevel);
    /// Start the platform close sequence. A `Closing` event follows once
    /// the window actually goes away.
    fn close(&mut self);
}

/// Constructs windows - the rendering side of the seam. The backend opens
/// the window at `note.frame` with the level implied by `note.is_pinned`.
pub trait WindowBackend {
    fn open(&mut self, note: &Note) -> Box<dyn NoteWindow>;
}

/// Lifecycle events a window reports back to the coordinator.
#[derive(Debug, Clone)]
pub enum NoteWindowEvent {
    /// Text, state, or pin edited inside the window.
    Changed(Note),
    MovedOrResized(NoteId, NoteFrame),
    /// The window is going away, carrying its final geometry. Not
    /// necessarily user intent - see the phase and terminating guards.
    Closing(NoteId, NoteFrame),
    /// Explicit delete issued from inside the window.
    DeleteRequested(NoteId),
}

/// Phase of a live window slot. `Deleting` suppresses the soft-close that
/// would otherwise fire from the same teardown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowPhase {
    Open,
    Deleting,
}

struct WindowSlot {
    window: Box<dyn NoteWindow>,
    phase: WindowPhase,
}

pub struct WindowCoordinator {
    store: NoteStore,
    backend: Box<dyn WindowBackend>,
    windows: HashMap<NoteId, WindowSlot>,
    terminating: bool,
}

impl WindowCoordinator {
    pub fn new(store: NoteStore, backend: Box<dyn WindowBackend>) -> Self {
        WindowCoordinator {
            store,
            backend,
            windows: HashMap::new(),
            terminating: false,
        }
    }

    /// Create a fresh note and open its window.
    pub fn create_new_note(&mut self) -> Note {
        let note = self.store.create_note();
        self.open_window(&note);
        note
    }

    /// Open a window for every active note. Runs once at startup.
    pub fn restore_on_launch(&mut self) {
        let active = self.store.active_notes();
        info!(count = active.len(), "Restoring note windows");
        for note in &active {
            self.open_window(note);
        }
    }

    /// Reopen one closed note and give it a window. Stale ids are ignored.
    pub fn reopen_closed_note(&mut self, id: NoteId) {
        let Some(note) = self.store.reopen(id) else {
            debug!(note_id = %id, "Reopen for unknown note ignored");
            return;
        };
        self.open_window(&note);
    }

    /// Reopen every closed note, most recently closed first. The id list
    /// is snapshotted up front so reopening doesn't mutate the list being
    /// iterated.
    pub fn reopen_all_closed_notes(&mut self) {
        let ids: Vec<NoteId> = self.store.closed_notes().iter().map(|n| n.id).collect();
        for id in ids {
            self.reopen_closed_note(id);
        }
    }

    /// Must be called before the process starts tearing down windows at
    /// quit, ahead of any `Closing` events. Window teardown after this is
    /// not recorded as a user close.
    pub fn prepare_for_termination(&mut self) {
        self.terminating = true;
        info!("Preparing for termination; window teardown will not close notes");
    }

    /// Feed one window event through the state machine. Events are handled
    /// to completion in delivery order.
    pub fn handle_event(&mut self, event: NoteWindowEvent) {
        match event {
            NoteWindowEvent::Changed(note) => {
                // Reassert the stacking level so a pin toggle takes effect
                // immediately.
                if let Some(slot) = self.windows.get_mut(&note.id) {
                    slot.window.set_level(WindowLevel::for_note(&note));
                }
                self.store.update(note);
            }
            NoteWindowEvent::MovedOrResized(id, frame) => {
                self.store.update_frame(id, frame);
            }
            NoteWindowEvent::Closing(id, frame) => {
                self.store.update_frame(id, frame);
                match self.windows.remove(&id) {
                    Some(slot)
                        if slot.phase == WindowPhase::Open && !self.terminating =>
                    {
                        self.store.mark_closed(id);
                    }
                    Some(_) => {
                        // Deleting or terminating: the window goes away but
                        // the note's fate was already decided.
                        debug!(note_id = %id, "Window closed without marking note");
                    }
                    None => {
                        debug!(note_id = %id, "Closing event for unknown window ignored");
                    }
                }
            }
            NoteWindowEvent::DeleteRequested(id) => self.delete_note(id),
        }
    }

    /// Read accessors for menu population.
    pub fn active_notes(&self) -> Vec<Note> {
        self.store.active_notes()
    }

    pub fn closed_notes(&self) -> Vec<Note> {
        self.store.closed_notes()
    }

    pub fn find(&self, id: NoteId) -> Option<&Note> {
        self.store.get(id)
    }

    /// Register a repository change callback (menu refresh and the like).
    pub fn subscribe(&mut self, subscriber: impl Fn(StoreEvent) + 'static) {
        self.store.subscribe(subscriber);
    }

    pub fn has_window(&self, id: NoteId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Idempotent open: an existing window is brought to the front instead
    /// of duplicated.
    fn open_window(&mut self, note: &Note) {
        if let Some(slot) = self.windows.get_mut(&note.id) {
            debug!(note_id = %note.id, "Window already open, bringing to front");
            slot.window.bring_to_front();
            return;
        }
        let window = self.backend.open(note);
        self.windows.insert(
            note.id,
            WindowSlot {
                window,
                phase: WindowPhase::Open,
            },
        );
    }

    fn delete_note(&mut self, id: NoteId) {
        // Flag the slot before the platform close sequence fires so the
        // trailing Closing event cannot re-mark the note as closed.
        if let Some(slot) = self.windows.get_mut(&id) {
            slot.phase = WindowPhase::Deleting;
            slot.window.close();
        }
        self.store.delete(id);
    }
}
