//! Note repository: the canonical collection plus write-through persistence.
//!
//! `NoteStore` is the single writer for note data. Every mutation persists
//! the entire collection synchronously before returning - full-value replace
//! under one fixed key, no batching, no async flush. Persistence failure is
//! logged and swallowed: the in-memory state stays authoritative for the
//! running session, a deliberate trade of durability for responsiveness.
//!
//! Mutations also notify subscribers so the shell can refresh its menus
//! without polling.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::model::{Note, NoteFrame, NoteId};
use crate::error::ResultExt;
use crate::storage::BlobStore;

/// Fixed key the serialized collection lives under.
pub const NOTES_BLOB_KEY: &str = "desktop_sticky_notes_v1";

/// Emitted after each committed mutation, carrying the affected note id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Created(NoteId),
    Updated(NoteId),
    FrameChanged(NoteId),
    Closed(NoteId),
    Reopened(NoteId),
    Deleted(NoteId),
}

type Subscriber = Box<dyn Fn(StoreEvent)>;

pub struct NoteStore {
    notes: Vec<Note>,
    blobs: Box<dyn BlobStore>,
    subscribers: Vec<Subscriber>,
}

impl NoteStore {
    /// Load the collection from the blob store. Unreadable or undecodable
    /// data degrades to an empty collection - never an error.
    pub fn new(blobs: Box<dyn BlobStore>) -> Self {
        let notes = load_notes(blobs.as_ref());
        NoteStore {
            notes,
            blobs,
            subscribers: Vec::new(),
        }
    }

    /// Register a change callback. Subscribers live as long as the store.
    pub fn subscribe(&mut self, subscriber: impl Fn(StoreEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Every note, insertion order, closed ones included.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Active notes in insertion order.
    pub fn active_notes(&self) -> Vec<Note> {
        self.notes.iter().filter(|n| !n.is_closed).cloned().collect()
    }

    /// Closed notes, most recently closed first.
    pub fn closed_notes(&self) -> Vec<Note> {
        let mut closed: Vec<Note> = self.notes.iter().filter(|n| n.is_closed).cloned().collect();
        // Descending; a missing closed_at (which the invariant rules out)
        // sorts last.
        closed.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
        closed
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Allocate a fresh note with default fields, append and persist it.
    pub fn create_note(&mut self) -> Note {
        let note = Note::new(NoteId::new());
        self.notes.push(note.clone());
        self.persist();
        info!(note_id = %note.id, "Note created");
        self.emit(StoreEvent::Created(note.id));
        note
    }

    /// Full replace of the record matching `note.id`. Last writer wins;
    /// a stale id (concurrently deleted) is a silent no-op.
    pub fn update(&mut self, note: Note) {
        let Some(idx) = self.position(note.id) else {
            debug!(note_id = %note.id, "Update for unknown note ignored");
            return;
        };
        let id = note.id;
        self.notes[idx] = note;
        self.persist();
        self.emit(StoreEvent::Updated(id));
    }

    /// Geometry-only partial update; same no-op policy as `update`.
    pub fn update_frame(&mut self, id: NoteId, frame: NoteFrame) {
        let Some(idx) = self.position(id) else {
            debug!(note_id = %id, "Frame update for unknown note ignored");
            return;
        };
        self.notes[idx].frame = frame;
        self.persist();
        self.emit(StoreEvent::FrameChanged(id));
    }

    /// Soft-close: hide the note but keep it recoverable. Idempotent - a
    /// second call leaves the original `closed_at` untouched.
    pub fn mark_closed(&mut self, id: NoteId) {
        let Some(idx) = self.position(id) else {
            debug!(note_id = %id, "Close for unknown note ignored");
            return;
        };
        if self.notes[idx].is_closed {
            return;
        }
        self.notes[idx].is_closed = true;
        self.notes[idx].closed_at = Some(Utc::now());
        self.persist();
        info!(note_id = %id, "Note closed");
        self.emit(StoreEvent::Closed(id));
    }

    /// Bring a closed note back; returns the updated record, or `None`
    /// when the id is gone.
    pub fn reopen(&mut self, id: NoteId) -> Option<Note> {
        let idx = self.position(id)?;
        self.notes[idx].is_closed = false;
        self.notes[idx].closed_at = None;
        self.persist();
        info!(note_id = %id, "Note reopened");
        self.emit(StoreEvent::Reopened(id));
        Some(self.notes[idx].clone())
    }

    /// Hard-delete: remove the record permanently. No-op when missing.
    pub fn delete(&mut self, id: NoteId) {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            debug!(note_id = %id, "Delete for unknown note ignored");
            return;
        }
        self.persist();
        info!(note_id = %id, "Note permanently deleted");
        self.emit(StoreEvent::Deleted(id));
    }

    fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|n| n.id == id)
    }

    fn emit(&self, event: StoreEvent) {
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }

    /// Write-through of the whole collection. Failures keep the in-memory
    /// state authoritative for this session; no retry, no replay queue.
    fn persist(&mut self) {
        let Some(json) = serde_json::to_string(&self.notes).log_err() else {
            return;
        };
        self.blobs.set(NOTES_BLOB_KEY, &json).log_err();
    }
}

fn load_notes(blobs: &dyn BlobStore) -> Vec<Note> {
    let Some(raw) = blobs.get(NOTES_BLOB_KEY).warn_on_err().flatten() else {
        return Vec::new();
    };
    let mut notes: Vec<Note> = match serde_json::from_str(&raw) {
        Ok(notes) => notes,
        Err(error) => {
            warn!(%error, "Stored notes undecodable, starting with an empty collection");
            return Vec::new();
        }
    };
    for note in &mut notes {
        if !note.frame.is_usable() {
            warn!(note_id = %note.id, "Restored frame unusable, reverting to default");
            note.frame = NoteFrame::default();
        }
    }
    debug!(count = notes.len(), "Notes loaded");
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::model::NoteState;
    use crate::storage::{FileStore, MemoryStore};
    use anyhow::{anyhow, Result};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::thread::sleep;
    use std::time::Duration;

    /// A store whose writes always fail, for the swallow-and-continue path.
    struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    fn memory_store() -> (NoteStore, MemoryStore) {
        let blobs = MemoryStore::new();
        (NoteStore::new(Box::new(blobs.clone())), blobs)
    }

    #[test]
    fn test_create_note_defaults_and_persists() {
        let (mut store, blobs) = memory_store();
        let note = store.create_note();

        assert!(note.text.is_empty());
        assert_eq!(note.state, NoteState::Normal);
        assert!(!note.is_pinned);
        assert!(!note.is_closed);
        assert!(note.closed_at.is_none());

        let raw = blobs.get(NOTES_BLOB_KEY).unwrap().expect("persisted");
        assert!(raw.contains(&note.id.to_string()));
    }

    #[test]
    fn test_get_reflects_last_write() {
        let (mut store, _) = memory_store();
        let mut note = store.create_note();

        note.text = "first".into();
        store.update(note.clone());
        note.text = "second".into();
        note.state = NoteState::Done;
        store.update(note.clone());

        let found = store.get(note.id).expect("present");
        assert_eq!(found.text, "second");
        assert_eq!(found.state, NoteState::Done);

        store.delete(note.id);
        assert!(store.get(note.id).is_none());
    }

    #[test]
    fn test_update_after_delete_is_a_no_op() {
        let (mut store, _) = memory_store();
        let mut note = store.create_note();
        store.delete(note.id);

        note.text = "ghost write".into();
        store.update(note.clone());
        store.update_frame(note.id, NoteFrame::new(1.0, 2.0, 300.0, 200.0));
        store.mark_closed(note.id);

        assert!(store.get(note.id).is_none());
        assert!(store.notes().is_empty());
    }

    #[test]
    fn test_mark_closed_is_idempotent() {
        let (mut store, _) = memory_store();
        let note = store.create_note();

        store.mark_closed(note.id);
        let first_closed_at = store.get(note.id).unwrap().closed_at;
        assert!(first_closed_at.is_some());

        sleep(Duration::from_millis(5));
        store.mark_closed(note.id);
        assert_eq!(store.get(note.id).unwrap().closed_at, first_closed_at);
    }

    #[test]
    fn test_closed_at_mirrors_is_closed() {
        let (mut store, _) = memory_store();
        let a = store.create_note();
        let b = store.create_note();
        store.mark_closed(a.id);
        store.reopen(a.id);
        store.mark_closed(b.id);

        for note in store.notes() {
            assert_eq!(note.is_closed, note.closed_at.is_some());
        }
    }

    #[test]
    fn test_closed_notes_most_recent_first() {
        let (mut store, _) = memory_store();
        let a = store.create_note();
        store.mark_closed(a.id);
        sleep(Duration::from_millis(5));
        let b = store.create_note();
        store.mark_closed(b.id);

        let closed: Vec<NoteId> = store.closed_notes().iter().map(|n| n.id).collect();
        assert_eq!(closed, vec![b.id, a.id]);

        let active = store.active_notes();
        assert!(active.is_empty());
    }

    #[test]
    fn test_active_notes_keep_insertion_order() {
        let (mut store, _) = memory_store();
        let a = store.create_note();
        let b = store.create_note();
        let c = store.create_note();
        store.mark_closed(b.id);

        let active: Vec<NoteId> = store.active_notes().iter().map(|n| n.id).collect();
        assert_eq!(active, vec![a.id, c.id]);
    }

    #[test]
    fn test_reopen_clears_closed_bits() {
        let (mut store, _) = memory_store();
        let note = store.create_note();
        store.mark_closed(note.id);

        let reopened = store.reopen(note.id).expect("reopened");
        assert!(!reopened.is_closed);
        assert!(reopened.closed_at.is_none());

        assert!(store.reopen(NoteId::new()).is_none());
    }

    #[test]
    fn test_collection_round_trips_through_serde() {
        let (mut store, _) = memory_store();

        // Empty
        let empty: Vec<Note> = serde_json::from_str(
            &serde_json::to_string(store.notes()).unwrap(),
        )
        .unwrap();
        assert!(empty.is_empty());

        // Many notes covering every state and both pin values
        for (i, state) in NoteState::ALL.iter().enumerate() {
            let mut note = store.create_note();
            note.text = format!("note {i}\nbody");
            note.state = *state;
            note.is_pinned = i % 2 == 0;
            note.frame = NoteFrame::new(10.0 * i as f64, -40.0, 340.0, 280.0);
            store.update(note);
        }
        store.mark_closed(store.notes()[1].id);

        let json = serde_json::to_string(store.notes()).unwrap();
        let decoded: Vec<Note> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, store.notes());
    }

    #[test]
    fn test_reload_from_disk() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let expected = {
            let blobs = FileStore::new(tmp.path());
            let mut store = NoteStore::new(Box::new(blobs));
            let mut note = store.create_note();
            note.text = "persisted across restart".into();
            note.is_pinned = true;
            store.update(note);
            let closed = store.create_note();
            store.mark_closed(closed.id);
            store.notes().to_vec()
        };

        let store = NoteStore::new(Box::new(FileStore::new(tmp.path())));
        assert_eq!(store.notes(), expected.as_slice());
    }

    #[test]
    fn test_garbage_blob_falls_back_to_empty() {
        let mut blobs = MemoryStore::new();
        blobs.set(NOTES_BLOB_KEY, "{definitely not json]").unwrap();
        let store = NoteStore::new(Box::new(blobs));
        assert!(store.notes().is_empty());
    }

    #[test]
    fn test_unusable_restored_frame_reverts_to_default() {
        let (mut store, blobs) = memory_store();
        let note = store.create_note();
        store.update_frame(note.id, NoteFrame::new(5.0, 5.0, 0.0, 0.0));

        let reloaded = NoteStore::new(Box::new(blobs));
        assert_eq!(reloaded.get(note.id).unwrap().frame, NoteFrame::default());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_authoritative() {
        let mut store = NoteStore::new(Box::new(BrokenStore));
        let note = store.create_note();
        store.mark_closed(note.id);

        let found = store.get(note.id).expect("still in memory");
        assert!(found.is_closed);
    }

    #[test]
    fn test_mutations_notify_subscribers() {
        let (mut store, _) = memory_store();
        let seen: Rc<RefCell<Vec<StoreEvent>>> = Rc::default();
        let sink = Rc::clone(&seen);
        store.subscribe(move |event| sink.borrow_mut().push(event));

        let note = store.create_note();
        store.update_frame(note.id, NoteFrame::new(0.0, 0.0, 400.0, 300.0));
        store.mark_closed(note.id);
        store.reopen(note.id);
        store.delete(note.id);
        // Stale ids notify nobody
        store.mark_closed(note.id);

        assert_eq!(
            *seen.borrow(),
            vec![
                StoreEvent::Created(note.id),
                StoreEvent::FrameChanged(note.id),
                StoreEvent::Closed(note.id),
                StoreEvent::Reopened(note.id),
                StoreEvent::Deleted(note.id),
            ]
        );
    }
}
