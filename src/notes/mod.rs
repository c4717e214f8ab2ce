//! Sticky note lifecycle: model, repository, window coordination.
//!
//! ## Architecture
//! Three layers, leaves first. The model is plain data. `NoteStore` owns the
//! canonical collection and its write-through persistence - no knowledge of
//! windows. `WindowCoordinator` owns the store plus the id-to-window arena
//! and turns window lifecycle events into repository calls, keeping at most
//! one live window per active note.
//!
//! Everything runs on one logical control thread; events are handled to
//! completion in delivery order.
//!
//! ## Usage
//! ```ignore
//! use sticky_notes::notes::{NoteStore, WindowCoordinator};
//! use sticky_notes::storage::FileStore;
//!
//! let store = NoteStore::new(Box::new(FileStore::new(config.data_dir)));
//! let mut coordinator = WindowCoordinator::new(store, shell_backend);
//! coordinator.restore_on_launch();
//! ```

mod coordinator;
mod model;
mod store;

pub use coordinator::{
    NoteWindow, NoteWindowEvent, WindowBackend, WindowCoordinator, WindowLevel,
};
pub use model::{Note, NoteFrame, NoteId, NoteState, MIN_NOTE_HEIGHT, MIN_NOTE_WIDTH};
pub use store::{NoteStore, StoreEvent, NOTES_BLOB_KEY};
