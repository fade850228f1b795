//! Core form model for intake.
//!
//! This crate defines the live form state and its per-kind field edits,
//! the [`FormStateStore`] that owns it, the immutable [`SubmittedRecord`]
//! derived on commit, and the key-value persistence the record is written
//! to.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use model::{
    Attachment, ChoiceSet, FieldEdit, FieldName, FormOptions, FormState, MediaType, MultiChoice,
    SubmittedRecord, TextField,
};
pub use schema::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::FormStateStore;
