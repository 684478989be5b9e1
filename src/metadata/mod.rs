//! Per-file test metadata, missing-test suggestions and review comments.
//!
//! [`MetadataStore`] is the single shared mutable resource of the server. It
//! is constructed once at start-up and handed to the protocol layer (and any
//! other front end) behind an `Arc`.
//!
//! # Merge rules
//!
//! | Kind            | Identity                 | On collision             |
//! |-----------------|--------------------------|--------------------------|
//! | Test reference  | `(testFile, testName)`   | whole entry replaced     |
//! | Test suggestion | `suggestedName`          | whole entry replaced     |
//! | Comment         | generated `id`           | never collides, appended |
//!
//! # Persisted layout
//!
//! One JSON object keyed by source path, each value shaped like
//! `{"tests": [...], "suggestions": [...], "comments": [...]}`. Empty lists
//! are omitted.

mod error;
mod models;
mod store;

pub use error::{StoreError, StoreResult};
pub use models::{
    Comment, FileMetadata, LineRange, NewComment, Priority, TestReference, TestSuggestion,
};
pub use store::{MetadataMap, MetadataStore};
