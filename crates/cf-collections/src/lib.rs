//! Collection store for the CloudFreedom backend.
//!
//! A collection is a named set of typed, constrained fields plus indexes
//! and per-operation access rules. [`store::DbCollectionStore`] persists
//! collection descriptors in a `_collections` registry table and keeps one
//! record table per collection.

pub mod collection;
pub mod config;
pub mod error;
pub mod field;
pub mod record;
pub mod rule;
pub mod store;

pub use collection::{Collection, Index};
pub use error::{FieldError, StoreError, ValidationErrors};
pub use field::{
    AutodateField, DateField, EmailField, Field, FieldList, JsonField, NumberField, SelectField,
    TextField,
};
pub use record::{Record, RecordPage, RecordSort};
pub use rule::AccessRule;
pub use store::{CollectionRepository, DbCollectionStore, RecordRepository};
