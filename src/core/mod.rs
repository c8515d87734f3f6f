//! Core module - catalog model, storage and queries

pub mod catalog;
pub mod codec;
pub mod config;
pub mod filter;
pub mod ids;
pub mod present;
pub mod project;
pub mod record;
pub mod schema;
pub mod storage;
pub mod table;
pub mod transfer;

pub use catalog::{ImportMode, ImportReport};
pub use codec::{decode, encode, Cell};
pub use config::{Config, ConfigError, RemoteSettings};
pub use filter::{ListingFilter, Predicate};
pub use ids::{next_id, IdAllocator};
pub use project::{Project, ProjectError};
pub use record::{ListField, NewListing, Record, RecordId, ScalarField};
pub use schema::{denormalize, normalize, Column, RawTable};
pub use storage::{Backend, Outcome, Store, StoreError, StoreWarning};
pub use table::Table;
pub use transfer::TransferError;
