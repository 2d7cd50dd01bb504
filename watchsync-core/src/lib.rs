//! Core pipeline for watchsync.
//!
//! The crate is split along the two runs the CLI drives:
//! - `ingest`: raw viewing history export → canonical dataset
//!   (`normalize` + `aggregate`, file I/O in `dataset`)
//! - `sync`: canonical dataset → calendar events, gated by the
//!   `watermark` store and the `filter` stage, published through `graph`

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod graph;
pub mod ingest;
pub mod localize;
pub mod normalize;
pub mod publish;
pub mod record;
pub mod row;
pub mod sync;
pub mod watermark;

pub use error::{SyncError, SyncResult};
