//! The multi-step operations behind the student pages. Each one talks to the stores only
//! through [`StudentStore`](crate::data::StudentStore) and [`BlobStore`](crate::blob::BlobStore),
//! never retries, and leaves whatever it already did in place when a later step fails.

pub mod delete;
pub mod listing;
pub mod save;
pub mod scan;
