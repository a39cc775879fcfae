use crate::{
    data::student::ImageSlot,
    error::{NotAnImageSnafu, SchoolResult},
};
use rand::{Rng, rng};
use time::OffsetDateTime;

pub mod s3_store;

///What an upload hands back - enough to ask the store for a public URL later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub path: String,
}

pub trait BlobStore {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
    -> SchoolResult<BlobHandle>;
    fn public_url(&self, handle: &BlobHandle) -> String;
}

///`<namespace>/<unix millis>-<random>.<extension>`, so that two uploads never share a path
pub fn collision_resistant_path(namespace: &str, extension: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let random: u64 = rng().random();

    format!("{namespace}/{millis}-{random}.{extension}")
}

///A newly-chosen image for one of the three photo slots, not uploaded yet.
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub slot: ImageSlot,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

impl PendingImage {
    ///sniffs the bytes, rather than trusting the browser, and rejects anything that isn't an image
    pub fn new(slot: ImageSlot, bytes: Vec<u8>) -> SchoolResult<Self> {
        let Some(kind) = infer::get(&bytes) else {
            return NotAnImageSnafu {
                slot,
                found: "unknown data",
            }
            .fail();
        };

        snafu::ensure!(
            kind.matcher_type() == infer::MatcherType::Image,
            NotAnImageSnafu {
                slot,
                found: kind.mime_type(),
            }
        );

        Ok(Self {
            slot,
            bytes,
            content_type: kind.mime_type(),
            extension: kind.extension(),
        })
    }

    pub fn blob_path(&self) -> String {
        collision_resistant_path(self.slot.namespace(), self.extension)
    }
}
