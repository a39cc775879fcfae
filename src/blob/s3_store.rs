use crate::{
    blob::{BlobHandle, BlobStore},
    config::S3Config,
    error::{S3CredsSnafu, S3Snafu, SchoolResult},
};
use s3::{Bucket, Region, creds::Credentials};
use secrecy::ExposeSecret;
use snafu::ResultExt;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct S3BlobStore {
    bucket: Arc<Bucket>,
    public_base: Arc<str>,
}

impl S3BlobStore {
    pub fn new(config: &S3Config) -> SchoolResult<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(config.secret_access_key.expose_secret()),
            None,
            None,
            None,
        )
        .context(S3CredsSnafu)?;
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let bucket = Bucket::new(&config.bucket_name, region, credentials)
            .context(S3Snafu)?
            .with_path_style();

        let public_base = config
            .public_url
            .clone()
            .unwrap_or_else(|| bucket.url());

        Ok(Self {
            bucket: Arc::from(bucket),
            public_base: public_base.trim_end_matches('/').into(),
        })
    }
}

impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> SchoolResult<BlobHandle> {
        self.bucket
            .put_object_with_content_type(path, bytes, content_type)
            .await
            .context(S3Snafu)?;

        debug!(?path, len = bytes.len(), "Uploaded blob");
        Ok(BlobHandle {
            path: path.to_string(),
        })
    }

    fn public_url(&self, handle: &BlobHandle) -> String {
        format!("{}/{}", self.public_base, handle.path)
    }
}
