use crate::error::{BadEnvVarSnafu, ParsePortSnafu, ParseUploadLimitSnafu, SchoolResult};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::sync::Arc;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    s3_config: Arc<S3Config>,
    public_origin: Arc<str>,
    max_upload_bytes: usize,
}

impl RuntimeConfiguration {
    pub fn new() -> SchoolResult<Self> {
        let max_upload_bytes = match var("ROLLCALL_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw.parse().context(ParseUploadLimitSnafu)?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            s3_config: Arc::new(S3Config::new()?),
            public_origin: var("PUBLIC_ORIGIN")
                .context(BadEnvVarSnafu {
                    name: "PUBLIC_ORIGIN",
                })?
                .trim_end_matches('/')
                .into(),
            max_upload_bytes,
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn s3_config(&self) -> Arc<S3Config> {
        self.s3_config.clone()
    }

    ///origin that every student QR locator is built from, eg. `https://school.example.org`
    pub fn public_origin(&self) -> &str {
        &self.public_origin
    }

    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> SchoolResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}

#[derive(Debug)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    ///where objects are publicly reachable, if not at the bucket's own URL (eg. behind a CDN)
    pub public_url: Option<String>,
}

impl S3Config {
    pub fn new() -> SchoolResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            bucket_name: get_env_var("S3_BUCKET_NAME")?,
            region: get_env_var("S3_REGION")?,
            endpoint: get_env_var("S3_ENDPOINT")?,
            access_key_id: get_env_var("S3_ACCESS_KEY_ID")?,
            secret_access_key: SecretString::from(get_env_var("S3_SECRET_ACCESS_KEY")?),
            public_url: var("S3_PUBLIC_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}
