use crate::{
    blob::s3_store::S3BlobStore,
    config::RuntimeConfiguration,
    data::postgres_store::PgStudentStore,
    error::{MigrateSnafu, OpenDatabaseSnafu, SchoolResult},
    maud_conveniences::render_nav,
    routes::sse::SseEvent,
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast::{Receiver, Sender, channel};

//404s and errors still get swapped in, so that error banners show up
const HTMX_CONFIG: &str = r#"{"responseHandling":[{"code":"204","swap":false},{"code":"[23]..","swap":true},{"code":"[45]..","swap":true,"error":true}]}"#;

#[derive(Clone, Debug)]
pub struct SchoolState {
    students: PgStudentStore,
    blobs: S3BlobStore,
    config: RuntimeConfiguration,
    sse_events_sender: Sender<SseEvent>,
}

impl SchoolState {
    pub async fn new(options: PgPoolOptions, config: RuntimeConfiguration) -> SchoolResult<Self> {
        let pool = options
            .connect(&config.db_config().get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        let blobs = S3BlobStore::new(&config.s3_config())?;

        let (tx, _rx) = channel(16);

        Ok(Self {
            students: PgStudentStore::new(pool),
            blobs,
            config,
            sse_events_sender: tx,
        })
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :)
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    meta name="htmx-config" content=(HTMX_CONFIG) {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://unpkg.com/htmx-ext-sse@2.2.3" integrity="sha384-Y4gc0CK6Kg+hmulDc6rZPJu0tqvk7EWlih0Oh+2OkAi1ZDlCbBDCQEE2uVk472Ky" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Rollcall" }
                }
                body hx-ext="sse" class="bg-gray-900 min-h-screen flex flex-col items-center text-white" {
                    (render_nav())
                    (markup)
                }
            }
        }
    }

    pub const fn students(&self) -> &PgStudentStore {
        &self.students
    }

    pub const fn blobs(&self) -> &S3BlobStore {
        &self.blobs
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub fn subscribe_to_sse_feed(&self) -> Receiver<SseEvent> {
        self.sse_events_sender.subscribe()
    }

    pub fn send_sse_event(&self, event: SseEvent) {
        let _ = self.sse_events_sender.send(event);
    }

    pub async fn sensible_shutdown(&self) {
        self.students.close().await;
    }
}
