#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    routes::{
        export::get_students_export,
        index::get_index_route,
        scan::{get_scan_page, internal_get_resolve_scan},
        sse::sse_feed,
        student_detail::get_student,
        student_form::{
            internal_get_edit_student_form, internal_get_new_student_form,
            internal_put_student_form,
        },
        students::{delete_student_route, get_students, internal_get_students_list},
    },
    state::SchoolState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use tokio::{net::TcpListener, signal};
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod blob;
mod config;
mod data;
mod error;
mod maud_conveniences;
mod qr;
mod routes;
mod state;
#[cfg(test)]
mod testing;
mod workflow;

async fn shutdown_signal(state: SchoolState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
    state.sensible_shutdown().await;
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        //every variable can still come from the real environment
        eprintln!("no .env file loaded: {e}");
    }

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    let options = PgPoolOptions::new().max_connections(15);
    let config = RuntimeConfiguration::new().expect("unable to create config");
    let max_upload_bytes = config.max_upload_bytes();
    let state = SchoolState::new(options, config)
        .await
        .expect("unable to create state");

    let trace_layer = TraceLayer::new_for_http();

    let app = Router::new()
        .route("/", get(get_index_route))
        .route(
            "/students",
            get(get_students).delete(delete_student_route),
        )
        .route("/students/scan", get(get_scan_page))
        .route("/students/export", get(get_students_export))
        .route("/students/{id}", get(get_student))
        .route("/internal/students/list", get(internal_get_students_list))
        .route(
            "/internal/students/new_form",
            get(internal_get_new_student_form),
        )
        .route(
            "/internal/students/edit_form",
            get(internal_get_edit_student_form),
        )
        .route("/internal/students/form", put(internal_put_student_form))
        .route(
            "/internal/students/resolve_scan",
            get(internal_get_resolve_scan),
        )
        .route("/sse_feed", get(sse_feed))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .with_state(state.clone());

    let server_ip =
        env::var("ROLLCALL_SERVER_IP").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("unable to serve app");
}
