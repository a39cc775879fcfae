use crate::{
    error::SchoolResult,
    maud_conveniences::{errors_list, title},
    state::SchoolState,
    workflow::{
        listing::StudentListing,
        scan::{ScanOutcome, resolve_scan},
    },
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use serde::Deserialize;

const SCANNER_JS: &str = include_str!("assets/scanner.js");

pub async fn get_scan_page(State(state): State<SchoolState>) -> Markup {
    state.render(html! {
        script src="https://unpkg.com/html5-qrcode@2.3.8/html5-qrcode.min.js" {}
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-lg w-full flex flex-col space-y-4" {
            (title("Scan Student QR Code"))
            div id="qr_reader" class="w-full" {}
            p id="scan_status" class="text-red-400 text-sm" {}
            div class="flex flex-row space-x-2" {
                button id="start_scan" class="bg-blue-600 hover:bg-blue-800 font-bold py-2 px-4 rounded" {"Start Scanning"}
                button id="stop_scan" hidden class="bg-red-600 hover:bg-red-800 font-bold py-2 px-4 rounded" {"Stop Scanning"}
            }
            div id="scan_result" {}
        }
        script {
            (PreEscaped(SCANNER_JS))
        }
    })
}

#[derive(Deserialize)]
pub struct ScanQuery {
    text: String,
}

pub async fn internal_get_resolve_scan(
    State(state): State<SchoolState>,
    Query(ScanQuery { text }): Query<ScanQuery>,
) -> SchoolResult<Response> {
    let listing = StudentListing::load(state.students()).await?;

    Ok(match resolve_scan(listing.students(), &text) {
        ScanOutcome::Found(id) => {
            info!(?id, "Resolved scanned QR code");
            [("HX-Redirect", format!("/students/{id}"))].into_response()
        }
        ScanOutcome::NotFound => {
            debug!(?text, "Scanned QR code matched nobody");
            errors_list(
                None,
                std::iter::once("No student found with this QR code"),
            )
            .into_response()
        }
    })
}
