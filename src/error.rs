use crate::data::student::{ImageSlot, StudentFormErrors};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::num::ParseIntError;
use uuid::Uuid;

pub type SchoolResult<T> = Result<T, SchoolError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SchoolError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unable to parse maximum upload size"))]
    ParseUploadLimit { source: ParseIntError },
    #[snafu(display("Unable to parse uuid {:?}", original))]
    ParseUuid {
        source: uuid::Error,
        original: String,
    },
    #[snafu(display("Unable to find student with UUID: {}", id))]
    MissingStudent { id: Uuid },
    #[snafu(display("Previous marks must be a JSON object of subject names to numbers"))]
    ParsePreviousMarks { source: serde_json::Error },
    #[snafu(display("Invalid student details: {}", errors.as_nice_list().collect::<Vec<_>>().join(", ")))]
    InvalidStudentForm { errors: StudentFormErrors },
    #[snafu(display("The {} upload doesn't look like an image (found {})", slot.label(), found))]
    NotAnImage { slot: ImageSlot, found: String },
    #[snafu(display("Refusing to delete student {} without confirmation", id))]
    DeleteNotConfirmed { id: Uuid },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("Form field {:?} isn't valid UTF-8", name))]
    FormFieldEncoding {
        source: std::string::FromUtf8Error,
        name: String,
    },
    #[snafu(display("Error with S3 Credentials"))]
    S3Creds {
        source: s3::creds::error::CredentialsError,
    },
    #[snafu(display("Error with S3"))]
    S3 { source: s3::error::S3Error },
    #[snafu(display("Unable to encode {:?} as a QR code", text))]
    EncodeQr {
        source: qrcode::types::QrError,
        text: String,
    },
    #[snafu(display("Unable to render QR code as PNG"))]
    EncodePng { source: image::ImageError },
    #[snafu(display("Error with CSVs"))]
    Csv { source: csv::Error },
    #[snafu(display("Error finishing CSV export"))]
    CsvFlush { source: std::io::Error },
}

impl IntoResponse for SchoolError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const BG: StatusCode = StatusCode::BAD_GATEWAY; //remote store/blob failure

        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Error: "}
                    span {(desc)}
                }
            }
        };

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => BG,
            },
            Self::BadEnvVar { .. } | Self::ParsePort { .. } | Self::ParseUploadLimit { .. } => ISE,
            Self::ParseUuid { .. } => BI,
            Self::MissingStudent { .. } => NF,
            Self::ParsePreviousMarks { .. } | Self::InvalidStudentForm { .. } => BI,
            Self::NotAnImage { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::DeleteNotConfirmed { .. } => BI,
            Self::Multipart { source } => source.status(),
            Self::FormFieldEncoding { .. } => BI,
            Self::S3Creds { .. } => ISE,
            Self::S3 { .. } => BG,
            Self::EncodeQr { .. } | Self::EncodePng { .. } => ISE,
            Self::Csv { .. } | Self::CsvFlush { .. } => ISE,
        };

        error!(?self, "Error!");
        (status_code, Html(basic_error(self.to_string()).into_string())).into_response()
    }
}
