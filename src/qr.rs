use crate::error::{EncodePngSnafu, EncodeQrSnafu, SchoolResult};
use base64::{Engine, prelude::BASE64_STANDARD};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use snafu::ResultExt;
use std::io::Cursor;
use uuid::Uuid;

const LOCATOR_SEGMENT: &str = "/students/";

///The canonical string every student's QR code carries: their detail page.
pub fn student_locator(origin: &str, id: Uuid) -> String {
    format!("{}{LOCATOR_SEGMENT}{id}", origin.trim_end_matches('/'))
}

///Pulls the student id back out of something that looks like a locator, ignoring the origin.
pub fn parse_student_locator(text: &str) -> Option<Uuid> {
    let (_, rest) = text.trim().rsplit_once(LOCATOR_SEGMENT)?;
    let id = rest.split(['/', '?', '#']).next()?;
    Uuid::try_parse(id).ok()
}

pub fn encode_png(text: &str) -> SchoolResult<Vec<u8>> {
    let code = QrCode::new(text.as_bytes()).context(EncodeQrSnafu { text })?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(256, 256)
        .build();

    let mut png = Cursor::new(vec![]);
    DynamicImage::ImageLuma8(img)
        .write_to(&mut png, ImageFormat::Png)
        .context(EncodePngSnafu)?;
    Ok(png.into_inner())
}

///for embedding straight into an `img` tag
pub fn to_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png))
}
