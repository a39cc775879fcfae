use crate::{
    data::student::Student,
    error::{CsvFlushSnafu, CsvSnafu, SchoolResult},
    routes::students::ClassQuery,
    state::SchoolState,
    workflow::listing::{ClassFilter, StudentListing},
};
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use snafu::ResultExt;

const HEADERS: [&str; 14] = [
    "id",
    "name",
    "class",
    "roll_number",
    "phone_number",
    "student_image_url",
    "father_name",
    "father_phone",
    "father_image_url",
    "mother_name",
    "mother_phone",
    "mother_image_url",
    "previous_marks",
    "qr_code",
];

pub async fn get_students_export(
    State(state): State<SchoolState>,
    Query(ClassQuery { class }): Query<ClassQuery>,
) -> SchoolResult<impl IntoResponse> {
    let filter = ClassFilter::from_query(class.as_deref());
    let listing = StudentListing::load(state.students()).await?;
    let students = listing.filter(&filter);

    let csv = students_to_csv(&students)?;
    info!(n = students.len(), ?filter, "Exporting students");

    let file_name = match &filter {
        ClassFilter::All => "students.csv".to_string(),
        ClassFilter::Class(class) => format!(
            "students-{}.csv",
            class.replace(|c: char| !c.is_ascii_alphanumeric(), "_")
        ),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    ))
}

fn students_to_csv(students: &[&Student]) -> SchoolResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(HEADERS).context(CsvSnafu)?;

    for student in students {
        let id = student.id.to_string();
        let marks = student
            .previous_marks
            .as_ref()
            .map(|marks| marks.to_form_text())
            .unwrap_or_default();
        let opt = |field: &Option<String>| field.clone().unwrap_or_default();

        writer
            .write_record([
                id,
                student.name.clone(),
                student.class.clone(),
                student.roll_number.clone(),
                opt(&student.phone_number),
                opt(&student.student_image_url),
                opt(&student.father_name),
                opt(&student.father_phone),
                opt(&student.father_image_url),
                opt(&student.mother_name),
                opt(&student.mother_phone),
                opt(&student.mother_image_url),
                marks,
                opt(&student.qr_code),
            ])
            .context(CsvSnafu)?;
    }

    writer
        .into_inner()
        .map_err(csv::IntoInnerError::into_error)
        .context(CsvFlushSnafu)
}
