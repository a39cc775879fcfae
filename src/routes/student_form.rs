use crate::{
    blob::PendingImage,
    data::{
        IdForm, StudentStore,
        student::{ImageSlot, ImageUrls, StudentForm, StudentFormErrors},
    },
    error::{
        FormFieldEncodingSnafu, MissingStudentSnafu, MultipartSnafu, ParseUuidSnafu, SchoolError,
        SchoolResult,
    },
    maud_conveniences::{
        errors_list, form_element, form_submit_button, simple_form_element, success_banner,
        subtitle, title,
    },
    routes::sse::SseEvent,
    state::SchoolState,
    workflow::save::SaveJob,
};
use axum::extract::{Multipart, Query, State};
use maud::{Markup, html};
use snafu::{OptionExt, ResultExt};
use uuid::Uuid;

pub async fn internal_get_new_student_form() -> Markup {
    render_student_form(None, &StudentForm::default(), None, None)
}

pub async fn internal_get_edit_student_form(
    State(state): State<SchoolState>,
    Query(IdForm { id }): Query<IdForm>,
) -> SchoolResult<Markup> {
    let student = state
        .students()
        .get_from_db_by_id(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(render_student_form(
        Some(id),
        &StudentForm::prefilled_from(&student),
        Some(&student.image_urls()),
        None,
    ))
}

fn render_student_form(
    id: Option<Uuid>,
    form: &StudentForm,
    current_photos: Option<&ImageUrls>,
    errors: Option<StudentFormErrors>,
) -> Markup {
    let photo_input = |slot: ImageSlot| {
        let current = current_photos.and_then(|photos| photos.get(slot));
        form_element(
            slot.form_field(),
            slot.label(),
            html! {
                @if let Some(current) = current {
                    img src=(current) alt=(slot.label()) class="w-16 h-16 rounded object-cover mb-2";
                }
                input type="file" accept="image/*" id=(slot.form_field()) name=(slot.form_field()) class="block w-full text-sm text-gray-300 file:mr-4 file:py-2 file:px-4 file:rounded file:border-0 file:text-sm file:font-semibold file:bg-violet-50 file:text-violet-700 hover:file:bg-violet-100";
            },
        )
    };

    html! {
        @if id.is_some() {
            (title("Edit Student"))
        } @else {
            (title("Add New Student"))
        }

        @if let Some(errors) = errors {
            (errors_list(Some("Please fix the following:"), errors.as_nice_list()))
        }

        form hx-put="/internal/students/form" hx-encoding="multipart/form-data" hx-target="#in_focus" class="p-4 bg-gray-700 rounded" {
            @if let Some(id) = id {
                input type="hidden" name="id" value=(id);
            }

            div class="grid grid-cols-1 md:grid-cols-2 gap-4" {
                (simple_form_element("name", "Student Name *", true, None, Some(&form.name)))
                (simple_form_element("class", "Class *", true, None, Some(&form.class)))
                (simple_form_element("roll_number", "Roll Number *", true, None, Some(&form.roll_number)))
                (simple_form_element("phone_number", "Student Phone", false, Some("tel"), form.phone_number.as_deref()))
            }
            (photo_input(ImageSlot::Student))

            (subtitle("Father"))
            div class="grid grid-cols-1 md:grid-cols-2 gap-4" {
                (simple_form_element("father_name", "Father's Name", false, None, form.father_name.as_deref()))
                (simple_form_element("father_phone", "Father's Phone", false, Some("tel"), form.father_phone.as_deref()))
            }
            (photo_input(ImageSlot::Father))

            (subtitle("Mother"))
            div class="grid grid-cols-1 md:grid-cols-2 gap-4" {
                (simple_form_element("mother_name", "Mother's Name", false, None, form.mother_name.as_deref()))
                (simple_form_element("mother_phone", "Mother's Phone", false, Some("tel"), form.mother_phone.as_deref()))
            }
            (photo_input(ImageSlot::Mother))

            (form_element("previous_marks", "Previous Marks (JSON format)", html! {
                input type="text" id="previous_marks" name="previous_marks" placeholder=r#"{"math": 85, "science": 90}"# value=[form.previous_marks.as_deref()] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600" {}
            }))

            (form_submit_button(Some(if id.is_some() { "Update Student" } else { "Add Student" })))
        }
    }
}

///One multipart submission of the student form, gathered field by field.
#[derive(Debug, Default)]
struct StudentSubmission {
    existing_id: Option<Uuid>,
    form: StudentForm,
    images: Vec<PendingImage>,
    rejected_images: Vec<ImageSlot>,
}

impl StudentSubmission {
    fn accept_field(&mut self, name: &str, bytes: Vec<u8>) -> SchoolResult<()> {
        if let Some(slot) = ImageSlot::from_form_field(name) {
            //browsers send an empty part when no file was picked
            if bytes.is_empty() {
                return Ok(());
            }

            match PendingImage::new(slot, bytes) {
                Ok(image) => self.images.push(image),
                Err(SchoolError::NotAnImage { slot, found }) => {
                    debug!(?slot, ?found, "Rejecting non-image upload");
                    self.rejected_images.push(slot);
                }
                Err(e) => return Err(e),
            }
            return Ok(());
        }

        let value = String::from_utf8(bytes).context(FormFieldEncodingSnafu { name })?;
        if name == "id" {
            if !value.is_empty() {
                self.existing_id =
                    Some(Uuid::try_parse(&value).context(ParseUuidSnafu { original: value })?);
            }
        } else if !self.form.set_field(name, value) {
            warn!(?name, "Ignoring unknown student form field");
        }

        Ok(())
    }

    fn into_job(self) -> SaveJob {
        let mut job = SaveJob::new(self.existing_id, self.form);
        for image in self.images {
            job.add_image(image);
        }
        for slot in self.rejected_images {
            job.reject_image(slot);
        }
        job
    }
}

pub async fn internal_put_student_form(
    State(state): State<SchoolState>,
    mut multipart: Multipart,
) -> SchoolResult<Markup> {
    let mut submission = StudentSubmission::default();

    while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.context(MultipartSnafu)?;
        submission.accept_field(&name, bytes.to_vec())?;
    }

    let existing_id = submission.existing_id;
    let form = submission.form.clone();

    let outcome = match submission
        .into_job()
        .run(state.students(), state.blobs(), state.config().public_origin())
        .await
    {
        Ok(outcome) => outcome,
        Err(SchoolError::InvalidStudentForm { errors }) => {
            return Ok(render_student_form(existing_id, &form, None, Some(errors)));
        }
        Err(e) => return Err(e),
    };
    state.send_sse_event(SseEvent::CrudStudent);

    let message = if outcome.created {
        "Student added successfully"
    } else {
        "Student updated successfully"
    };

    Ok(html! {
        (success_banner(message))
        div class="flex flex-row items-center space-x-4" {
            img src=(outcome.qr_code) alt="Student QR Code" class="w-32 h-32 bg-white rounded";
            a href={"/students/" (outcome.id)} class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {
                "View Student"
            }
        }
    })
}
