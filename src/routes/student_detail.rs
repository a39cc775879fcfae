use crate::{
    data::{
        StudentStore,
        student::{Student, shown},
    },
    error::{MissingStudentSnafu, SchoolResult},
    maud_conveniences::{detail_field, subtitle, title},
    qr::{encode_png, student_locator, to_data_uri},
    state::SchoolState,
};
use axum::extract::{Path, State};
use maud::{Markup, html};
use snafu::OptionExt;
use uuid::Uuid;

pub async fn get_student(
    State(state): State<SchoolState>,
    Path(id): Path<Uuid>,
) -> SchoolResult<Markup> {
    let student = state
        .students()
        .get_from_db_by_id(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    let qr_card = qr_card(&student, state.config().public_origin())?;

    Ok(state.render(render_student_details(&student, qr_card)))
}

fn render_student_details(student: &Student, qr_card: Markup) -> Markup {
    html! {
        div class="mx-auto max-w-4xl w-full flex flex-col space-y-6" {
            a href="/students" class="text-blue-400 hover:underline" {"← Back to Students"}

            div class="grid grid-cols-1 lg:grid-cols-3 gap-6" {
                div class="lg:col-span-2 bg-gray-800 p-6 rounded shadow-md" {
                    (title("Personal Information"))
                    div class="flex items-start gap-6" {
                        div class="w-32 h-32 rounded-lg overflow-hidden bg-gray-600 flex-shrink-0" {
                            @if let Some(url) = &student.student_image_url {
                                img src=(url) alt=(student.name) class="w-full h-full object-cover";
                            } @else {
                                div class="w-full h-full flex items-center justify-center text-4xl font-bold text-gray-300" {
                                    (student.initial())
                                }
                            }
                        }
                        div class="flex-1 grid grid-cols-2 gap-4" {
                            (detail_field("Name", &student.name))
                            (detail_field("Class", &student.class))
                            (detail_field("Roll Number", &student.roll_number))
                            @if let Some(phone) = shown(student.phone_number.as_deref()) {
                                (detail_field("Phone", phone))
                            }
                        }
                    }
                }
                (qr_card)
            }

            div class="grid grid-cols-1 md:grid-cols-2 gap-6" {
                @if let Some(name) = shown(student.father_name.as_deref()) {
                    (parent_card("Father's Information", name, shown(student.father_phone.as_deref()), student.father_image_url.as_deref()))
                }
                @if let Some(name) = shown(student.mother_name.as_deref()) {
                    (parent_card("Mother's Information", name, shown(student.mother_phone.as_deref()), student.mother_image_url.as_deref()))
                }
            }

            @if let Some(marks) = &student.previous_marks {
                div class="bg-gray-800 p-6 rounded shadow-md" {
                    (subtitle("Previous Academic Performance"))
                    div class="grid grid-cols-2 md:grid-cols-4 gap-4" {
                        @for (subject, score) in marks.iter() {
                            div class="bg-gray-700 p-4 rounded-lg text-center" {
                                p class="text-gray-300 text-sm capitalize" {(subject)}
                                p class="text-2xl font-bold text-blue-400" {(score)}
                            }
                        }
                    }
                }
            }
        }
    }
}

///Falls back to drawing the code on the fly for students whose QR code never got stored.
fn qr_card(student: &Student, origin: &str) -> SchoolResult<Markup> {
    let (src, unsaved) = match &student.qr_code {
        Some(url) => (url.clone(), false),
        None => {
            let png = encode_png(&student_locator(origin, student.id))?;
            (to_data_uri(&png), true)
        }
    };

    Ok(html! {
        div class="bg-gray-800 p-6 rounded shadow-md flex flex-col items-center" {
            (subtitle("Student QR Code"))
            img src=(src) alt="Student QR Code" class="w-48 h-48 bg-white rounded";
            @if unsaved {
                p class="text-sm text-gray-400 mt-2" {"This QR code has not been saved yet."}
            }
            p class="text-sm text-gray-400 mt-2 text-center" {"Scan this code to open this student's page"}
        }
    })
}

fn parent_card(
    heading: &'static str,
    name: &str,
    phone: Option<&str>,
    image_url: Option<&str>,
) -> Markup {
    html! {
        div class="bg-gray-800 p-6 rounded shadow-md" {
            (subtitle(heading))
            div class="flex items-start gap-4" {
                @if let Some(url) = image_url {
                    div class="w-20 h-20 rounded-lg overflow-hidden flex-shrink-0" {
                        img src=(url) alt=(name) class="w-full h-full object-cover";
                    }
                }
                div class="space-y-2" {
                    (detail_field("Name", name))
                    @if let Some(phone) = phone {
                        (detail_field("Phone", phone))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::student::StudentForm,
        testing::{MemoryBlobStore, MemoryStudentStore},
        workflow::save::SaveJob,
    };

    const ORIGIN: &str = "https://school.example.org";

    fn details(student: &Student) -> String {
        render_student_details(student, qr_card(student, ORIGIN).unwrap()).into_string()
    }

    #[tokio::test]
    async fn fields_cleared_by_an_edit_disappear_from_the_page() {
        let students = MemoryStudentStore::default();
        let blobs = MemoryBlobStore::default();
        let form = StudentForm {
            name: "Asha".into(),
            class: "5A".into(),
            roll_number: "12".into(),
            phone_number: Some("555-0100".into()),
            father_name: Some("Ravi".into()),
            father_phone: Some("555-0199".into()),
            ..StudentForm::default()
        };

        let created = SaveJob::new(None, form.clone())
            .run(&students, &blobs, ORIGIN)
            .await
            .unwrap();
        let page = details(&students.snapshot()[0]);
        assert!(page.contains("555-0100"));
        assert!(page.contains("Father's Information"));
        assert!(page.contains("Ravi"));

        SaveJob::new(
            Some(created.id),
            StudentForm {
                phone_number: Some(String::new()),
                father_name: Some(String::new()),
                father_phone: Some(String::new()),
                ..form
            },
        )
        .run(&students, &blobs, ORIGIN)
        .await
        .unwrap();

        let page = details(&students.snapshot()[0]);
        assert!(!page.contains("Phone"));
        assert!(!page.contains("Father"));
        assert!(!page.contains("Mother"));
        assert!(page.contains("Asha"));
    }

    #[test]
    fn students_without_a_stored_code_get_one_drawn_on_the_fly() {
        let student = crate::testing::blank_student(Uuid::new_v4());

        let page = details(&student);
        assert!(page.contains("data:image/png;base64,"));
        assert!(page.contains("This QR code has not been saved yet."));
    }
}
