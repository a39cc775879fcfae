use crate::{
    data::student::{Student, shown},
    error::{SchoolError, SchoolResult},
    maud_conveniences::{errors_list, success_banner, title},
    routes::sse::SseEvent,
    state::SchoolState,
    workflow::{
        delete::{Confirmation, delete_student},
        listing::{ClassFilter, StudentListing},
    },
};
use axum::extract::{Query, State};
use maud::{Markup, PreEscaped, html};
use serde::Deserialize;
use uuid::Uuid;

const CLASS_FILTER_JS: &str = include_str!("assets/class_filter.js");

#[derive(Deserialize)]
pub struct ClassQuery {
    pub class: Option<String>,
}

pub async fn get_students(
    State(state): State<SchoolState>,
    query: Query<ClassQuery>,
) -> Markup {
    let list = internal_get_students_list(State(state.clone()), query).await;

    state.render(html! {
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-6xl w-full flex flex-col space-y-4" {
            div class="flex flex-row items-center justify-between" {
                (title("Student Management"))
                div class="flex flex-row space-x-2" {
                    a href="/students/scan" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {
                        "Scan QR"
                    }
                    button class="bg-blue-600 hover:bg-blue-800 font-bold py-2 px-4 rounded" hx-get="/internal/students/new_form" hx-target="#in_focus" {
                        "Add Student"
                    }
                }
            }
            div id="in_focus" {}
            div sse-connect="/sse_feed" {
                (list)
            }
        }
        script {
            (PreEscaped(CLASS_FILTER_JS))
        }
    })
}

///The class picker and the cards. Re-fetches itself whenever any student is created, edited or deleted.
pub async fn internal_get_students_list(
    State(state): State<SchoolState>,
    Query(ClassQuery { class }): Query<ClassQuery>,
) -> Markup {
    let filter = ClassFilter::from_query(class.as_deref());

    match StudentListing::load(state.students()).await {
        Ok(listing) => render_student_list(&listing, &filter, None),
        Err(e) => {
            error!(?e, "Failed to load students");
            render_student_list(&StudentListing::default(), &filter, Some(&e))
        }
    }
}

///Every loaded student gets a card. Switching class only hides and shows cards in the browser.
fn render_student_list(
    listing: &StudentListing,
    filter: &ClassFilter,
    load_error: Option<&SchoolError>,
) -> Markup {
    let nothing_in_class = !listing.students().is_empty() && listing.filter(filter).is_empty();

    html! {
        div id="student_list" hx-get="/internal/students/list" hx-include="#class_filter" hx-trigger="sse:crud_student" hx-swap="outerHTML" hx-disinherit="*" class="flex flex-col space-y-4" {
            div class="flex flex-row items-center justify-between" {
                div class="flex flex-row items-center space-x-4" {
                    label for="class_filter" class="text-sm font-medium" {"Filter by Class:"}
                    select id="class_filter" name="class" class="shadow border rounded py-2 px-3 leading-tight focus:outline-none bg-gray-700 border-gray-600" {
                        option value=(ClassFilter::ALL_SENTINEL) selected[*filter == ClassFilter::All] {"All Classes"}
                        @for class in listing.classes() {
                            option value=(class) selected[*filter == ClassFilter::Class(class.clone())] {(class)}
                        }
                    }
                }
                form action="/students/export" method="get" {
                    input id="export_class" type="hidden" name="class" value=(filter.as_query_value());
                    button type="submit" class="bg-pink-600 hover:bg-pink-700 font-bold py-2 px-4 rounded" {"Download as CSV"}
                }
            }

            @if let Some(e) = load_error {
                (errors_list(Some("Failed to load students"), std::iter::once(e.to_string())))
            } @else if listing.students().is_empty() {
                p class="text-center py-12 text-gray-400" {"No students found. Add your first student to get started."}
            } @else {
                p id="class_empty" hidden[!nothing_in_class] class="text-center py-12 text-gray-400" {"No students in this class."}
                div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6" {
                    @for student in listing.students() {
                        (student_card(student, filter.matches(student)))
                    }
                }
            }
        }
    }
}

fn student_card(student: &Student, visible: bool) -> Markup {
    let id_vals = serde_json::json!({ "id": student.id }).to_string();
    let delete_vals = serde_json::json!({ "id": student.id, "confirmed": true }).to_string();

    html! {
        div data-class=(student.class) hidden[!visible] class="student_card rounded-lg shadow-md p-6 bg-gray-700" {
            div class="flex items-start gap-4" {
                div class="w-16 h-16 rounded-full overflow-hidden bg-gray-600 flex-shrink-0" {
                    @if let Some(url) = &student.student_image_url {
                        img src=(url) alt=(student.name) class="w-full h-full object-cover";
                    } @else {
                        div class="w-full h-full flex items-center justify-center text-2xl font-bold text-gray-300" {
                            (student.initial())
                        }
                    }
                }
                div class="flex-1 min-w-0" {
                    h3 class="font-semibold text-lg truncate" {(student)}
                    p class="text-sm text-gray-300" {"Class: " (student.class)}
                    p class="text-sm text-gray-300" {"Roll No: " (student.roll_number)}
                    @if let Some(phone) = shown(student.phone_number.as_deref()) {
                        p class="text-sm text-gray-300" {"Phone: " (phone)}
                    }
                }
            }
            div class="flex gap-2 mt-4" {
                a href={"/students/" (student.id)} class="flex-1 text-center bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" {
                    "View"
                }
                button hx-get="/internal/students/edit_form" hx-vals=(id_vals) hx-target="#in_focus" class="bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" {
                    "Edit"
                }
                button hx-delete="/students" hx-vals=(delete_vals) hx-target="#in_focus" hx-confirm="Are you sure? This action cannot be undone. This will permanently delete the student record." class="bg-red-600 hover:bg-red-800 font-bold py-1 px-3 rounded" {
                    "Delete"
                }
            }
        }
    }
}

#[derive(Deserialize)]
pub struct DeleteStudentQuery {
    id: Uuid,
    confirmed: Option<bool>,
}

pub async fn delete_student_route(
    State(state): State<SchoolState>,
    Query(DeleteStudentQuery { id, confirmed }): Query<DeleteStudentQuery>,
) -> SchoolResult<Markup> {
    delete_student(state.students(), id, Confirmation::from(confirmed)).await?;
    state.send_sse_event(SseEvent::CrudStudent);

    Ok(success_banner("Student deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::student::StudentForm,
        testing::{MemoryBlobStore, MemoryStudentStore, blank_student},
        workflow::save::SaveJob,
    };

    fn in_class(name: &str, class: &str) -> Student {
        let mut student = blank_student(Uuid::new_v4());
        student.name = name.into();
        student.class = class.into();
        student
    }

    #[test]
    fn every_card_is_rendered_and_other_classes_start_hidden() {
        let listing = StudentListing::from_students(vec![
            in_class("Asha", "5A"),
            in_class("Ben", "5B"),
            in_class("Chen", "5A"),
        ]);

        let page = render_student_list(
            &listing,
            &ClassFilter::from_query(Some("5A")),
            None,
        )
        .into_string();

        assert_eq!(page.matches("student_card ").count(), 3);
        assert_eq!(page.matches(r#"data-class="5A" class="#).count(), 2);
        assert_eq!(page.matches(r#"data-class="5B" hidden class="#).count(), 1);
        assert!(page.contains(r#"p id="class_empty" hidden class="#));
        assert!(page.contains(r#"option value="5A" selected"#));
    }

    #[test]
    fn showing_all_classes_hides_nothing() {
        let listing =
            StudentListing::from_students(vec![in_class("Asha", "5A"), in_class("Ben", "5B")]);

        let page = render_student_list(&listing, &ClassFilter::All, None).into_string();

        assert_eq!(page.matches("student_card ").count(), 2);
        assert!(!page.contains(r#"hidden class="student_card"#));
    }

    #[test]
    fn a_class_with_no_students_says_so() {
        let listing = StudentListing::from_students(vec![in_class("Asha", "5A")]);

        let page = render_student_list(
            &listing,
            &ClassFilter::from_query(Some("6C")),
            None,
        )
        .into_string();

        assert!(page.contains(r#"p id="class_empty" class="#));
        assert!(page.contains(r#"data-class="5A" hidden class="#));
    }

    #[test]
    fn an_empty_listing_invites_adding_a_student() {
        let page = render_student_list(&StudentListing::default(), &ClassFilter::All, None)
            .into_string();

        assert!(page.contains("No students found. Add your first student to get started."));
        assert!(!page.contains("class_empty"));
    }

    #[tokio::test]
    async fn a_phone_number_cleared_by_an_edit_is_not_shown() {
        let students = MemoryStudentStore::default();
        let blobs = MemoryBlobStore::default();
        let form = StudentForm {
            name: "Asha".into(),
            class: "5A".into(),
            roll_number: "12".into(),
            phone_number: Some("555-0100".into()),
            ..StudentForm::default()
        };

        let created = SaveJob::new(None, form.clone())
            .run(&students, &blobs, "https://school.example.org")
            .await
            .unwrap();
        let before = students.snapshot()[0].clone();
        assert!(student_card(&before, true).into_string().contains("Phone: 555-0100"));

        SaveJob::new(
            Some(created.id),
            StudentForm {
                phone_number: Some(String::new()),
                ..form
            },
        )
        .run(&students, &blobs, "https://school.example.org")
        .await
        .unwrap();

        let after = students.snapshot()[0].clone();
        assert_eq!(after.phone_number.as_deref(), Some(""));
        assert!(!student_card(&after, true).into_string().contains("Phone:"));
    }
}
