use crate::error::{InvalidStudentFormSnafu, ParsePreviousMarksSnafu, SchoolResult};
use bitflags::bitflags;
use maud::{Markup, Render, html};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use snafu::ResultExt;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub class: String,
    pub roll_number: String,
    pub phone_number: Option<String>,
    pub student_image_url: Option<String>,
    pub father_name: Option<String>,
    pub father_phone: Option<String>,
    pub father_image_url: Option<String>,
    pub mother_name: Option<String>,
    pub mother_phone: Option<String>,
    pub mother_image_url: Option<String>,
    pub previous_marks: Option<PreviousMarks>,
    pub qr_code: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Student {
    pub fn image_urls(&self) -> ImageUrls {
        ImageUrls {
            student: self.student_image_url.clone(),
            father: self.father_image_url.clone(),
            mother: self.mother_image_url.clone(),
        }
    }

    ///first character of the name, for when there's no photo
    pub fn initial(&self) -> String {
        self.name.chars().next().map(String::from).unwrap_or_default()
    }
}

impl Render for Student {
    fn render(&self) -> Markup {
        html! {
            (self.name)
        }
    }
}

///Subject name to score. Absent means "not recorded", so an empty map is still a recording.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviousMarks(pub BTreeMap<String, f64>);

impl PreviousMarks {
    ///parses the text the form edits marks as. blank text means no marks were recorded
    pub fn parse_form_text(text: &str) -> SchoolResult<Option<Self>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(text)
            .map(Some)
            .context(ParsePreviousMarksSnafu)
    }

    ///whole scores print without a trailing `.0`, so `85` comes back as `85`
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn to_form_text(&self) -> String {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0; //2^53

        let object = self
            .0
            .iter()
            .filter_map(|(subject, &score)| {
                let number = if score.fract() == 0.0 && score.abs() < MAX_EXACT {
                    Number::from(score as i64)
                } else {
                    Number::from_f64(score)? //f64s from JSON are always finite
                };
                Some((subject.clone(), Value::Number(number)))
            })
            .collect();

        Value::Object(object).to_string()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageSlot {
    Student,
    Father,
    Mother,
}

impl ImageSlot {
    pub const ALL: [Self; 3] = [Self::Student, Self::Father, Self::Mother];

    ///the blob namespace uploads for this slot live under
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Father | Self::Mother => "parents",
        }
    }

    pub const fn form_field(self) -> &'static str {
        match self {
            Self::Student => "student_image",
            Self::Father => "father_image",
            Self::Mother => "mother_image",
        }
    }

    pub fn from_form_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.form_field() == name)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student Image",
            Self::Father => "Father's Image",
            Self::Mother => "Mother's Image",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUrls {
    pub student: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
}

impl ImageUrls {
    pub const fn get(&self, slot: ImageSlot) -> Option<&String> {
        match slot {
            ImageSlot::Student => self.student.as_ref(),
            ImageSlot::Father => self.father.as_ref(),
            ImageSlot::Mother => self.mother.as_ref(),
        }
    }

    pub fn set(&mut self, slot: ImageSlot, url: String) {
        let place = match slot {
            ImageSlot::Student => &mut self.student,
            ImageSlot::Father => &mut self.father,
            ImageSlot::Mother => &mut self.mother,
        };
        *place = Some(url);
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct StudentFormErrors: u8 {
        const EMPTY_NAME =          0b0000_0001;
        const EMPTY_CLASS =         0b0000_0010;
        const EMPTY_ROLL_NUMBER =   0b0000_0100;

        const BAD_PREVIOUS_MARKS =  0b0001_0000;

        const BAD_STUDENT_IMAGE =   0b0010_0000;
        const BAD_FATHER_IMAGE =    0b0100_0000;
        const BAD_MOTHER_IMAGE =    0b1000_0000;
    }
}

impl StudentFormErrors {
    pub const fn bad_image(slot: ImageSlot) -> Self {
        match slot {
            ImageSlot::Student => Self::BAD_STUDENT_IMAGE,
            ImageSlot::Father => Self::BAD_FATHER_IMAGE,
            ImageSlot::Mother => Self::BAD_MOTHER_IMAGE,
        }
    }

    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|x| match x {
            Self::EMPTY_NAME => Some("Student name is required"),
            Self::EMPTY_CLASS => Some("Class is required"),
            Self::EMPTY_ROLL_NUMBER => Some("Roll number is required"),
            Self::BAD_PREVIOUS_MARKS => {
                Some("Previous marks must be JSON like {\"math\": 85, \"science\": 90}")
            }
            Self::BAD_STUDENT_IMAGE => Some("Student image must be an image file"),
            Self::BAD_FATHER_IMAGE => Some("Father's image must be an image file"),
            Self::BAD_MOTHER_IMAGE => Some("Mother's image must be an image file"),
            _ => None,
        })
    }
}

///What the add/edit form submits. Optional fields are `None` only when they weren't submitted at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentForm {
    pub name: String,
    pub class: String,
    pub roll_number: String,
    pub phone_number: Option<String>,
    pub father_name: Option<String>,
    pub father_phone: Option<String>,
    pub mother_name: Option<String>,
    pub mother_phone: Option<String>,
    pub previous_marks: Option<String>,
}

impl StudentForm {
    ///returns whether the field name was recognised
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        match name {
            "name" => self.name = value,
            "class" => self.class = value,
            "roll_number" => self.roll_number = value,
            "phone_number" => self.phone_number = Some(value),
            "father_name" => self.father_name = Some(value),
            "father_phone" => self.father_phone = Some(value),
            "mother_name" => self.mother_name = Some(value),
            "mother_phone" => self.mother_phone = Some(value),
            "previous_marks" => self.previous_marks = Some(value),
            _ => return false,
        }
        true
    }

    ///checks everything that can be checked without talking to any store, and parses the marks
    pub fn validate(&self) -> SchoolResult<Option<PreviousMarks>> {
        let mut errors = StudentFormErrors::empty();

        if self.name.trim().is_empty() {
            errors |= StudentFormErrors::EMPTY_NAME;
        }
        if self.class.trim().is_empty() {
            errors |= StudentFormErrors::EMPTY_CLASS;
        }
        if self.roll_number.trim().is_empty() {
            errors |= StudentFormErrors::EMPTY_ROLL_NUMBER;
        }

        let previous_marks =
            match PreviousMarks::parse_form_text(self.previous_marks.as_deref().unwrap_or("")) {
                Ok(marks) => marks,
                Err(e) => {
                    debug!(?e, "Rejecting previous marks");
                    errors |= StudentFormErrors::BAD_PREVIOUS_MARKS;
                    None
                }
            };

        snafu::ensure!(errors.is_empty(), InvalidStudentFormSnafu { errors });
        Ok(previous_marks)
    }

    ///the form as it should look when editing an existing student
    pub fn prefilled_from(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            class: student.class.clone(),
            roll_number: student.roll_number.clone(),
            phone_number: student.phone_number.clone(),
            father_name: student.father_name.clone(),
            father_phone: student.father_phone.clone(),
            mother_name: student.mother_name.clone(),
            mother_phone: student.mother_phone.clone(),
            previous_marks: student
                .previous_marks
                .as_ref()
                .map(PreviousMarks::to_form_text),
        }
    }
}

///An optional field worth showing: set, and not cleared to an empty string by an edit.
pub fn shown(field: Option<&str>) -> Option<&str> {
    field.filter(|value| !value.is_empty())
}

///An empty submission for a field that was never set stays unset; anything else is kept as typed.
fn keep_optional(submitted: Option<String>, stored: Option<&String>) -> Option<String> {
    match submitted {
        None => None,
        Some(value) if value.is_empty() && stored.is_none() => None,
        Some(value) => Some(value),
    }
}

///Every field a client may write. `id`, `created_at` and `qr_code` are deliberately missing.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentPayload {
    pub name: String,
    pub class: String,
    pub roll_number: String,
    pub phone_number: Option<String>,
    pub student_image_url: Option<String>,
    pub father_name: Option<String>,
    pub father_phone: Option<String>,
    pub father_image_url: Option<String>,
    pub mother_name: Option<String>,
    pub mother_phone: Option<String>,
    pub mother_image_url: Option<String>,
    pub previous_marks: Option<PreviousMarks>,
}

impl StudentPayload {
    pub fn assemble(
        form: StudentForm,
        stored: Option<&Student>,
        image_urls: ImageUrls,
        previous_marks: Option<PreviousMarks>,
    ) -> Self {
        let StudentForm {
            name,
            class,
            roll_number,
            phone_number,
            father_name,
            father_phone,
            mother_name,
            mother_phone,
            previous_marks: _,
        } = form;
        let ImageUrls {
            student,
            father,
            mother,
        } = image_urls;

        Self {
            name,
            class,
            roll_number,
            phone_number: keep_optional(phone_number, stored.and_then(|s| s.phone_number.as_ref())),
            student_image_url: student,
            father_name: keep_optional(father_name, stored.and_then(|s| s.father_name.as_ref())),
            father_phone: keep_optional(father_phone, stored.and_then(|s| s.father_phone.as_ref())),
            father_image_url: father,
            mother_name: keep_optional(mother_name, stored.and_then(|s| s.mother_name.as_ref())),
            mother_phone: keep_optional(mother_phone, stored.and_then(|s| s.mother_phone.as_ref())),
            mother_image_url: mother,
            previous_marks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchoolError;

    fn asha_form() -> StudentForm {
        StudentForm {
            name: "Asha".into(),
            class: "5A".into(),
            roll_number: "12".into(),
            ..StudentForm::default()
        }
    }

    #[test]
    fn blank_marks_are_not_recorded() {
        assert_eq!(PreviousMarks::parse_form_text("").unwrap(), None);
        assert_eq!(PreviousMarks::parse_form_text("   ").unwrap(), None);
    }

    #[test]
    fn empty_object_is_still_a_recording() {
        assert_eq!(
            PreviousMarks::parse_form_text("{}").unwrap(),
            Some(PreviousMarks::default())
        );
    }

    #[test]
    fn marks_parse_and_print_back() {
        let marks = PreviousMarks::parse_form_text(r#"{"math": 85, "science": 90.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(marks.0.get("math"), Some(&85.0));
        assert_eq!(marks.0.get("science"), Some(&90.5));

        let reparsed = PreviousMarks::parse_form_text(&marks.to_form_text()).unwrap();
        assert_eq!(reparsed, Some(marks));
    }

    #[test]
    fn whole_marks_print_without_a_fraction() {
        let marks =
            PreviousMarks::parse_form_text(r#"{"math": 85, "science": 90.5, "art": 0}"#)
                .unwrap()
                .unwrap();
        assert_eq!(
            marks.to_form_text(),
            r#"{"art":0,"math":85,"science":90.5}"#
        );
    }

    #[test]
    fn cleared_fields_are_not_shown() {
        assert_eq!(shown(None), None);
        assert_eq!(shown(Some("")), None);
        assert_eq!(shown(Some("555-0100")), Some("555-0100"));
    }

    #[test]
    fn nested_or_textual_marks_are_rejected() {
        assert!(PreviousMarks::parse_form_text(r#"{"math": "A+"}"#).is_err());
        assert!(PreviousMarks::parse_form_text(r#"{"math": {"term1": 80}}"#).is_err());
        assert!(PreviousMarks::parse_form_text("[85, 90]").is_err());
        assert!(PreviousMarks::parse_form_text("math: 85").is_err());
    }

    #[test]
    fn validation_collects_every_problem() {
        let form = StudentForm {
            name: "  ".into(),
            previous_marks: Some("not json".into()),
            ..StudentForm::default()
        };

        let Err(SchoolError::InvalidStudentForm { errors }) = form.validate() else {
            panic!("expected the form to be rejected");
        };
        assert_eq!(
            errors,
            StudentFormErrors::EMPTY_NAME
                | StudentFormErrors::EMPTY_CLASS
                | StudentFormErrors::EMPTY_ROLL_NUMBER
                | StudentFormErrors::BAD_PREVIOUS_MARKS
        );
        assert_eq!(errors.as_nice_list().count(), 4);
    }

    #[test]
    fn valid_form_hands_back_parsed_marks() {
        let mut form = asha_form();
        form.previous_marks = Some(r#"{"math": 85}"#.into());

        let marks = form.validate().unwrap().unwrap();
        assert_eq!(marks.0.len(), 1);
    }

    #[test]
    fn set_field_ignores_unknown_and_client_derived_names() {
        let mut form = StudentForm::default();
        assert!(form.set_field("phone_number", "555-0100".into()));
        assert!(!form.set_field("qr_code", "https://evil.example".into()));
        assert!(!form.set_field("created_at", "yesterday".into()));
        assert_eq!(form.phone_number.as_deref(), Some("555-0100"));
    }

    #[test]
    fn empty_optional_field_stays_absent_unless_it_was_stored_empty() {
        assert_eq!(keep_optional(None, None), None);
        assert_eq!(keep_optional(Some(String::new()), None), None);
        assert_eq!(
            keep_optional(Some(String::new()), Some(&String::new())),
            Some(String::new())
        );
        assert_eq!(
            keep_optional(Some(String::new()), Some(&"555".to_string())),
            Some(String::new())
        );
        assert_eq!(
            keep_optional(Some("555".into()), None),
            Some("555".to_string())
        );
    }

    #[test]
    fn image_slots_map_to_their_namespaces() {
        assert_eq!(ImageSlot::Student.namespace(), "students");
        assert_eq!(ImageSlot::Father.namespace(), "parents");
        assert_eq!(ImageSlot::Mother.namespace(), "parents");
        assert_eq!(
            ImageSlot::from_form_field("mother_image"),
            Some(ImageSlot::Mother)
        );
        assert_eq!(ImageSlot::from_form_field("qr_code"), None);
    }
}
