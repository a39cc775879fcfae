use crate::{data::student::Student, qr::parse_student_locator};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(Uuid),
    NotFound,
}

///Matches decoded QR text against each student's stored `qr_code`, first match wins.
///
///The match is substring containment, not equality, and nothing checks that only one student
///matched. When the text itself doesn't appear anywhere but is a student locator, the id inside it
///is looked for instead, since stored codes are blob URLs under `qr_codes/<id>/`.
pub fn resolve_scan(students: &[Student], decoded: &str) -> ScanOutcome {
    let decoded = decoded.trim();
    if decoded.is_empty() {
        return ScanOutcome::NotFound;
    }

    let find_containing = |needle: &str| {
        students
            .iter()
            .find(|student| {
                student
                    .qr_code
                    .as_deref()
                    .is_some_and(|qr_code| qr_code.contains(needle))
            })
            .map(|student| student.id)
    };

    let found = find_containing(decoded).or_else(|| {
        let id = parse_student_locator(decoded)?;
        find_containing(&id.to_string())
    });

    found.map_or(ScanOutcome::NotFound, ScanOutcome::Found)
}
