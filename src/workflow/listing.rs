use crate::{
    data::{StudentStore, student::Student},
    error::SchoolResult,
};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClassFilter {
    #[default]
    All,
    Class(String),
}

impl ClassFilter {
    pub const ALL_SENTINEL: &'static str = "all";

    pub fn from_query(class: Option<&str>) -> Self {
        match class {
            None | Some("" | Self::ALL_SENTINEL) => Self::All,
            Some(class) => Self::Class(class.to_string()),
        }
    }

    pub fn as_query_value(&self) -> &str {
        match self {
            Self::All => Self::ALL_SENTINEL,
            Self::Class(class) => class,
        }
    }

    pub fn matches(&self, student: &Student) -> bool {
        match self {
            Self::All => true,
            Self::Class(class) => &student.class == class,
        }
    }
}

///Every student, as loaded in one go, plus the class labels seen among them.
#[derive(Debug, Clone, Default)]
pub struct StudentListing {
    students: Vec<Student>,
    classes: Vec<String>,
}

impl StudentListing {
    ///all or nothing - a failed load never yields a partial listing
    pub async fn load<S: StudentStore>(store: &S) -> SchoolResult<Self> {
        let students = store.get_all().await?;
        debug!(n = students.len(), "Loaded students");
        Ok(Self::from_students(students))
    }

    pub fn from_students(students: Vec<Student>) -> Self {
        let mut seen = HashSet::new();
        let classes = students
            .iter()
            .filter(|student| seen.insert(student.class.as_str()))
            .map(|student| student.class.clone())
            .collect();

        Self { students, classes }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    ///distinct class labels, in order of first appearance
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn filter(&self, filter: &ClassFilter) -> Vec<&Student> {
        self.students
            .iter()
            .filter(|student| filter.matches(student))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::student::StudentPayload,
        testing::{MemoryStudentStore, blank_student},
    };
    use std::sync::atomic::Ordering;
    use uuid::Uuid;

    fn student(name: &str, class: &str, roll_number: &str) -> Student {
        Student {
            name: name.into(),
            class: class.into(),
            roll_number: roll_number.into(),
            ..blank_student(Uuid::new_v4())
        }
    }

    fn sample() -> StudentListing {
        StudentListing::from_students(vec![
            student("Asha", "5A", "12"),
            student("Bilal", "5A", "3"),
            student("Chen", "5B", "1"),
            student("Dara", "6A", "7"),
            student("Esi", "5B", "2"),
        ])
    }

    #[test]
    fn sentinel_and_blank_mean_all() {
        assert_eq!(ClassFilter::from_query(None), ClassFilter::All);
        assert_eq!(ClassFilter::from_query(Some("")), ClassFilter::All);
        assert_eq!(ClassFilter::from_query(Some("all")), ClassFilter::All);
        assert_eq!(
            ClassFilter::from_query(Some("5A")),
            ClassFilter::Class("5A".into())
        );
        assert_eq!(ClassFilter::Class("5A".into()).as_query_value(), "5A");
        assert_eq!(ClassFilter::All.as_query_value(), "all");
    }

    #[test]
    fn classes_are_distinct_in_first_seen_order() {
        assert_eq!(sample().classes(), ["5A", "5B", "6A"]);
    }

    #[test]
    fn filtering_by_each_class_gives_exactly_that_class() {
        let listing = sample();

        for class in listing.classes() {
            let filtered = listing.filter(&ClassFilter::Class(class.clone()));
            let expected: Vec<_> = listing
                .students()
                .iter()
                .filter(|s| &s.class == class)
                .collect();
            assert_eq!(filtered, expected);
        }
    }

    #[test]
    fn filtering_by_all_keeps_everything_in_order() {
        let listing = sample();
        let all: Vec<_> = listing.students().iter().collect();
        assert_eq!(listing.filter(&ClassFilter::All), all);
    }

    #[test]
    fn unknown_class_filters_to_nothing() {
        assert!(sample().filter(&ClassFilter::Class("9Z".into())).is_empty());
    }

    #[tokio::test]
    async fn loading_orders_by_class_then_roll_number() {
        let store = MemoryStudentStore::default();
        for (name, class, roll) in [("Dara", "6A", "7"), ("Asha", "5A", "12"), ("Bilal", "5A", "3")] {
            store
                .insert_into_database(&StudentPayload {
                    name: name.into(),
                    class: class.into(),
                    roll_number: roll.into(),
                    phone_number: None,
                    student_image_url: None,
                    father_name: None,
                    father_phone: None,
                    father_image_url: None,
                    mother_name: None,
                    mother_phone: None,
                    mother_image_url: None,
                    previous_marks: None,
                })
                .await
                .unwrap();
        }

        let listing = StudentListing::load(&store).await.unwrap();
        let names: Vec<_> = listing.students().iter().map(|s| s.name.as_str()).collect();
        // roll numbers are text, so "12" sorts before "3"
        assert_eq!(names, ["Asha", "Bilal", "Dara"]);
        assert_eq!(listing.classes(), ["5A", "6A"]);
    }

    #[tokio::test]
    async fn failed_load_is_an_error_not_a_partial_list() {
        let store = MemoryStudentStore::default();
        store.insert_existing(student("Asha", "5A", "12"));
        store.fail_reads.store(true, Ordering::SeqCst);

        assert!(StudentListing::load(&store).await.is_err());
    }
}
