pub mod export;
pub mod index;
pub mod scan;
pub mod sse;
pub mod student_detail;
pub mod student_form;
pub mod students;
