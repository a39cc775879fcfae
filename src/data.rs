use crate::{
    data::student::{Student, StudentPayload},
    error::SchoolResult,
};
use serde::Deserialize;
use uuid::Uuid;

pub mod postgres_store;
pub mod student;

#[derive(Deserialize)]
pub struct IdForm {
    pub id: Uuid,
}

///The record store: everything the workflows need from wherever students actually live.
///
///There are no transactions across calls - each method is atomic on its own and nothing more.
pub trait StudentStore {
    async fn get_from_db_by_id(&self, id: Uuid) -> SchoolResult<Option<Student>>;
    ///ordered by class, then by roll number (both ascending)
    async fn get_all(&self) -> SchoolResult<Vec<Student>>;
    ///returns the id the store assigned
    async fn insert_into_database(&self, payload: &StudentPayload) -> SchoolResult<Uuid>;
    ///replaces every editable field. fails with `MissingStudent` if nothing was updated
    async fn update_in_database(&self, id: Uuid, payload: &StudentPayload) -> SchoolResult<()>;
    async fn set_qr_code(&self, id: Uuid, qr_code: &str) -> SchoolResult<()>;
    ///fails with `MissingStudent` if nothing was deleted
    async fn remove_from_database(&self, id: Uuid) -> SchoolResult<()>;
}
