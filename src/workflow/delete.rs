use crate::{
    data::StudentStore,
    error::{DeleteNotConfirmedSnafu, SchoolResult},
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
}

impl From<Option<bool>> for Confirmation {
    fn from(confirmed: Option<bool>) -> Self {
        if confirmed == Some(true) {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }
}

///Hard-deletes one student. Their photos and QR code stay in blob storage.
pub async fn delete_student<S: StudentStore>(
    store: &S,
    id: Uuid,
    confirmation: Confirmation,
) -> SchoolResult<()> {
    snafu::ensure!(
        confirmation == Confirmation::Confirmed,
        DeleteNotConfirmedSnafu { id }
    );

    store.remove_from_database(id).await?;
    info!(?id, "Deleted student");
    Ok(())
}
