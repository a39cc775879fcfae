use crate::{
    blob::{BlobStore, PendingImage, collision_resistant_path},
    data::{
        StudentStore,
        student::{
            ImageSlot, ImageUrls, Student, StudentForm, StudentFormErrors, StudentPayload,
        },
    },
    error::{InvalidStudentFormSnafu, MissingStudentSnafu, SchoolError, SchoolResult},
    qr,
};
use snafu::OptionExt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: Uuid,
    pub created: bool,
    pub qr_code: String,
}

///Everything one submission of the student form carries. It's consumed by [`SaveJob::run`], so
///nothing from one save leaks into the next.
#[derive(Debug)]
pub struct SaveJob {
    existing_id: Option<Uuid>,
    form: StudentForm,
    images: Vec<PendingImage>,
    rejected_images: StudentFormErrors,
}

impl SaveJob {
    pub const fn new(existing_id: Option<Uuid>, form: StudentForm) -> Self {
        Self {
            existing_id,
            form,
            images: vec![],
            rejected_images: StudentFormErrors::empty(),
        }
    }

    ///a later image for the same slot replaces an earlier one
    pub fn add_image(&mut self, image: PendingImage) {
        self.images.retain(|pending| pending.slot != image.slot);
        self.images.push(image);
    }

    ///remembers that the upload for this slot wasn't an image, to be reported with the rest of the form
    pub fn reject_image(&mut self, slot: ImageSlot) {
        self.images.retain(|pending| pending.slot != slot);
        self.rejected_images |= StudentFormErrors::bad_image(slot);
    }

    ///Validate, upload new photos, create or update the record, then generate and store its QR code.
    ///
    ///The first failure is returned as-is. Photos uploaded and records written before that point stay
    ///where they are - resubmitting redoes every step.
    pub async fn run<S: StudentStore, B: BlobStore>(
        self,
        students: &S,
        blobs: &B,
        origin: &str,
    ) -> SchoolResult<SaveOutcome> {
        let previous_marks = match self.form.validate() {
            Ok(marks) if self.rejected_images.is_empty() => marks,
            Ok(_) => {
                return InvalidStudentFormSnafu {
                    errors: self.rejected_images,
                }
                .fail();
            }
            Err(SchoolError::InvalidStudentForm { errors }) => {
                return InvalidStudentFormSnafu {
                    errors: errors | self.rejected_images,
                }
                .fail();
            }
            Err(e) => return Err(e),
        };

        let stored = match self.existing_id {
            Some(id) => Some(
                students
                    .get_from_db_by_id(id)
                    .await?
                    .context(MissingStudentSnafu { id })?,
            ),
            None => None,
        };

        let image_urls = self.upload_images(blobs, stored.as_ref()).await?;

        let payload =
            StudentPayload::assemble(self.form, stored.as_ref(), image_urls, previous_marks);

        let (id, created) = match self.existing_id {
            Some(id) => {
                students.update_in_database(id, &payload).await?;
                (id, false)
            }
            None => (students.insert_into_database(&payload).await?, true),
        };
        info!(?id, created, "Saved student record");

        let qr_code = store_qr_code(students, blobs, origin, id).await?;

        Ok(SaveOutcome {
            id,
            created,
            qr_code,
        })
    }

    async fn upload_images<B: BlobStore>(
        &self,
        blobs: &B,
        stored: Option<&Student>,
    ) -> SchoolResult<ImageUrls> {
        let mut urls = stored.map(Student::image_urls).unwrap_or_default();

        for image in &self.images {
            let path = image.blob_path();
            let handle = blobs
                .upload(&path, &image.bytes, image.content_type)
                .await?;
            debug!(?path, slot = ?image.slot, "Uploaded student photo");
            urls.set(image.slot, blobs.public_url(&handle));
        }

        Ok(urls)
    }
}

///Renders the student's locator as a QR PNG, uploads it under `qr_codes/<id>/` and points the record at it.
pub async fn store_qr_code<S: StudentStore, B: BlobStore>(
    students: &S,
    blobs: &B,
    origin: &str,
    id: Uuid,
) -> SchoolResult<String> {
    let locator = qr::student_locator(origin, id);
    let png = qr::encode_png(&locator)?;

    let handle = blobs
        .upload(
            &collision_resistant_path(&format!("qr_codes/{id}"), "png"),
            &png,
            "image/png",
        )
        .await?;
    let url = blobs.public_url(&handle);

    students.set_qr_code(id, &url).await?;
    debug!(?id, ?url, "Stored QR code");

    Ok(url)
}
