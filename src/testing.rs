//! In-memory stand-ins for the record and blob stores, plus a QR decoder, for tests.

use crate::{
    blob::{BlobHandle, BlobStore},
    data::{
        StudentStore,
        student::{Student, StudentPayload},
    },
    error::{MakeQuerySnafu, MissingStudentSnafu, S3Snafu, SchoolResult},
};
use image::{DynamicImage, ImageFormat, Luma};
use s3::error::S3Error;
use snafu::{IntoError, OptionExt};
use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use time::OffsetDateTime;
use uuid::Uuid;

pub const BLOB_URL_BASE: &str = "https://blobs.example.org/student-images";

#[derive(Default)]
pub struct MemoryStudentStore {
    students: Mutex<Vec<Student>>,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl MemoryStudentStore {
    pub fn snapshot(&self) -> Vec<Student> {
        self.students.lock().unwrap().clone()
    }

    pub fn insert_existing(&self, student: Student) {
        self.students.lock().unwrap().push(student);
    }

    fn check(flag: &AtomicBool) -> SchoolResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(MakeQuerySnafu.into_error(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn apply(student: &mut Student, payload: &StudentPayload) {
    let payload = payload.clone();
    student.name = payload.name;
    student.class = payload.class;
    student.roll_number = payload.roll_number;
    student.phone_number = payload.phone_number;
    student.student_image_url = payload.student_image_url;
    student.father_name = payload.father_name;
    student.father_phone = payload.father_phone;
    student.father_image_url = payload.father_image_url;
    student.mother_name = payload.mother_name;
    student.mother_phone = payload.mother_phone;
    student.mother_image_url = payload.mother_image_url;
    student.previous_marks = payload.previous_marks;
}

pub fn blank_student(id: Uuid) -> Student {
    Student {
        id,
        name: String::new(),
        class: String::new(),
        roll_number: String::new(),
        phone_number: None,
        student_image_url: None,
        father_name: None,
        father_phone: None,
        father_image_url: None,
        mother_name: None,
        mother_phone: None,
        mother_image_url: None,
        previous_marks: None,
        qr_code: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

impl StudentStore for MemoryStudentStore {
    async fn get_from_db_by_id(&self, id: Uuid) -> SchoolResult<Option<Student>> {
        Self::check(&self.fail_reads)?;
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_all(&self) -> SchoolResult<Vec<Student>> {
        Self::check(&self.fail_reads)?;
        let mut all = self.snapshot();
        all.sort_by(|a, b| (&a.class, &a.roll_number).cmp(&(&b.class, &b.roll_number)));
        Ok(all)
    }

    async fn insert_into_database(&self, payload: &StudentPayload) -> SchoolResult<Uuid> {
        Self::check(&self.fail_writes)?;
        let id = Uuid::new_v4();
        let mut student = blank_student(id);
        apply(&mut student, payload);
        self.students.lock().unwrap().push(student);
        Ok(id)
    }

    async fn update_in_database(&self, id: Uuid, payload: &StudentPayload) -> SchoolResult<()> {
        Self::check(&self.fail_writes)?;
        let mut students = self.students.lock().unwrap();
        let student = students
            .iter_mut()
            .find(|s| s.id == id)
            .context(MissingStudentSnafu { id })?;
        apply(student, payload);
        Ok(())
    }

    async fn set_qr_code(&self, id: Uuid, qr_code: &str) -> SchoolResult<()> {
        Self::check(&self.fail_writes)?;
        let mut students = self.students.lock().unwrap();
        let student = students
            .iter_mut()
            .find(|s| s.id == id)
            .context(MissingStudentSnafu { id })?;
        student.qr_code = Some(qr_code.to_string());
        Ok(())
    }

    async fn remove_from_database(&self, id: Uuid) -> SchoolResult<()> {
        Self::check(&self.fail_writes)?;
        let mut students = self.students.lock().unwrap();
        let before = students.len();
        students.retain(|s| s.id != id);
        snafu::ensure!(students.len() < before, MissingStudentSnafu { id });
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    ///uploads beyond this many succeed-so-far fail, if set
    pub fail_after: Mutex<Option<usize>>,
    uploads: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn bytes_at_url(&self, url: &str) -> Option<Vec<u8>> {
        let path = url.strip_prefix(BLOB_URL_BASE)?.strip_prefix('/')?;
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .map(|(bytes, _)| bytes.clone())
    }
}

impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> SchoolResult<BlobHandle> {
        if let Some(limit) = *self.fail_after.lock().unwrap() {
            if self.uploads.load(Ordering::SeqCst) >= limit {
                return Err(S3Snafu.into_error(S3Error::HttpFailWithBody(
                    503,
                    "SlowDown".to_string(),
                )));
            }
        }

        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(BlobHandle {
            path: path.to_string(),
        })
    }

    fn public_url(&self, handle: &BlobHandle) -> String {
        format!("{BLOB_URL_BASE}/{}", handle.path)
    }
}

///a 1x1 grey PNG, enough to pass as a photo
pub fn tiny_png() -> Vec<u8> {
    let img = image::ImageBuffer::from_pixel(1, 1, Luma([128u8]));
    let mut png = Cursor::new(vec![]);
    DynamicImage::ImageLuma8(img)
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();
    png.into_inner()
}

pub fn decode_qr_png(png: &[u8]) -> String {
    let img = image::load_from_memory_with_format(png, ImageFormat::Png)
        .unwrap()
        .to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code in the image");
    let (_, content) = grids[0].decode().unwrap();
    content
}
