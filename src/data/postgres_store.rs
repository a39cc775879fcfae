use crate::{
    data::{
        StudentStore,
        student::{PreviousMarks, Student, StudentPayload},
    },
    error::{MakeQuerySnafu, MissingStudentSnafu, SchoolResult},
};
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Postgres, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

const STUDENT_COLUMNS: &str = "id, name, class, roll_number, phone_number, student_image_url, father_name, father_phone, father_image_url, mother_name, mother_phone, mother_image_url, previous_marks, qr_code, created_at";

#[derive(FromRow)]
struct StudentRow {
    id: Uuid,
    name: String,
    class: String,
    roll_number: String,
    phone_number: Option<String>,
    student_image_url: Option<String>,
    father_name: Option<String>,
    father_phone: Option<String>,
    father_image_url: Option<String>,
    mother_name: Option<String>,
    mother_phone: Option<String>,
    mother_image_url: Option<String>,
    previous_marks: Option<Json<PreviousMarks>>,
    qr_code: Option<String>,
    created_at: OffsetDateTime,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            class: row.class,
            roll_number: row.roll_number,
            phone_number: row.phone_number,
            student_image_url: row.student_image_url,
            father_name: row.father_name,
            father_phone: row.father_phone,
            father_image_url: row.father_image_url,
            mother_name: row.mother_name,
            mother_phone: row.mother_phone,
            mother_image_url: row.mother_image_url,
            previous_marks: row.previous_marks.map(|Json(marks)| marks),
            qr_code: row.qr_code,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgStudentStore {
    pool: Pool<Postgres>,
}

impl PgStudentStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl StudentStore for PgStudentStore {
    async fn get_from_db_by_id(&self, id: Uuid) -> SchoolResult<Option<Student>> {
        sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM public.students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)
        .map(|row| row.map(Student::from))
    }

    async fn get_all(&self) -> SchoolResult<Vec<Student>> {
        Ok(sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM public.students ORDER BY class ASC, roll_number ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .into_iter()
        .map(Student::from)
        .collect())
    }

    async fn insert_into_database(&self, payload: &StudentPayload) -> SchoolResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("INSERT INTO public.students (name, class, roll_number, phone_number, student_image_url, father_name, father_phone, father_image_url, mother_name, mother_phone, mother_image_url, previous_marks) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id")
            .bind(&payload.name)
            .bind(&payload.class)
            .bind(&payload.roll_number)
            .bind(payload.phone_number.as_deref())
            .bind(payload.student_image_url.as_deref())
            .bind(payload.father_name.as_deref())
            .bind(payload.father_phone.as_deref())
            .bind(payload.father_image_url.as_deref())
            .bind(payload.mother_name.as_deref())
            .bind(payload.mother_phone.as_deref())
            .bind(payload.mother_image_url.as_deref())
            .bind(payload.previous_marks.clone().map(Json))
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn update_in_database(&self, id: Uuid, payload: &StudentPayload) -> SchoolResult<()> {
        let updated = sqlx::query("UPDATE public.students SET name = $2, class = $3, roll_number = $4, phone_number = $5, student_image_url = $6, father_name = $7, father_phone = $8, father_image_url = $9, mother_name = $10, mother_phone = $11, mother_image_url = $12, previous_marks = $13 WHERE id = $1")
            .bind(id)
            .bind(&payload.name)
            .bind(&payload.class)
            .bind(&payload.roll_number)
            .bind(payload.phone_number.as_deref())
            .bind(payload.student_image_url.as_deref())
            .bind(payload.father_name.as_deref())
            .bind(payload.father_phone.as_deref())
            .bind(payload.father_image_url.as_deref())
            .bind(payload.mother_name.as_deref())
            .bind(payload.mother_phone.as_deref())
            .bind(payload.mother_image_url.as_deref())
            .bind(payload.previous_marks.clone().map(Json))
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();

        snafu::ensure!(updated > 0, MissingStudentSnafu { id });
        Ok(())
    }

    async fn set_qr_code(&self, id: Uuid, qr_code: &str) -> SchoolResult<()> {
        let updated = sqlx::query("UPDATE public.students SET qr_code = $2 WHERE id = $1")
            .bind(id)
            .bind(qr_code)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();

        snafu::ensure!(updated > 0, MissingStudentSnafu { id });
        Ok(())
    }

    async fn remove_from_database(&self, id: Uuid) -> SchoolResult<()> {
        let deleted = sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();

        snafu::ensure!(deleted > 0, MissingStudentSnafu { id });
        Ok(())
    }
}
