//! # PgStore
//!
//! PostgreSQL implementation of the repository ports. Vote sets live in
//! `UUID[]` columns next to a denormalised `vote_count` used for sorting.
//! Saves are compare-and-swap on the `version` column. `views` and the
//! acceptance columns are left to their own single-statement updates.

mod rows;

use async_trait::async_trait;
use domains::{
    Answer, AnswerId, AnswerRepository, AppError, Notification, NotificationId,
    NotificationRepository, PageRequest, Question, QuestionFilter, QuestionId, QuestionRepository,
    QuestionSummary, Result, User, UserId, UserRepository, UserSummary,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, error, info};
use uuid::Uuid;

use rows::{
    uuids, AnswerRow, NotificationRow, QuestionRow, QuestionSummaryRow, SummaryRow, UserRow,
    ANSWER_COLUMNS, NOTIFICATION_COLUMNS, QUESTION_COLUMNS, USER_COLUMNS,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_error)?;
        info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("migration failed: {e}")))?;
        debug!("migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn exists(&self, table: &'static str, id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }
}

fn db_error(err: sqlx::Error) -> AppError {
    error!(error = %err, "database error");
    AppError::internal(err.to_string())
}

fn unique_or(err: sqlx::Error, message: &'static str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::validation(message),
        _ => db_error(err),
    }
}

fn foreign_key_or(err: sqlx::Error, entity: &'static str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::ReferentialError(entity)
        }
        _ => db_error(err),
    }
}

fn conflict(kind: &str) -> AppError {
    AppError::Conflict(format!("{kind} was modified concurrently, retry the request"))
}

fn to_i64(value: impl Into<u64>) -> i64 {
    i64::try_from(value.into()).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, avatar, role, reputation, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.role.as_str())
        .bind(user.reputation)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, "User already exists"))?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    async fn find_summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<SummaryRow> =
            sqlx::query_as("SELECT id, username, avatar FROM users WHERE id = ANY($1)")
                .bind(uuids(ids))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(rows.into_iter().map(UserSummary::from).collect())
    }

    async fn adjust_reputation(&self, id: UserId, delta: i32) -> Result<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET reputation = GREATEST(0, reputation + $2) WHERE id = $1 RETURNING reputation",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }
}

#[async_trait]
impl QuestionRepository for PgStore {
    async fn insert_question(&self, question: &Question) -> Result<()> {
        sqlx::query(
            "INSERT INTO questions (id, title, description, tags, user_id, views, upvotes, downvotes, \
             vote_count, accepted_answer, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(question.id.as_uuid())
        .bind(&question.title)
        .bind(&question.description)
        .bind(question.tags.clone())
        .bind(question.user.as_uuid())
        .bind(question.views)
        .bind(uuids(question.votes.upvotes()))
        .bind(uuids(question.votes.downvotes()))
        .bind(question.votes.vote_count())
        .bind(question.accepted_answer.map(|a| a.as_uuid()))
        .bind(question.version)
        .bind(question.created_at)
        .bind(question.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| foreign_key_or(e, "User"))?;
        Ok(())
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>> {
        let row: Option<QuestionRow> =
            sqlx::query_as(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(row.map(Question::from))
    }

    async fn find_question_summaries(&self, ids: &[QuestionId]) -> Result<Vec<QuestionSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(QuestionId::as_uuid).collect();
        let rows: Vec<QuestionSummaryRow> =
            sqlx::query_as("SELECT id, title FROM questions WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(rows.into_iter().map(QuestionSummary::from).collect())
    }

    async fn list_questions(
        &self,
        filter: &QuestionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Question>, u64)> {
        const WHERE: &str = "WHERE ($1::text IS NULL OR position(lower($1) in lower(title)) > 0) \
             AND ($2::text IS NULL OR $2 = ANY(tags))";
        let keyword = filter.keyword.as_deref();
        let tag = filter.tag.as_deref();

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM questions {WHERE}"))
            .bind(keyword)
            .bind(tag)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let rows: Vec<QuestionRow> = sqlx::query_as(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions {WHERE} \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(keyword)
        .bind(tag)
        .bind(to_i64(page.limit()))
        .bind(to_i64(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((rows.into_iter().map(Question::from).collect(), to_u64(total)))
    }

    async fn save_question(&self, question: &Question) -> Result<Question> {
        let row: Option<QuestionRow> = sqlx::query_as(&format!(
            "UPDATE questions SET title = $3, description = $4, tags = $5, upvotes = $6, \
             downvotes = $7, vote_count = $8, updated_at = $9, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(question.id.as_uuid())
        .bind(question.version)
        .bind(&question.title)
        .bind(&question.description)
        .bind(question.tags.clone())
        .bind(uuids(question.votes.upvotes()))
        .bind(uuids(question.votes.downvotes()))
        .bind(question.votes.vote_count())
        .bind(question.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(row.into()),
            None if self.exists("questions", question.id.as_uuid()).await? => {
                Err(conflict("Question"))
            }
            None => Err(AppError::NotFound("Question")),
        }
    }

    async fn increment_views(&self, id: QuestionId) -> Result<Option<Question>> {
        let row: Option<QuestionRow> = sqlx::query_as(&format!(
            "UPDATE questions SET views = views + 1 WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Question::from))
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AnswerRepository for PgStore {
    async fn insert_answer(&self, answer: &Answer) -> Result<()> {
        sqlx::query(
            "INSERT INTO answers (id, content, user_id, question_id, upvotes, downvotes, vote_count, \
             is_accepted, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(answer.id.as_uuid())
        .bind(&answer.content)
        .bind(answer.user.as_uuid())
        .bind(answer.question.as_uuid())
        .bind(uuids(answer.votes.upvotes()))
        .bind(uuids(answer.votes.downvotes()))
        .bind(answer.votes.vote_count())
        .bind(answer.is_accepted)
        .bind(answer.version)
        .bind(answer.created_at)
        .bind(answer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| foreign_key_or(e, "Question"))?;
        Ok(())
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>> {
        let row: Option<AnswerRow> =
            sqlx::query_as(&format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(row.map(Answer::from))
    }

    async fn answers_for_question(&self, question: QuestionId) -> Result<Vec<Answer>> {
        let rows: Vec<AnswerRow> = sqlx::query_as(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = $1 ORDER BY created_at, id"
        ))
        .bind(question.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Answer::from).collect())
    }

    async fn save_answer(&self, answer: &Answer) -> Result<Answer> {
        let row: Option<AnswerRow> = sqlx::query_as(&format!(
            "UPDATE answers SET content = $3, upvotes = $4, downvotes = $5, vote_count = $6, \
             updated_at = $7, version = version + 1 \
             WHERE id = $1 AND version = $2 RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(answer.id.as_uuid())
        .bind(answer.version)
        .bind(&answer.content)
        .bind(uuids(answer.votes.upvotes()))
        .bind(uuids(answer.votes.downvotes()))
        .bind(answer.votes.vote_count())
        .bind(answer.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(row.into()),
            None if self.exists("answers", answer.id.as_uuid()).await? => Err(conflict("Answer")),
            None => Err(AppError::NotFound("Answer")),
        }
    }

    async fn accept_answer(&self, question: QuestionId, answer: AnswerId) -> Result<Option<Answer>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Row lock serialises accepts on the same question.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
                .bind(question.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        if locked.is_none() {
            return Ok(None);
        }

        let row: Option<AnswerRow> = sqlx::query_as(&format!(
            "UPDATE answers SET is_accepted = TRUE \
             WHERE id = $1 AND question_id = $2 RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(answer.as_uuid())
        .bind(question.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let demoted = sqlx::query(
            "UPDATE answers SET is_accepted = FALSE \
             WHERE question_id = $1 AND is_accepted AND id <> $2",
        )
        .bind(question.as_uuid())
        .bind(answer.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query("UPDATE questions SET accepted_answer = $2 WHERE id = $1")
            .bind(question.as_uuid())
            .bind(answer.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(%question, %answer, demoted = demoted.rows_affected(), "answer accepted");
        Ok(Some(row.into()))
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<bool> {
        // questions.accepted_answer is cleared by ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_answers_for_question(&self, question: QuestionId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM answers WHERE question_id = $1")
            .bind(question.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient, sender, kind, question_id, answer_id, message, read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(notification.id.as_uuid())
        .bind(notification.recipient.as_uuid())
        .bind(notification.sender.as_uuid())
        .bind(notification.kind.as_str())
        .bind(notification.question.map(|q| q.as_uuid()))
        .bind(notification.answer.map(|a| a.as_uuid()))
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Notification::try_from).transpose()
    }

    async fn notifications_for(&self, recipient: UserId, limit: u32) -> Result<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(recipient.as_uuid())
        .bind(to_i64(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: NotificationId) -> Result<Option<Notification>> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            "UPDATE notifications SET read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE recipient = $1 AND NOT read")
                .bind(recipient.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn count_unread(&self, recipient: UserId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND NOT read",
        )
        .bind(recipient.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(to_u64(count))
    }
}
