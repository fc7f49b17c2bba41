use crate::db::models::*;
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

pub type DbPool = Pool<Sqlite>;

/// Database operations for contact messages
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a validated message, assigning its id and timestamp
    pub async fn create(pool: &DbPool, new_message: NewMessage) -> AppResult<Message> {
        let message = Message {
            id: NewMessage::generate_message_id(),
            name: new_message.name,
            email: new_message.email,
            message: new_message.message,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO messages (id, name, email, message, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(message.created_at)
        .execute(pool)
        .await?;

        debug!("Stored message {}", message.id);
        Ok(message)
    }

    /// All messages, newest first. Equal timestamps keep insertion order.
    pub async fn list(pool: &DbPool) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, name, email, message, created_at
            FROM messages
            ORDER BY created_at DESC, seq ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Get a single message by id
    pub async fn get(pool: &DbPool, id: &str) -> AppResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            "SELECT id, name, email, message, created_at FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    /// Delete a message. Deleting an unknown id is an error.
    pub async fn delete(pool: &DbPool, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Message"));
        }
        debug!("Deleted message {}", id);
        Ok(())
    }
}

/// Database operations for admin sessions
pub struct SessionRepo;

impl SessionRepo {
    /// Insert or replace a session
    pub async fn save(pool: &DbPool, session: &Session) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_sessions (session_id, authenticated, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                authenticated = excluded.authenticated,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&session.session_id)
        .bind(session.authenticated)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Get session by session ID
    pub async fn get_by_session_id(pool: &DbPool, session_id: &str) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT session_id, authenticated, expires_at, created_at
            FROM admin_sessions
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Delete expired sessions
    pub async fn cleanup_expired(pool: &DbPool) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete a session
    pub async fn delete(pool: &DbPool, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub async fn setup_test_db() -> DbPool {
    use sqlx::sqlite::SqlitePoolOptions;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_db(&pool).await.expect("Failed to init database");
    pool
}

/// Initialize database with migrations
pub async fn init_db(pool: &DbPool) -> AppResult<()> {
    info!("Running database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT UNIQUE NOT NULL,
            authenticated BOOLEAN NOT NULL DEFAULT false,
            expires_at DATETIME NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at, seq)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON admin_sessions(expires_at)")
        .execute(pool)
        .await?;

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_message(name: &str, body: &str) -> NewMessage {
        NewMessage {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            message: body.to_string(),
        }
    }

    // --- MessageRepo tests ---

    #[tokio::test]
    async fn test_message_create_assigns_id_and_timestamp() {
        let pool = setup_test_db().await;
        let before = Utc::now();

        let msg = MessageRepo::create(&pool, new_message("A", "hi")).await.unwrap();
        assert!(!msg.id.is_empty());
        assert!(msg.created_at >= before);

        let stored = MessageRepo::get(&pool, &msg.id).await.unwrap().unwrap();
        assert_eq!(stored, msg);
    }

    #[tokio::test]
    async fn test_message_ids_are_unique() {
        let pool = setup_test_db().await;
        let a = MessageRepo::create(&pool, new_message("A", "one")).await.unwrap();
        let b = MessageRepo::create(&pool, new_message("A", "one")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(MessageRepo::list(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_message_list_newest_first() {
        let pool = setup_test_db().await;
        for body in ["first", "second", "third"] {
            MessageRepo::create(&pool, new_message("A", body)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let messages = MessageRepo::list(&pool).await.unwrap();
        let bodies: Vec<_> = messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["third", "second", "first"]);
        assert!(messages.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_message_list_ties_keep_insertion_order() {
        let pool = setup_test_db().await;
        let at = Utc::now();
        for id in ["m1", "m2", "m3"] {
            sqlx::query(
                "INSERT INTO messages (id, name, email, message, created_at) VALUES (?, 'A', 'a@x.com', 'hi', ?)",
            )
            .bind(id)
            .bind(at)
            .execute(&pool)
            .await
            .unwrap();
        }

        let ids: Vec<_> = MessageRepo::list(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_message_delete() {
        let pool = setup_test_db().await;
        let msg = MessageRepo::create(&pool, new_message("A", "bye")).await.unwrap();

        MessageRepo::delete(&pool, &msg.id).await.unwrap();
        assert!(MessageRepo::get(&pool, &msg.id).await.unwrap().is_none());
        assert!(MessageRepo::list(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_delete_unknown_is_not_found() {
        let pool = setup_test_db().await;
        MessageRepo::create(&pool, new_message("A", "keep")).await.unwrap();

        let err = MessageRepo::delete(&pool, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(MessageRepo::list(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_database_error() {
        let pool = setup_test_db().await;
        pool.close().await;
        let err = MessageRepo::create(&pool, new_message("A", "hi")).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    // --- SessionRepo tests ---

    #[tokio::test]
    async fn test_session_save_and_get() {
        let pool = setup_test_db().await;
        let session = Session::new(Duration::hours(1));
        SessionRepo::save(&pool, &session).await.unwrap();

        let stored = SessionRepo::get_by_session_id(&pool, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.session_id, session.session_id);
        assert!(!stored.authenticated);
    }

    #[tokio::test]
    async fn test_session_save_updates_flag() {
        let pool = setup_test_db().await;
        let mut session = Session::new(Duration::hours(1));
        SessionRepo::save(&pool, &session).await.unwrap();

        session.authenticated = true;
        SessionRepo::save(&pool, &session).await.unwrap();

        let stored = SessionRepo::get_by_session_id(&pool, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.authenticated);
    }

    #[tokio::test]
    async fn test_session_cleanup_expired() {
        let pool = setup_test_db().await;
        let live = Session::new(Duration::hours(1));
        let stale = Session::new(Duration::hours(-1));
        SessionRepo::save(&pool, &live).await.unwrap();
        SessionRepo::save(&pool, &stale).await.unwrap();

        assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 1);
        assert!(SessionRepo::get_by_session_id(&pool, &live.session_id).await.unwrap().is_some());
        assert!(SessionRepo::get_by_session_id(&pool, &stale.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_delete() {
        let pool = setup_test_db().await;
        let session = Session::new(Duration::hours(1));
        SessionRepo::save(&pool, &session).await.unwrap();

        SessionRepo::delete(&pool, &session.session_id).await.unwrap();
        assert!(SessionRepo::get_by_session_id(&pool, &session.session_id).await.unwrap().is_none());
    }
}
