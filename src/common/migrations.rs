// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if they don't exist. With `reset` set, existing tables
/// are dropped first.
pub async fn run_migrations(pool: &SqlitePool, reset: bool) -> Result<(), sqlx::Error> {
    if reset {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    }

    create_user_tables(pool).await?;
    create_video_tables(pool).await?;
    create_stream_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Drop tables in reverse dependency order
    for table in ["streams", "videos", "users"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // email is the natural key from the identity provider; the UNIQUE
    // constraint is what makes sign-in an insert-if-absent.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            name TEXT,
            avatar_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_video_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            video_key TEXT NOT NULL,
            visibility TEXT NOT NULL DEFAULT 'private'
                CHECK (visibility IN ('public', 'private', 'unlisted')),
            user_id TEXT NOT NULL,
            thumbnail_url TEXT,
            duration REAL,
            file_size INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_stream_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS streams (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            cf_stream_id TEXT NOT NULL,
            rtmp_url TEXT NOT NULL,
            stream_key TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'idle'
                CHECK (status IN ('idle', 'live', 'ended')),
            user_id TEXT NOT NULL,
            viewer_count INTEGER NOT NULL DEFAULT 0,
            started_at TEXT,
            ended_at TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_videos_user_id ON videos(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_videos_visibility ON videos(visibility)",
        "CREATE INDEX IF NOT EXISTS idx_streams_user_id ON streams(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_streams_status ON streams(status)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}
