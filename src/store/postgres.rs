//! PostgreSQL store using sqlx.

use super::BugStore;
use crate::error::{StoreError, StoreResult};
use crate::model::{Bug, BugId, NewBug, User, UserId};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Row returned from the bug list query
#[derive(Debug, FromRow)]
struct BugRow {
    id: String,
    description: String,
    priority: String,
    sort_order: i32,
    create_by: String,
    create_by_id: String,
    assigned_to: String,
    assigned_to_id: String,
}

impl From<BugRow> for Bug {
    fn from(row: BugRow) -> Self {
        Bug {
            id: BugId(row.id),
            description: row.description,
            priority: row.priority,
            order: row.sort_order,
            create_by: row.create_by,
            create_by_id: row.create_by_id,
            assigned_to: row.assigned_to,
            assigned_to_id: UserId(row.assigned_to_id),
        }
    }
}

/// Row returned from the user list query
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    bug_count: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            name: row.name,
            bug_count: row.bug_count,
        }
    }
}

const SCHEMA: [&str; 3] = [
    "CREATE SCHEMA IF NOT EXISTS bug_tracker",
    r#"
    CREATE TABLE IF NOT EXISTS bug_tracker.users (
        id TEXT PRIMARY KEY DEFAULT gen_random_uuid()::text,
        name TEXT NOT NULL,
        bug_count BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bug_tracker.bugs (
        id TEXT PRIMARY KEY DEFAULT gen_random_uuid()::text,
        description TEXT NOT NULL,
        priority TEXT NOT NULL,
        sort_order INTEGER NOT NULL,
        create_by TEXT NOT NULL,
        create_by_id TEXT NOT NULL,
        assigned_to TEXT NOT NULL,
        assigned_to_id TEXT NOT NULL
    )
    "#,
];

const INSERT_BUG: &str = r#"
    INSERT INTO bug_tracker.bugs
        (description, priority, sort_order, create_by, create_by_id, assigned_to, assigned_to_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id
"#;

const INCREMENT_COUNT: &str =
    "UPDATE bug_tracker.users SET bug_count = bug_count + 1 WHERE id = $1";

const DECREMENT_COUNT: &str =
    "UPDATE bug_tracker.users SET bug_count = bug_count - 1 WHERE id = $1";

/// Database client with connection pool
pub struct PgStore {
    pool: PgPool,
    runtime: Arc<Runtime>,
}

impl PgStore {
    /// Connect and make sure the schema exists.
    pub fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let runtime = Runtime::new().map_err(StoreError::Runtime)?;

        let pool = runtime
            .block_on(async {
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(url)
                    .await
            })
            .map_err(StoreError::Connect)?;

        let store = Self {
            pool,
            runtime: Arc::new(runtime),
        };
        store.migrate()?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(store)
    }

    fn migrate(&self) -> StoreResult<()> {
        self.runtime.block_on(async {
            for statement in SCHEMA {
                sqlx::query(statement).execute(&self.pool).await?;
            }
            Ok::<_, StoreError>(())
        })
    }

    fn adjust_count(&self, statement: &'static str, user: &UserId) -> StoreResult<()> {
        self.runtime.block_on(async {
            let result = sqlx::query(statement)
                .bind(&user.0)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(missing_user(user));
            }
            Ok(())
        })
    }
}

fn missing_user(user: &UserId) -> StoreError {
    StoreError::NotFound {
        collection: "users",
        id: user.to_string(),
    }
}

fn bind_new_bug<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, (String,), sqlx::postgres::PgArguments>,
    bug: &'q NewBug,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, (String,), sqlx::postgres::PgArguments> {
    query
        .bind(&bug.description)
        .bind(bug.priority.label())
        .bind(bug.order)
        .bind(&bug.create_by)
        .bind(&bug.create_by_id)
        .bind(&bug.assigned_to)
        .bind(&bug.assigned_to_id.0)
}

impl BugStore for PgStore {
    fn list_bugs(&self) -> StoreResult<Vec<Bug>> {
        self.runtime.block_on(async {
            let rows: Vec<BugRow> = sqlx::query_as(
                r#"
                SELECT
                    id,
                    description,
                    priority,
                    sort_order,
                    create_by,
                    create_by_id,
                    assigned_to,
                    assigned_to_id
                FROM bug_tracker.bugs
                ORDER BY sort_order ASC
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

            Ok::<_, StoreError>(rows.into_iter().map(Bug::from).collect())
        })
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        self.runtime.block_on(async {
            let rows: Vec<UserRow> = sqlx::query_as(
                "SELECT id, name, bug_count FROM bug_tracker.users ORDER BY name ASC",
            )
            .fetch_all(&self.pool)
            .await?;

            Ok::<_, StoreError>(rows.into_iter().map(User::from).collect())
        })
    }

    fn insert_bug(&self, bug: NewBug) -> StoreResult<BugId> {
        self.runtime.block_on(async {
            let (id,) = bind_new_bug(sqlx::query_as(INSERT_BUG), &bug)
                .fetch_one(&self.pool)
                .await?;
            Ok::<_, StoreError>(BugId(id))
        })
    }

    fn delete_bug(&self, id: &BugId) -> StoreResult<()> {
        self.runtime.block_on(async {
            sqlx::query("DELETE FROM bug_tracker.bugs WHERE id = $1")
                .bind(&id.0)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(())
        })
    }

    fn increment_bug_count(&self, user: &UserId) -> StoreResult<()> {
        self.adjust_count(INCREMENT_COUNT, user)
    }

    fn decrement_bug_count(&self, user: &UserId) -> StoreResult<()> {
        self.adjust_count(DECREMENT_COUNT, user)
    }

    /// Counter bump and insert commit together or not at all.
    fn file_bug(&self, bug: NewBug) -> StoreResult<BugId> {
        self.runtime.block_on(async {
            let mut tx = self.pool.begin().await?;

            let updated = sqlx::query(INCREMENT_COUNT)
                .bind(&bug.assigned_to_id.0)
                .execute(&mut *tx)
                .await?;
            if updated.rows_affected() == 0 {
                // Dropping tx rolls back
                return Err(missing_user(&bug.assigned_to_id));
            }

            let (id,) = bind_new_bug(sqlx::query_as(INSERT_BUG), &bug)
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(BugId(id))
        })
    }

    /// Delete and counter drop commit together. The counter only moves
    /// when a row was actually deleted, so resolving twice counts once.
    fn resolve_bug(&self, id: &BugId, user: &UserId) -> StoreResult<()> {
        self.runtime.block_on(async {
            let mut tx = self.pool.begin().await?;

            let deleted = sqlx::query("DELETE FROM bug_tracker.bugs WHERE id = $1")
                .bind(&id.0)
                .execute(&mut *tx)
                .await?;

            if deleted.rows_affected() > 0 {
                sqlx::query(DECREMENT_COUNT)
                    .bind(&user.0)
                    .execute(&mut *tx)
                    .await?;
            } else {
                tracing::debug!(bug = %id, "Bug already gone, counter left alone");
            }

            tx.commit().await?;
            Ok::<_, StoreError>(())
        })
    }
}
