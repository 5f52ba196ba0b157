//! Persistence of `tea` rows. One long-lived PostgreSQL connection, one
//! autocommitted conflict-ignoring insert per row.

use crate::config::PgSettings;
use crate::error::StoreError;
use crate::row::TeaRow;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use time::PrimitiveDateTime;

pub const CREATE_TEA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tea (
    postid      TEXT PRIMARY KEY,
    title       TEXT,
    url         TEXT,
    permalink   TEXT,
    selftext    TEXT,
    comments    TEXT[],
    created_utc TIMESTAMP
)"#;

const INSERT_TEA: &str = r#"
INSERT INTO tea (postid, title, url, permalink, selftext, comments, created_utc)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (postid) DO NOTHING"#;

const SELECT_TEA: &str = r#"
SELECT postid, title, url, permalink, selftext, comments, created_utc
FROM tea WHERE postid = $1"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same postid already existed; nothing was written.
    Duplicate,
}

/// Where fetched submissions end up.
#[allow(async_fn_in_trait)]
pub trait TeaStore {
    async fn insert(&mut self, row: &TeaRow) -> Result<InsertOutcome, StoreError>;
}

type TeaTuple = (String, String, String, String, Option<String>, Vec<String>, Option<PrimitiveDateTime>);

pub struct PgTeaStore {
    conn: PgConnection,
}

impl PgTeaStore {
    pub fn connect_options(pg: &PgSettings) -> Result<PgConnectOptions, StoreError> {
        let password = pg.password.as_ref().ok_or(StoreError::MissingPassword)?;
        Ok(PgConnectOptions::new()
            .host(&pg.host)
            .port(pg.port)
            .database(&pg.database)
            .username(&pg.user)
            .password(password.expose())
            .application_name("tea-scraper"))
    }

    pub async fn connect(pg: &PgSettings) -> Result<Self, StoreError> {
        let opts = Self::connect_options(pg)?;
        let conn = PgConnection::connect_with(&opts).await.map_err(StoreError::Connect)?;
        let mut store = Self { conn };
        if pg.bootstrap_schema {
            store.ensure_table().await?;
        }
        tracing::info!(host = %pg.host, database = %pg.database, "Database connected successfully");
        Ok(store)
    }

    /// Connect with a `postgres://` URL.
    pub async fn connect_url(url: &str) -> Result<Self, StoreError> {
        let conn = PgConnection::connect(url).await.map_err(StoreError::Connect)?;
        Ok(Self { conn })
    }

    pub async fn ensure_table(&mut self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TEA_TABLE).execute(&mut self.conn).await?;
        Ok(())
    }

    pub async fn fetch_row(&mut self, postid: &str) -> Result<Option<TeaRow>, StoreError> {
        let found: Option<TeaTuple> = sqlx::query_as(SELECT_TEA)
            .bind(postid)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(found.map(|(postid, title, url, permalink, selftext, comments, created_utc)| TeaRow {
            postid,
            title,
            url,
            permalink,
            selftext,
            comments,
            created_utc,
        }))
    }

    pub async fn close(self) -> Result<(), StoreError> {
        self.conn.close().await?;
        Ok(())
    }
}

impl TeaStore for PgTeaStore {
    async fn insert(&mut self, row: &TeaRow) -> Result<InsertOutcome, StoreError> {
        let done = sqlx::query(INSERT_TEA)
            .bind(&row.postid)
            .bind(&row.title)
            .bind(&row.url)
            .bind(&row.permalink)
            .bind(&row.selftext)
            .bind(&row.comments)
            .bind(row.created_utc)
            .execute(&mut self.conn)
            .await?;
        Ok(if done.rows_affected() == 0 { InsertOutcome::Duplicate } else { InsertOutcome::Inserted })
    }
}
