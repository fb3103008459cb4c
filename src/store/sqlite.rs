use std::path::Path;

use anyhow::anyhow;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use url::Url;

use crate::domain::{CachedFeed, FeedImage};
use crate::store::{FeedStore, ImageDataStore, StoreError, StoreResult};

/// Requests handled by the store worker.
enum Command {
    DeleteCachedFeed {
        reply: oneshot::Sender<StoreResult<()>>,
    },
    InsertFeed {
        feed: Vec<FeedImage>,
        timestamp: DateTime<Utc>,
        reply: oneshot::Sender<StoreResult<()>>,
    },
    RetrieveFeed {
        reply: oneshot::Sender<StoreResult<Option<CachedFeed>>>,
    },
    InsertData {
        url: Url,
        data: Bytes,
        reply: oneshot::Sender<StoreResult<()>>,
    },
    RetrieveData {
        url: Url,
        reply: oneshot::Sender<StoreResult<Option<Bytes>>>,
    },
}

/// SQLite-backed store for the feed snapshot and the image cache.
///
/// All operations are funneled through one worker thread that owns the
/// connection and drains a queue in submission order, so a composite save
/// (delete then insert) can never interleave with a concurrent retrieve.
/// Cloning the handle shares the same worker and queue.
#[derive(Clone)]
pub struct SqliteStore {
    tx: mpsc::UnboundedSender<Command>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(&path).map_err(StoreError::new)?;
        debug!(path = %path.as_ref().display(), "opened sqlite store");
        Self::from_connection(conn)
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::new)?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);
        migrations.to_latest(&mut conn).map_err(StoreError::new)?;

        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("freshet-store".into())
            .spawn(move || run_worker(conn, rx))
            .map_err(StoreError::new)?;

        Ok(Self { tx })
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<StoreResult<T>>) -> Command,
    ) -> StoreResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| worker_gone())?;
        response.await.map_err(|_| worker_gone())?
    }
}

fn worker_gone() -> StoreError {
    StoreError::new(anyhow!("store worker has shut down"))
}

#[async_trait::async_trait]
impl FeedStore for SqliteStore {
    async fn delete_cached_feed(&self) -> StoreResult<()> {
        self.call(|reply| Command::DeleteCachedFeed { reply }).await
    }

    async fn insert(&self, feed: Vec<FeedImage>, timestamp: DateTime<Utc>) -> StoreResult<()> {
        self.call(|reply| Command::InsertFeed {
            feed,
            timestamp,
            reply,
        })
        .await
    }

    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        self.call(|reply| Command::RetrieveFeed { reply }).await
    }
}

#[async_trait::async_trait]
impl ImageDataStore for SqliteStore {
    async fn insert_data(&self, url: &Url, data: Bytes) -> StoreResult<()> {
        let url = url.clone();
        self.call(|reply| Command::InsertData { url, data, reply })
            .await
    }

    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        let url = url.clone();
        self.call(|reply| Command::RetrieveData { url, reply })
            .await
    }
}

fn run_worker(mut conn: Connection, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::DeleteCachedFeed { reply } => {
                let _ = reply.send(delete_cached_feed(&mut conn).map_err(StoreError::new));
            }
            Command::InsertFeed {
                feed,
                timestamp,
                reply,
            } => {
                let _ = reply.send(insert_feed(&mut conn, &feed, timestamp).map_err(StoreError::new));
            }
            Command::RetrieveFeed { reply } => {
                let _ = reply.send(retrieve_feed(&conn).map_err(StoreError::new));
            }
            Command::InsertData { url, data, reply } => {
                let _ = reply.send(insert_data(&conn, &url, &data).map_err(StoreError::new));
            }
            Command::RetrieveData { url, reply } => {
                let _ = reply.send(retrieve_data(&conn, &url).map_err(StoreError::new));
            }
        }
    }
    debug!("store worker finished");
}

fn delete_cached_feed(conn: &mut Connection) -> anyhow::Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM cached_feed_image", [])?;
    tx.execute("DELETE FROM cached_feed", [])?;
    tx.commit()?;
    Ok(())
}

fn insert_feed(
    conn: &mut Connection,
    feed: &[FeedImage],
    timestamp: DateTime<Utc>,
) -> anyhow::Result<()> {
    // The delete commits on its own: a failure in the write below leaves the
    // store empty rather than holding the previous snapshot.
    delete_cached_feed(conn)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO cached_feed (id, timestamp) VALUES (0, ?1)",
        params![timestamp.to_rfc3339()],
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO cached_feed_image (position, id, url, description, location)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (position, image) in feed.iter().enumerate() {
            stmt.execute(params![
                position as i64,
                image.id.to_string(),
                image.url.as_str(),
                image.description,
                image.location
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn retrieve_feed(conn: &Connection) -> anyhow::Result<Option<CachedFeed>> {
    let raw_timestamp: Option<String> = conn
        .query_row("SELECT timestamp FROM cached_feed WHERE id = 0", [], |row| {
            row.get(0)
        })
        .optional()?;

    let Some(raw_timestamp) = raw_timestamp else {
        return Ok(None);
    };
    let timestamp = parse_datetime(&raw_timestamp)
        .ok_or_else(|| anyhow!("unparseable snapshot timestamp: {raw_timestamp}"))?;

    let mut stmt = conn.prepare(
        "SELECT id, url, description, location FROM cached_feed_image ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut feed = Vec::new();
    for row in rows {
        let (id, url, description, location) = row?;
        feed.push(FeedImage {
            id: id.parse()?,
            url: Url::parse(&url)?,
            description,
            location,
        });
    }

    Ok(Some(CachedFeed { feed, timestamp }))
}

fn insert_data(conn: &Connection, url: &Url, data: &[u8]) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO image_cache (url, data) VALUES (?1, ?2)
         ON CONFLICT(url) DO UPDATE SET data = ?2",
        params![url.as_str(), data],
    )?;
    Ok(())
}

fn retrieve_data(conn: &Connection, url: &Url) -> anyhow::Result<Option<Bytes>> {
    let data: Option<Vec<u8>> = conn
        .query_row(
            "SELECT data FROM image_cache WHERE url = ?1",
            params![url.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(data.map(Bytes::from))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
