//! [`SqliteStore`], the SQLite implementation of [`ConvocatoriaStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use serde_json::Value;

use unxchange_core::{
  convocatoria::{Convocatoria, ConvocatoriaId, ConvocatoriaPatch, Document},
  interest::InterestOutcome,
  legacy::CURRENT_VERSION,
  query::{Filter, Window},
  stats::Stats,
  store::ConvocatoriaStore,
};

use crate::{
  Result,
  encode::{RawRecord, SELECT_RECORDS, encode_id},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A convocatorias collection backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Store `doc` verbatim, tagged with the schema `version` it was written
  /// with. It is upgraded on read like any other document.
  pub async fn insert_raw(&self, version: u32, doc: Value) -> Result<ConvocatoriaId> {
    let id = ConvocatoriaId::generate();
    self.insert_row(id, version, serde_json::to_string(&doc)?).await?;
    Ok(id)
  }

  async fn insert_row(&self, id: ConvocatoriaId, version: u32, doc: String) -> Result<()> {
    let id_str = encode_id(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO convocatorias (id, version, doc) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, version, doc],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load every record, or only the one with `id`, in insertion order.
  async fn load(&self, id: Option<ConvocatoriaId>) -> Result<Vec<Convocatoria>> {
    let id_str = id.map(encode_id);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(id) = id_str {
          let mut stmt =
            conn.prepare(&format!("{SELECT_RECORDS} WHERE c.id = ?1 ORDER BY c.seq"))?;
          stmt
            .query_map(rusqlite::params![id], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!("{SELECT_RECORDS} ORDER BY c.seq"))?;
          stmt
            .query_map([], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_convocatoria).collect()
  }

  /// Run a membership change and classify it by the number of rows touched.
  async fn toggle_interest(
    &self,
    id: ConvocatoriaId,
    user: String,
    sql: &'static str,
    changed: InterestOutcome,
    unchanged: InterestOutcome,
  ) -> Result<Option<InterestOutcome>> {
    let id_str = encode_id(id);

    let touched: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM convocatorias WHERE id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }
        let n = tx.execute(sql, rusqlite::params![id_str, user])?;
        tx.commit()?;
        Ok(Some(n))
      })
      .await?;

    Ok(touched.map(|n| if n > 0 { changed } else { unchanged }))
  }
}

// ─── ConvocatoriaStore impl ──────────────────────────────────────────────────

impl ConvocatoriaStore for SqliteStore {
  type Error = crate::Error;

  async fn insert(&self, document: Document) -> Result<Convocatoria> {
    let id = ConvocatoriaId::generate();
    let doc = serde_json::to_string(&document)?;
    self.insert_row(id, CURRENT_VERSION, doc).await?;
    tracing::debug!(%id, "inserted convocatoria");
    Ok(Convocatoria::from_parts(id, document, Vec::new()))
  }

  async fn find(&self, filter: &Filter, window: Window) -> Result<Vec<Convocatoria>> {
    // Matching runs in Rust so case folding covers non-ASCII text.
    let records = self.load(None).await?;
    Ok(
      records
        .into_iter()
        .filter(|r| filter.matches(r))
        .skip(window.skip as usize)
        .take(window.limit as usize)
        .collect(),
    )
  }

  async fn find_one(&self, id: ConvocatoriaId) -> Result<Option<Convocatoria>> {
    Ok(self.load(Some(id)).await?.into_iter().next())
  }

  async fn update(
    &self,
    id: ConvocatoriaId,
    patch: ConvocatoriaPatch,
  ) -> Result<Option<Convocatoria>> {
    let id_str = encode_id(id);
    let patch_json = serde_json::to_string(&patch)?;

    // `json_patch` applies an RFC 7396 merge patch in a single statement.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE convocatorias SET doc = json_patch(doc, ?2) WHERE id = ?1",
          rusqlite::params![id_str, patch_json],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.find_one(id).await
  }

  async fn delete(&self, id: ConvocatoriaId) -> Result<bool> {
    let id_str = encode_id(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM convocatorias WHERE id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn add_interest(
    &self,
    id: ConvocatoriaId,
    user: String,
  ) -> Result<Option<InterestOutcome>> {
    self
      .toggle_interest(
        id,
        user,
        "INSERT OR IGNORE INTO interests (convocatoria_id, user_id) VALUES (?1, ?2)",
        InterestOutcome::Added,
        InterestOutcome::AlreadyInterested,
      )
      .await
  }

  async fn remove_interest(
    &self,
    id: ConvocatoriaId,
    user: String,
  ) -> Result<Option<InterestOutcome>> {
    self
      .toggle_interest(
        id,
        user,
        "DELETE FROM interests WHERE convocatoria_id = ?1 AND user_id = ?2",
        InterestOutcome::Removed,
        InterestOutcome::NotInterested,
      )
      .await
  }

  async fn stats(&self) -> Result<Stats> {
    let records = self.load(None).await?;
    Ok(Stats::from_records(&records))
  }
}
