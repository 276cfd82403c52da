//! Conversion between stored rows and [`Convocatoria`] read models.
//!
//! Ids are stored as hyphenated lowercase UUID strings. Document bodies go
//! through the legacy adapter before deserialisation.

use unxchange_core::{
  convocatoria::{Convocatoria, ConvocatoriaId, Document},
  legacy,
};
use uuid::Uuid;

use crate::Result;

pub fn encode_id(id: ConvocatoriaId) -> String { id.to_string() }

pub fn decode_id(s: &str) -> Result<ConvocatoriaId> {
  Ok(Uuid::parse_str(s)?.into())
}

/// Raw row as read from `convocatorias`, with the interested users
/// aggregated into a JSON array.
pub struct RawRecord {
  pub id:         String,
  pub version:    u32,
  pub doc:        String,
  pub interested: String,
}

/// Columns selected for every record read; bind `?1` to filter by id.
pub const SELECT_RECORDS: &str = "
SELECT c.id, c.version, c.doc,
       (SELECT json_group_array(i.user_id)
          FROM (SELECT user_id FROM interests
                 WHERE convocatoria_id = c.id
                 ORDER BY seq) AS i)
  FROM convocatorias c";

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawRecord {
      id:         row.get(0)?,
      version:    row.get(1)?,
      doc:        row.get(2)?,
      interested: row.get(3)?,
    })
  }

  pub fn into_convocatoria(self) -> Result<Convocatoria> {
    let id = decode_id(&self.id)?;
    let value = serde_json::from_str(&self.doc)?;
    let document: Document = serde_json::from_value(legacy::upgrade(self.version, value)?)?;
    let interested: Vec<String> = serde_json::from_str(&self.interested)?;
    Ok(Convocatoria::from_parts(id, document, interested))
  }
}
