//! The `ConvocatoriaStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `unxchange-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::{
  convocatoria::{Convocatoria, ConvocatoriaId, ConvocatoriaPatch, Document},
  interest::InterestOutcome,
  query::{Filter, Window},
  stats::Stats,
};

/// Abstraction over the document collection holding convocatorias.
///
/// Every operation touches a single record atomically; there are no
/// multi-record transactions. Methods returning `Option` yield `None` when
/// the record does not exist.
pub trait ConvocatoriaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new record and return it with its store-assigned id.
  fn insert(
    &self,
    document: Document,
  ) -> impl Future<Output = Result<Convocatoria, Self::Error>> + Send + '_;

  /// Records matching `filter`, in insertion order, restricted to `window`.
  fn find<'a>(
    &'a self,
    filter: &'a Filter,
    window: Window,
  ) -> impl Future<Output = Result<Vec<Convocatoria>, Self::Error>> + Send + 'a;

  fn find_one(
    &self,
    id: ConvocatoriaId,
  ) -> impl Future<Output = Result<Option<Convocatoria>, Self::Error>> + Send + '_;

  /// Apply `patch` to the stored document and return the updated record.
  fn update(
    &self,
    id: ConvocatoriaId,
    patch: ConvocatoriaPatch,
  ) -> impl Future<Output = Result<Option<Convocatoria>, Self::Error>> + Send + '_;

  /// Physically delete a record. Returns `false` if it did not exist.
  fn delete(
    &self,
    id: ConvocatoriaId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Add `user` to the record's interested set.
  fn add_interest(
    &self,
    id: ConvocatoriaId,
    user: String,
  ) -> impl Future<Output = Result<Option<InterestOutcome>, Self::Error>> + Send + '_;

  /// Remove `user` from the record's interested set.
  fn remove_interest(
    &self,
    id: ConvocatoriaId,
    user: String,
  ) -> impl Future<Output = Result<Option<InterestOutcome>, Self::Error>> + Send + '_;

  /// Aggregate counts over the whole collection.
  fn stats(&self) -> impl Future<Output = Result<Stats, Self::Error>> + Send + '_;
}
