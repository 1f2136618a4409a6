//! Lazy pull-based cursors over store results
//!
//! Store scans and set queries hand back a [`RowCursor`]: a single-pass,
//! fallible, consumer-driven sequence. The consumer may stop pulling at any
//! point (e.g. to abort on error); any underlying resource is released when
//! the cursor is dropped, so every exit path closes it.
//!
//! Adapters:
//! - [`VecCursor`]: cursor over owned rows (used by in-memory backends)
//! - [`FilterCursor`]: id-set membership filter over another cursor; never
//!   mutates its source
//! - [`ChainCursor`]: lazily issues one backend call per id, advancing only
//!   when the consumer pulls

use crate::error::ListResult;
use crate::types::{IdSet, SampleId};
use std::collections::VecDeque;

/// A pull-based, single-pass, fallible sequence of rows.
///
/// Cursors are not `Iterator`s because each pull can fail with a backend
/// error; `next_row` returns `Ok(None)` on exhaustion.
pub trait RowCursor<T>: Send {
    /// Pull the next row.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store call fails. After an error
    /// the cursor must not be pulled again.
    fn next_row(&mut self) -> ListResult<Option<T>>;

    /// Drain the cursor into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by the underlying source.
    fn collect_rows(&mut self) -> ListResult<Vec<T>>
    where
        Self: Sized,
    {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Boxed cursor, the form store trait methods hand out.
pub type BoxedCursor<T> = Box<dyn RowCursor<T>>;

impl<T> RowCursor<T> for BoxedCursor<T> {
    fn next_row(&mut self) -> ListResult<Option<T>> {
        (**self).next_row()
    }
}

/// Cursor over an owned vector of rows.
pub struct VecCursor<T> {
    rows: std::vec::IntoIter<T>,
}

impl<T> VecCursor<T> {
    /// Create a cursor over the given rows.
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl<T: Send> RowCursor<T> for VecCursor<T> {
    fn next_row(&mut self) -> ListResult<Option<T>> {
        Ok(self.rows.next())
    }
}

/// Membership filter over another cursor.
///
/// Pulls rows from the source and discards those whose id is not in the
/// requested set. The source is consumed, never mutated or restarted.
pub struct FilterCursor<T> {
    inner: BoxedCursor<T>,
    wanted: IdSet,
    key: fn(&T) -> SampleId,
}

impl<T> FilterCursor<T> {
    /// Filter `inner` down to rows whose key is contained in `wanted`.
    pub fn new(inner: BoxedCursor<T>, wanted: IdSet, key: fn(&T) -> SampleId) -> Self {
        Self { inner, wanted, key }
    }
}

impl<T: Send> RowCursor<T> for FilterCursor<T> {
    fn next_row(&mut self) -> ListResult<Option<T>> {
        while let Some(row) = self.inner.next_row()? {
            if self.wanted.contains(&(self.key)(&row)) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

/// Fetch callback used by [`ChainCursor`]: one backend call per id, each
/// call yielding zero or more rows.
pub type ChainFetch<T> = Box<dyn FnMut(SampleId) -> ListResult<Vec<T>> + Send>;

/// Lazily chained per-id cursor.
///
/// Issues one backend call per requested id, but only when the consumer
/// pulls past the rows of the previous id. Bounded memory, one round trip
/// per id.
pub struct ChainCursor<T> {
    ids: std::collections::btree_set::IntoIter<SampleId>,
    fetch: ChainFetch<T>,
    buffered: VecDeque<T>,
}

impl<T> ChainCursor<T> {
    /// Create a cursor that calls `fetch` once per id in `ids`.
    pub fn new(ids: IdSet, fetch: ChainFetch<T>) -> Self {
        Self {
            ids: ids.into_iter(),
            fetch,
            buffered: VecDeque::new(),
        }
    }
}

impl<T: Send> RowCursor<T> for ChainCursor<T> {
    fn next_row(&mut self) -> ListResult<Option<T>> {
        loop {
            if let Some(row) = self.buffered.pop_front() {
                return Ok(Some(row));
            }
            match self.ids.next() {
                Some(id) => self.buffered.extend((self.fetch)(id)?),
                None => return Ok(None),
            }
        }
    }
}
