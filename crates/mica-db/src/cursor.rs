use bson::{Bson, Document};
use mica_query::{Expression, Path, Sort, SortDirection, parse_projection, parse_sort};
use mica_store::Snapshot;

use crate::document::resolve_all;
use crate::error::DbError;
use crate::expression::{matches, sort_order};
use crate::projection::ProjectionPlan;

type DocIter<'a> = Box<dyn Iterator<Item = &'a Document> + 'a>;

/// A prepared query over a collection snapshot.
///
/// The snapshot is taken when the cursor is created, so documents inserted
/// afterwards are never seen. Builder methods shape the result; nothing is
/// evaluated until [`.iter()`](Cursor::iter), and a cursor can be iterated
/// any number of times with the same result.
#[derive(Debug, Clone)]
pub struct Cursor {
    snapshot: Snapshot,
    filter: Expression,
    projection: Option<ProjectionPlan>,
    sort: Vec<(Path, SortDirection)>,
    skip: usize,
    limit: Option<usize>,
}

impl Cursor {
    pub(crate) fn new(snapshot: Snapshot, filter: Expression) -> Self {
        Self {
            snapshot,
            filter,
            projection: None,
            sort: Vec::new(),
            skip: 0,
            limit: None,
        }
    }

    /// Reshape every yielded document. Replaces any earlier projection.
    pub fn project(mut self, spec: Document) -> Result<Self, DbError> {
        let projection = parse_projection(&spec)?;
        self.projection = Some(ProjectionPlan::new(&projection));
        Ok(self)
    }

    /// Order results by one or more paths, e.g. `{ "age": -1, "name": 1 }`.
    pub fn sort(self, spec: Document) -> Result<Self, DbError> {
        let sorts = parse_sort(&spec)?;
        self.with_sort(sorts)
    }

    pub(crate) fn with_sort(mut self, sorts: Vec<Sort>) -> Result<Self, DbError> {
        self.sort = sorts
            .into_iter()
            .map(|s| {
                Path::parse(&s.field)
                    .map(|path| (path, s.direction))
                    .map_err(|e| DbError::InvalidQuerySpec(e.to_string()))
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Stream the results.
    pub fn iter(&self) -> CursorIter<'_> {
        let matched = self
            .snapshot
            .iter()
            .filter(move |doc| matches(doc, &self.filter));

        let ordered: DocIter<'_> = if self.sort.is_empty() {
            Box::new(matched)
        } else {
            let mut keyed: Vec<(Vec<Option<&Bson>>, &Document)> =
                matched.map(|doc| (self.sort_keys(doc), doc)).collect();
            keyed.sort_by(|(a, _), (b, _)| self.compare(a, b));
            Box::new(keyed.into_iter().map(|(_, doc)| doc))
        };

        let windowed = ordered.skip(self.skip);
        let inner: DocIter<'_> = match self.limit {
            Some(n) => Box::new(windowed.take(n)),
            None => Box::new(windowed),
        };

        CursorIter {
            inner,
            projection: self.projection.as_ref(),
        }
    }

    /// Collect every result.
    pub fn to_array(&self) -> Vec<Document> {
        self.iter().collect()
    }

    /// One key per sort path. A path that reaches an array (directly or by
    /// fanning out over array elements) sorts by its smallest element when
    /// ascending and its largest when descending; missing sorts as null.
    fn sort_keys<'a>(&self, doc: &'a Document) -> Vec<Option<&'a Bson>> {
        self.sort
            .iter()
            .map(|(path, direction)| {
                let mut values: Vec<Option<&'a Bson>> = Vec::new();
                for candidate in resolve_all(doc, path) {
                    match candidate.value() {
                        Some(Bson::Array(items)) => values.extend(items.iter().map(Some)),
                        other => values.push(other),
                    }
                }
                let pick = match direction {
                    SortDirection::Asc => values.into_iter().min_by(|a, b| sort_order(*a, *b)),
                    SortDirection::Desc => values.into_iter().max_by(|a, b| sort_order(*a, *b)),
                };
                pick.flatten()
            })
            .collect()
    }

    fn compare(&self, a: &[Option<&Bson>], b: &[Option<&Bson>]) -> std::cmp::Ordering {
        for ((x, y), (_, direction)) in a.iter().zip(b).zip(&self.sort) {
            let ord = sort_order(*x, *y);
            let ord = match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord.is_ne() {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    }
}

/// A streaming iterator over query results.
///
/// Yields one owned [`Document`] at a time, projected if the cursor has a
/// projection.
pub struct CursorIter<'a> {
    inner: DocIter<'a>,
    projection: Option<&'a ProjectionPlan>,
}

impl Iterator for CursorIter<'_> {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.inner.next()?;
        Some(match self.projection {
            Some(plan) => plan.apply(doc),
            None => doc.clone(),
        })
    }
}
