//! Projection mapper
//!
//! Resolves nested views with one batched `get_many` per nested shape, so a
//! page of N records costs 1 + (number of nested shapes) backend calls.

use std::collections::HashMap;

use crate::backend::{BackendResult, DataSource};
use crate::record::{Record, RecordId};

use super::shape::{BoundNested, BoundProjection};
use super::view::ProjectionView;

/// Maps records to projection views
pub struct ProjectionMapper<'a, B: DataSource + ?Sized> {
    backend: &'a B,
}

impl<'a, B: DataSource + ?Sized> ProjectionMapper<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Maps `records` in order
    pub fn map(
        &self,
        records: &[Record],
        projection: &BoundProjection,
    ) -> BackendResult<Vec<ProjectionView>> {
        let mut related = Vec::with_capacity(projection.nested.len());
        for nested in &projection.nested {
            related.push(self.fetch_related(records, nested)?);
        }

        Ok(records
            .iter()
            .map(|record| {
                let mut view = ProjectionView::from_record(record, &projection.fields);
                for (nested, targets) in projection.nested.iter().zip(&related) {
                    let target = record
                        .get(&nested.via)
                        .and_then(RecordId::from_value)
                        .and_then(|id| targets.get(&id))
                        .map(|target| ProjectionView::from_record(target, &nested.fields));
                    view.attach(&nested.name, target);
                }
                view
            })
            .collect())
    }

    /// Batch-fetches every record referenced through `nested.via`
    fn fetch_related(
        &self,
        records: &[Record],
        nested: &BoundNested,
    ) -> BackendResult<HashMap<RecordId, Record>> {
        let mut ids: Vec<RecordId> = records
            .iter()
            .filter_map(|r| r.get(&nested.via).and_then(RecordId::from_value))
            .collect();
        ids.sort();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let fetched = self
            .backend
            .get_many(&nested.collection, &ids, &nested.selection())?;
        Ok(fetched.into_iter().map(|r| (r.id(), r)).collect())
    }
}
