//! Projections for aerorepo
//!
//! # Design Principles
//!
//! - Declared up front: a shape states the fields it needs before execution
//! - Minimal fetch: only those fields are requested from the backend
//! - No N+1: related records are fetched in one batch per nested shape
//! - Tolerant: a null or dangling reference yields an absent nested view

mod mapper;
mod shape;
mod view;

pub use mapper::ProjectionMapper;
pub use shape::{BoundNested, BoundProjection, NestedShape, ProjectionShape};
pub use view::ProjectionView;
