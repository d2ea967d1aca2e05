//! Geodetic CRS metadata and coordinate-operation derivation.
//!
//! `georef` models the ISO 19111:2018 object graph (units, datums,
//! coordinate systems, reference systems, operations), parses and
//! formats WKT1/WKT2 and `+proj=` strings, resolves authority codes
//! against a built-in read-only catalog, and derives ranked executable
//! pipelines between any two CRSs. The numeric runtime that consumes
//! the emitted pipelines is an external collaborator.

pub mod catalog;
pub mod crs;
pub mod cs;
pub mod datum;
pub mod error;
pub mod factory;
pub mod ident;
pub mod measure;
pub mod operation;
pub mod projstring;
pub mod wkt;

pub use catalog::{Catalog, ObjectType};
pub use crs::Crs;
pub use error::{GeorefError, Result};
pub use factory::{
    create_operation, create_operations, GridAvailabilityUse, IntermediateCrsUse,
    OperationContext, SpatialCriterion,
};
pub use ident::Criterion;
pub use operation::CoordinateOperation;
pub use projstring::{parse_proj_string, ProjObject, ProjStringConvention};
pub use wkt::{parse_crs, WktConvention};
