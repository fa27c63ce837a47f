//! Value types consumed by filters.

pub mod facet;
pub mod geo;

pub use facet::{FacetValue, decode_facet, encode_facet};
pub use geo::GeoPoint;
