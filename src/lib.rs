//! Nearest-branch lookup for a container rental and sales business.
//!
//! A fixed [`FacilityRegistry`] is built once and shared. The [`Resolver`]
//! matches a coordinate to the closest branch by great-circle distance, and
//! [`BranchFinder`] puts a [`LocationSource`] in front of it, falling back to
//! the head office when the user cannot be located.

pub mod cli;
pub mod config;
pub mod directions;
pub mod error;
pub mod finder;
pub mod geo;
pub mod location;
pub mod logging;
pub mod models;
pub mod registry;
pub mod report;
pub mod resolver;

pub use error::{CoordinateError, LocationError, RegistryError, ResolveError};
pub use finder::{BranchFinder, Lookup};
pub use geo::{haversine_km, Coordinate, EARTH_RADIUS_KM};
pub use location::{CachedSource, LocationSource};
pub use models::{Contact, Facility};
pub use registry::FacilityRegistry;
pub use resolver::{Resolution, Resolver};
