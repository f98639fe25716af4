use crate::error::ResolveError;
use crate::geo::{haversine_km, Coordinate};
use crate::models::Facility;
use crate::registry::FacilityRegistry;
use serde::Serialize;

/// A branch paired with its distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution<'r> {
    pub facility: &'r Facility,
    pub distance_km: f64,
}

/// Finds the branch closest to a coordinate.
///
/// Holds a shared handle on the registry and nothing else, so it can be
/// cloned into tasks and called concurrently.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: FacilityRegistry,
}

impl Resolver {
    pub fn new(registry: FacilityRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FacilityRegistry {
        &self.registry
    }

    /// Returns the nearest branch to `user`.
    ///
    /// Branches at equal distance resolve to the one listed first: the scan
    /// only replaces its current best on a strictly smaller distance.
    pub fn resolve(&self, user: Coordinate) -> Result<Resolution<'_>, ResolveError> {
        let mut best: Option<Resolution<'_>> = None;
        for facility in &self.registry {
            let distance_km = haversine_km(user, facility.coordinate);
            let closer = match &best {
                Some(current) => distance_km < current.distance_km,
                None => true,
            };
            if closer {
                best = Some(Resolution {
                    facility,
                    distance_km,
                });
            }
        }
        best.ok_or(ResolveError::EmptyRegistry)
    }

    /// Every branch with its distance from `user`, nearest first.
    ///
    /// The sort is stable, so ties keep registry order and the first entry
    /// always matches [`Resolver::resolve`].
    pub fn rank(&self, user: Coordinate) -> Vec<Resolution<'_>> {
        let mut ranked: Vec<_> = self
            .registry
            .iter()
            .map(|facility| Resolution {
                facility,
                distance_km: haversine_km(user, facility.coordinate),
            })
            .collect();
        ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        ranked
    }
}
