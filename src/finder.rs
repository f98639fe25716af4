//! Nearest branch for the current user, with a fallback when the user's
//! position cannot be determined.

use crate::error::{LocationError, RegistryError, ResolveError};
use crate::geo::Coordinate;
use crate::location::LocationSource;
use crate::models::Facility;
use crate::resolver::{Resolution, Resolver};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Upper bound on a single location attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of [`BranchFinder::find`].
#[derive(Debug)]
pub enum Lookup<'r> {
    /// The user was located and matched to the nearest branch.
    Nearest {
        coordinate: Coordinate,
        resolution: Resolution<'r>,
    },
    /// Location failed; `facility` is the designated fallback branch.
    Fallback {
        facility: &'r Facility,
        reason: LocationError,
    },
}

impl<'r> Lookup<'r> {
    pub fn facility(&self) -> &'r Facility {
        match self {
            Lookup::Nearest { resolution, .. } => resolution.facility,
            Lookup::Fallback { facility, .. } => *facility,
        }
    }

    pub fn distance_km(&self) -> Option<f64> {
        match self {
            Lookup::Nearest { resolution, .. } => Some(resolution.distance_km),
            Lookup::Fallback { .. } => None,
        }
    }

    /// Message for the user when the fallback branch is shown.
    pub fn notice(&self) -> Option<String> {
        match self {
            Lookup::Nearest { .. } => None,
            Lookup::Fallback { facility, reason } => Some(format!(
                "Could not determine your location ({reason}). Showing our {} branch instead.",
                facility.name
            )),
        }
    }
}

pub struct BranchFinder<S> {
    source: S,
    resolver: Resolver,
    fallback_id: Option<String>,
    timeout: Duration,
}

impl<S: LocationSource> BranchFinder<S> {
    pub fn new(source: S, resolver: Resolver) -> Self {
        Self {
            source,
            resolver,
            fallback_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses branch `id` instead of the first registered branch as fallback.
    pub fn with_fallback(mut self, id: impl Into<String>) -> Result<Self, RegistryError> {
        let id = id.into();
        if self.resolver.registry().get(&id).is_none() {
            return Err(RegistryError::UnknownFacility(id));
        }
        self.fallback_id = Some(id);
        Ok(self)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The branch shown when the user cannot be located.
    pub fn fallback(&self) -> Option<&Facility> {
        let registry = self.resolver.registry();
        match &self.fallback_id {
            Some(id) => registry.get(id),
            None => registry.primary(),
        }
    }

    /// Makes one location attempt, bounded by the timeout, and picks a branch.
    ///
    /// Only an empty registry is an error; a failed location attempt yields
    /// [`Lookup::Fallback`].
    pub async fn find(&self) -> Result<Lookup<'_>, ResolveError> {
        let attempt = tokio::time::timeout(self.timeout, self.source.locate())
            .await
            .unwrap_or(Err(LocationError::Timeout(self.timeout)));

        match attempt {
            Ok(coordinate) => {
                let resolution = self.resolver.resolve(coordinate)?;
                info!(
                    "Nearest branch to ({}) is {} at {:.1} km",
                    coordinate, resolution.facility.id, resolution.distance_km
                );
                Ok(Lookup::Nearest {
                    coordinate,
                    resolution,
                })
            }
            Err(reason) => {
                let facility = self.fallback().ok_or(ResolveError::EmptyRegistry)?;
                warn!(
                    "Location unavailable: {}. Falling back to {}.",
                    reason, facility.id
                );
                Ok(Lookup::Fallback { facility, reason })
            }
        }
    }

    /// Runs [`BranchFinder::find`] every `every` until `shutdown` completes,
    /// handing each lookup to `on_lookup`.
    ///
    /// A lookup that overruns the period delays the next one instead of
    /// triggering a burst of catch-up lookups. `shutdown` also cancels a
    /// lookup that is still in flight.
    pub async fn watch<F, E>(
        &self,
        every: Duration,
        shutdown: impl Future<Output = ()>,
        mut on_lookup: F,
    ) -> Result<(), E>
    where
        F: FnMut(&Lookup<'_>) -> Result<(), E>,
        E: From<ResolveError>,
    {
        let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }
            let lookup = tokio::select! {
                lookup = self.find() => lookup?,
                _ = &mut shutdown => break,
            };
            on_lookup(&lookup)?;
        }
        info!("Stopped watching for the nearest branch.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FixedLocation, NoLocation};
    use crate::registry::FacilityRegistry;

    #[tokio::test]
    async fn located_user_gets_nearest_branch() {
        let finder = BranchFinder::new(
            FixedLocation(Coordinate::new(-33.95, 25.5)),
            Resolver::new(FacilityRegistry::builtin()),
        );
        let lookup = finder.find().await.unwrap();
        assert_eq!(lookup.facility().id, "gqeberha");
        assert!(lookup.distance_km().unwrap() < 15.0);
        assert!(lookup.notice().is_none());
    }

    #[tokio::test]
    async fn failure_falls_back_to_primary() {
        let finder = BranchFinder::new(NoLocation, Resolver::new(FacilityRegistry::builtin()));
        let lookup = finder.find().await.unwrap();
        assert_eq!(lookup.facility().id, "george");
        assert_eq!(lookup.distance_km(), None);
        let notice = lookup.notice().unwrap();
        assert!(notice.contains("George (Head Office)"), "{notice}");
    }

    #[tokio::test]
    async fn configured_fallback_is_used() {
        let finder = BranchFinder::new(NoLocation, Resolver::new(FacilityRegistry::builtin()))
            .with_fallback("cape-town")
            .unwrap();
        assert_eq!(finder.find().await.unwrap().facility().id, "cape-town");
    }

    #[test]
    fn unknown_fallback_is_rejected() {
        let err = BranchFinder::new(NoLocation, Resolver::new(FacilityRegistry::builtin()))
            .with_fallback("durban")
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::UnknownFacility(id) if id == "durban"));
    }

    #[tokio::test]
    async fn empty_registry_is_an_error_either_way() {
        let empty = || Resolver::new(FacilityRegistry::new(Vec::new()).unwrap());

        let located = BranchFinder::new(FixedLocation(Coordinate::new(0.0, 0.0)), empty());
        assert_eq!(located.find().await.unwrap_err(), ResolveError::EmptyRegistry);

        let unlocated = BranchFinder::new(NoLocation, empty());
        assert_eq!(unlocated.find().await.unwrap_err(), ResolveError::EmptyRegistry);
    }
}
