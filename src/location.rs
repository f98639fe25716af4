//! User location for branch lookups.
//!
//! Every provider implements [`LocationSource`]: one async, fallible
//! request for the user's current position. Choosing a fallback when the
//! request fails is the caller's job (see [`crate::finder`]), not the
//! provider's.
//!
//! Providers:
//! * [`IpGeolocation`] - approximate position from an IP geolocation service.
//! * [`HttpGeolocation`] - any JSON endpoint that reports `lat`/`lon`.
//! * [`FixedLocation`] - a manually configured position.
//! * [`NoLocation`] - always fails, so lookups go straight to the fallback.
//!
//! [`CachedSource`] wraps any of them and reuses a recent fix.

use crate::config::{LocationConfig, Provider};
use crate::error::LocationError;
use crate::geo::Coordinate;
use async_trait::async_trait;
use ipgeolocate::{Locator, Service};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// How long a successful fix stays usable before a fresh lookup is made.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Makes one attempt at finding the user's position.
    async fn locate(&self) -> Result<Coordinate, LocationError>;
}

#[async_trait]
impl<T: LocationSource + ?Sized> LocationSource for Box<T> {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        (**self).locate().await
    }
}

#[async_trait]
impl<T: LocationSource + ?Sized> LocationSource for Arc<T> {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        (**self).locate().await
    }
}

/// IP geolocation backends supported by `ipgeolocate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpService {
    #[default]
    #[serde(rename = "ip-api")]
    IpApi,
    #[serde(rename = "ipwhois")]
    IpWhois,
    #[serde(rename = "freegeoip")]
    FreeGeoIp,
}

impl IpService {
    fn service(self) -> Service {
        match self {
            IpService::IpApi => Service::IpApi,
            IpService::IpWhois => Service::IpWhois,
            IpService::FreeGeoIp => Service::FreeGeoIp,
        }
    }
}

/// Approximate user position derived from an IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    ip: String,
    service: IpService,
}

impl IpGeolocation {
    pub fn new(ip: impl Into<String>, service: IpService) -> Self {
        Self {
            ip: ip.into(),
            service,
        }
    }
}

#[async_trait]
impl LocationSource for IpGeolocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        let loc = Locator::get(&self.ip, self.service.service())
            .await
            .map_err(|e| LocationError::Service(e.to_string()))?;

        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| LocationError::Service(format!("unreadable position '{raw}'")))
        };
        let coord = Coordinate::try_new(parse(&loc.latitude)?, parse(&loc.longitude)?)?;
        info!("Geolocation successful - ({})", coord);
        Ok(coord)
    }
}

/// Position from a JSON endpoint such as `http://ip-api.com/json`.
pub struct HttpGeolocation {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct GeoResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude", alias = "lng")]
    lon: Option<f64>,
}

impl HttpGeolocation {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LocationSource for HttpGeolocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        let res = self.client.get(&self.endpoint).send().await?;
        if matches!(res.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(LocationError::PermissionDenied);
        }
        let body = res.error_for_status()?.json::<GeoResponse>().await?;

        if body.status.as_deref() == Some("fail") {
            return Err(LocationError::Service(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }
        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(LocationError::Service(
                "response carried no position".to_string(),
            ));
        };

        let coord = Coordinate::try_new(lat, lon)?;
        info!("Geolocation successful - ({})", coord);
        Ok(coord)
    }
}

/// A position the user typed in.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported(
            "no location provider configured".to_string(),
        ))
    }
}

/// Reuses the last successful fix for `max_age`.
///
/// Failures are never cached. The lock is held across the inner lookup, so
/// concurrent callers wait for one request instead of issuing their own.
pub struct CachedSource<S> {
    inner: S,
    max_age: Duration,
    last_fix: Mutex<Option<(Coordinate, Instant)>>,
}

impl<S: LocationSource> CachedSource<S> {
    pub fn new(inner: S, max_age: Duration) -> Self {
        Self {
            inner,
            max_age,
            last_fix: Mutex::new(None),
        }
    }

    /// Forgets the cached fix so the next call asks the provider again.
    pub async fn invalidate(&self) {
        *self.last_fix.lock().await = None;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: LocationSource> LocationSource for CachedSource<S> {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        let mut last_fix = self.last_fix.lock().await;
        if let Some((coord, obtained_at)) = *last_fix {
            if obtained_at.elapsed() < self.max_age {
                debug!("Reusing location fix from {:?} ago", obtained_at.elapsed());
                return Ok(coord);
            }
        }
        let coord = self.inner.locate().await?;
        *last_fix = Some((coord, Instant::now()));
        Ok(coord)
    }
}

/// Builds the provider selected in the configuration.
pub fn source_from_config(
    cfg: &LocationConfig,
) -> Result<Box<dyn LocationSource>, LocationError> {
    let source: Box<dyn LocationSource> = match cfg.provider {
        Provider::Ip => Box::new(IpGeolocation::new(cfg.ip.clone(), cfg.service)),
        Provider::Http => Box::new(HttpGeolocation::new(
            cfg.http_endpoint.clone(),
            cfg.timeout(),
        )?),
        Provider::Manual => match (cfg.manual_lat, cfg.manual_lon) {
            (Some(lat), Some(lon)) => Box::new(FixedLocation(Coordinate::try_new(lat, lon)?)),
            _ => {
                return Err(LocationError::Unsupported(
                    "manual provider needs manual_lat and manual_lon".to_string(),
                ))
            }
        },
        Provider::None => Box::new(NoLocation),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and hands out a fixed answer.
    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LocationSource for Counting {
        async fn locate(&self) -> Result<Coordinate, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LocationError::PermissionDenied)
            } else {
                Ok(Coordinate::new(-33.9, 18.4))
            }
        }
    }

    fn counting(fail: bool) -> Counting {
        Counting {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cache_reuses_recent_fix() {
        let cached = CachedSource::new(counting(false), DEFAULT_MAX_AGE);
        cached.locate().await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        cached.locate().await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        cached.locate().await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_does_not_keep_failures() {
        let cached = CachedSource::new(counting(true), DEFAULT_MAX_AGE);
        assert!(cached.locate().await.is_err());
        assert!(cached.locate().await.is_err());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_fresh_lookup() {
        let cached = CachedSource::new(counting(false), DEFAULT_MAX_AGE);
        cached.locate().await.unwrap();
        cached.invalidate().await;
        cached.locate().await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn boxed_sources_delegate() {
        let source: Box<dyn LocationSource> = Box::new(FixedLocation(Coordinate::new(1.0, 2.0)));
        assert_eq!(source.locate().await.unwrap(), Coordinate::new(1.0, 2.0));
        assert!(matches!(
            NoLocation.locate().await,
            Err(LocationError::Unsupported(_))
        ));
    }

    #[test]
    fn manual_provider_needs_coordinates() {
        let cfg = LocationConfig {
            provider: Provider::Manual,
            manual_lat: Some(-33.9),
            manual_lon: None,
            ..LocationConfig::default()
        };
        assert!(source_from_config(&cfg).is_err());

        let cfg = LocationConfig {
            manual_lon: Some(200.0),
            ..cfg
        };
        assert!(matches!(
            source_from_config(&cfg),
            Err(LocationError::InvalidCoordinate(_))
        ));
    }
}
