//! The fixed list of branches known to the process.
//!
//! A [`FacilityRegistry`] is built once at startup and then only read. It
//! is cheap to clone: every clone shares the same backing slice, so the
//! resolver, the fallback logic and the CLI all see one list.

use crate::error::RegistryError;
use crate::geo::Coordinate;
use crate::models::{load_facilities_csv, Contact, Facility};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FacilityRegistry {
    facilities: Arc<[Facility]>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    facilities: Vec<Facility>,
}

impl FacilityRegistry {
    /// Validates and freezes `facilities`, keeping their order.
    ///
    /// Ids must be unique and every coordinate must be in range. An empty
    /// list is allowed; resolving against it fails instead.
    pub fn new(facilities: Vec<Facility>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for facility in &facilities {
            if !seen.insert(facility.id.as_str()) {
                return Err(RegistryError::DuplicateId(facility.id.clone()));
            }
            let Coordinate {
                latitude,
                longitude,
            } = facility.coordinate;
            Coordinate::try_new(latitude, longitude).map_err(|source| {
                RegistryError::InvalidCoordinate {
                    id: facility.id.clone(),
                    source,
                }
            })?;
        }
        Ok(Self {
            facilities: facilities.into(),
        })
    }

    /// The branches shipped with the application. George is the head office
    /// and therefore listed first.
    pub fn builtin() -> Self {
        let branch = |id: &str, name: &str, lat: f64, lng: f64, phone: &str, alt: Option<&str>| {
            Facility {
                id: id.to_string(),
                name: name.to_string(),
                coordinate: Coordinate::new(lat, lng),
                contact: Contact {
                    phone: phone.to_string(),
                    secondary_phone: alt.map(str::to_string),
                    email: format!("{id}@containers.example"),
                    hours: "Mon-Fri 08:00-17:00, Sat 08:00-12:00".to_string(),
                },
            }
        };

        Self {
            facilities: Arc::from(vec![
                branch(
                    "george",
                    "George (Head Office)",
                    -33.9715,
                    22.4617,
                    "+27 44 555 0100",
                    Some("+27 82 555 0101"),
                ),
                branch("cape-town", "Cape Town", -33.9249, 18.4241, "+27 21 555 0102", None),
                branch("gqeberha", "Gqeberha", -33.9608, 25.6022, "+27 41 555 0103", None),
            ]),
        }
    }

    /// Loads branches from a `.csv` or `.toml` file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let facilities = match ext.as_str() {
            "csv" => load_facilities_csv(File::open(path)?)?,
            "toml" => toml::from_str::<RegistryFile>(&fs::read_to_string(path)?)?.facilities,
            _ => return Err(RegistryError::UnsupportedFormat(path.display().to_string())),
        };

        let registry = Self::new(facilities)?;
        info!("Loaded {} branches from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Facility> {
        self.facilities.iter()
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    /// The main branch, used when nothing better is known.
    pub fn primary(&self) -> Option<&Facility> {
        self.facilities.first()
    }
}

impl<'a> IntoIterator for &'a FacilityRegistry {
    type Item = &'a Facility;
    type IntoIter = std::slice::Iter<'a, Facility>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
