//! Text and JSON rendering of lookup results for the command line.

use crate::directions::directions_url;
use crate::finder::Lookup;
use crate::geo::Coordinate;
use crate::models::Facility;
use crate::resolver::Resolution;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct BranchReport<'a> {
    pub branch: &'a Facility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinate>,
    pub directions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub generated_at: String,
}

impl<'a> BranchReport<'a> {
    pub fn new(branch: &'a Facility, maps_base_url: &str) -> Self {
        Self {
            branch,
            distance_km: None,
            position: None,
            directions: directions_url(maps_base_url, branch),
            notice: None,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn from_resolution(
        resolution: &Resolution<'a>,
        position: Coordinate,
        maps_base_url: &str,
    ) -> Self {
        Self {
            distance_km: Some(resolution.distance_km),
            position: Some(position),
            ..Self::new(resolution.facility, maps_base_url)
        }
    }

    pub fn from_lookup(lookup: &Lookup<'a>, maps_base_url: &str) -> Self {
        match lookup {
            Lookup::Nearest {
                coordinate,
                resolution,
            } => Self::from_resolution(resolution, *coordinate, maps_base_url),
            Lookup::Fallback { facility, .. } => Self {
                notice: lookup.notice(),
                ..Self::new(*facility, maps_base_url)
            },
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "{notice}");
        }
        let _ = writeln!(out, "Branch:     {} ({})", self.branch.name, self.branch.id);
        if let Some(d) = self.distance_km {
            let _ = writeln!(out, "Distance:   {d:.1} km");
        }
        let contact = &self.branch.contact;
        let _ = writeln!(out, "Phone:      {}", contact.phone);
        if let Some(alt) = &contact.secondary_phone {
            let _ = writeln!(out, "Alt phone:  {alt}");
        }
        let _ = writeln!(out, "Email:      {}", contact.email);
        let _ = writeln!(out, "Hours:      {}", contact.hours);
        let _ = writeln!(out, "Directions: {}", self.directions);
        out
    }
}

/// One line per branch: `id  name  [distance]`.
pub fn branch_table<'a>(rows: impl IntoIterator<Item = (&'a Facility, Option<f64>)>) -> String {
    let mut out = String::new();
    for (facility, distance_km) in rows {
        let _ = match distance_km {
            Some(d) => writeln!(out, "{:<12} {:<24} {:>8.1} km", facility.id, facility.name, d),
            None => writeln!(out, "{:<12} {}", facility.id, facility.name),
        };
    }
    out
}
