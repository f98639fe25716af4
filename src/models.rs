use crate::error::RegistryError;
use crate::geo::Coordinate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::warn;

/// A branch office customers can visit or be directed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub contact: Contact,
}

/// Contact details shown alongside a branch. Never used for lookups.
/// Every field may be left out, as in the CSV loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
    pub email: String,
    pub hours: String,
}

// Unmarshal branch rows from a CSV export into Facilities.
// Column names are matched case-insensitively, and only id, name and the
// two coordinate columns are required.
pub fn load_facilities_csv<R: Read>(reader: R) -> Result<Vec<Facility>, RegistryError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();

    // Helper to find the first matching column, ignoring a leading BOM
    let find_col = |names: &[&str]| {
        headers.iter().position(|h| {
            let clean_h = h.trim_start_matches('\u{feff}').trim();
            names.iter().any(|n| clean_h.eq_ignore_ascii_case(n))
        })
    };

    let idx_id = find_col(&["id"]).ok_or(RegistryError::MissingColumn("id"))?;
    let idx_name = find_col(&["name"]).ok_or(RegistryError::MissingColumn("name"))?;
    let idx_lat =
        find_col(&["latitude", "lat"]).ok_or(RegistryError::MissingColumn("latitude"))?;
    let idx_lng = find_col(&["longitude", "lng", "lon"])
        .ok_or(RegistryError::MissingColumn("longitude"))?;
    let idx_phone = find_col(&["phone"]);
    let idx_phone2 = find_col(&["secondary_phone", "phone2"]);
    let idx_email = find_col(&["email"]);
    let idx_hours = find_col(&["hours"]);

    let mut facilities = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let get_val = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(|s| s.trim_matches('"').trim())
                .filter(|s| !s.is_empty())
        };
        let parse_deg = |idx: usize, column: &'static str| {
            let raw = get_val(Some(idx)).unwrap_or("");
            raw.parse::<f64>().map_err(|_| RegistryError::InvalidValue {
                column,
                value: raw.to_string(),
                line,
            })
        };

        let Some(id) = get_val(Some(idx_id)) else {
            warn!("Skipping branch row without id on line {}", line);
            continue;
        };

        facilities.push(Facility {
            id: id.to_string(),
            name: get_val(Some(idx_name)).unwrap_or(id).to_string(),
            coordinate: Coordinate::new(
                parse_deg(idx_lat, "latitude")?,
                parse_deg(idx_lng, "longitude")?,
            ),
            contact: Contact {
                phone: get_val(idx_phone).unwrap_or("").to_string(),
                secondary_phone: get_val(idx_phone2).map(str::to_string),
                email: get_val(idx_email).unwrap_or("").to_string(),
                hours: get_val(idx_hours).unwrap_or("").to_string(),
            },
        });
    }
    Ok(facilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_with_optional_columns() {
        let data = "\u{feff}ID,Name,Lat,Lng,Phone,Email\n\
                    george,George,-33.9715,22.4617,044 555 0100,george@example.com\n\
                    cpt, Cape Town ,-33.9249,18.4241,,\n";
        let facilities = load_facilities_csv(data.as_bytes()).unwrap();

        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].id, "george");
        assert_eq!(facilities[0].coordinate, Coordinate::new(-33.9715, 22.4617));
        assert_eq!(facilities[0].contact.phone, "044 555 0100");
        assert_eq!(facilities[0].contact.secondary_phone, None);
        assert_eq!(facilities[1].name, "Cape Town");
        assert_eq!(facilities[1].contact.email, "");
    }

    #[test]
    fn missing_coordinate_column_is_reported() {
        let data = "id,name,latitude\ngeorge,George,-33.9\n";
        let err = load_facilities_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, RegistryError::MissingColumn("longitude")));
    }

    #[test]
    fn unparseable_degrees_are_reported_with_line() {
        let data = "id,name,latitude,longitude\ngeorge,George,south,22.4\n";
        match load_facilities_csv(data.as_bytes()).unwrap_err() {
            RegistryError::InvalidValue { column, value, line } => {
                assert_eq!(column, "latitude");
                assert_eq!(value, "south");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
