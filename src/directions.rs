use crate::models::Facility;

pub const DEFAULT_MAPS_BASE_URL: &str = "https://www.google.com/maps";

/// Deep link that opens turn-by-turn directions to `facility`.
pub fn directions_url(base_url: &str, facility: &Facility) -> String {
    format!(
        "{}/dir/?api=1&destination={},{}",
        base_url.trim_end_matches('/'),
        facility.coordinate.latitude,
        facility.coordinate.longitude
    )
}
