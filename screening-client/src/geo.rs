//! Great-circle distances for the nearby provider listing.

use shared::models::{Coordinates, Place, ProviderListing};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DISTANCE_UNAVAILABLE: &str = "Distance unavailable";

/// Haversine distance between two points, in kilometres.
#[must_use]
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance formatted for display: one decimal place and a `km` suffix.
#[must_use]
pub fn format_km(km: f64) -> String {
    format!("{km:.1} km")
}

/// `format_km(haversine_km(..))` for raw coordinates.
#[must_use]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> String {
    format_km(haversine_km(
        Coordinates::new(lat1, lon1),
        Coordinates::new(lat2, lon2),
    ))
}

/// Decorate server places with their distance from `origin`.
///
/// Server order is kept; distance is for display only.
#[must_use]
pub fn listings_from_places(origin: Coordinates, places: Vec<Place>) -> Vec<ProviderListing> {
    places
        .into_iter()
        .map(|place| {
            let distance = place.geometry.as_ref().map_or_else(
                || DISTANCE_UNAVAILABLE.to_string(),
                |geometry| {
                    format_km(haversine_km(
                        origin,
                        Coordinates::new(geometry.location.lat, geometry.location.lng),
                    ))
                },
            );
            ProviderListing {
                name: place.name,
                vicinity: place.vicinity,
                distance,
                geometry: place.geometry,
                place_id: place.place_id,
            }
        })
        .collect()
}
