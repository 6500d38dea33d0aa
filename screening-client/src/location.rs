use async_trait::async_trait;
use shared::models::Coordinates;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Permission to access location was denied")]
    PermissionDenied,
    #[error("Error getting location")]
    Unavailable(String),
}

/// Source of the device position used for the nearby provider lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A position supplied up front, e.g. from command-line flags.
///
/// `None` behaves like a user who declined location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coordinates>);

impl FixedLocation {
    #[must_use]
    pub const fn at(latitude: f64, longitude: f64) -> Self {
        Self(Some(Coordinates::new(latitude, longitude)))
    }

    #[must_use]
    pub const fn denied() -> Self {
        Self(None)
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let coords = self.0.ok_or(LocationError::PermissionDenied)?;
        if !(-90.0..=90.0).contains(&coords.latitude) || !(-180.0..=180.0).contains(&coords.longitude)
        {
            return Err(LocationError::Unavailable(format!(
                "coordinates out of range: {}, {}",
                coords.latitude, coords.longitude
            )));
        }
        Ok(coords)
    }
}
