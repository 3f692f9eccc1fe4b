mod client;
mod error;
mod types;

use std::future::Future;

pub use client::HttpBackend;
pub use error::FetchError;
pub(crate) use types::timestamp;
pub use types::{Position, TrackPoint, Vehicle, VehicleId};

/// Read-only view of the position backend.
///
/// Implementations return `FetchError::Status` for non-2xx responses so the
/// caller can report the code without treating it as fatal.
pub trait Backend: Send + Sync + 'static {
    /// Full vehicle roster.
    fn vehicles(&self) -> impl Future<Output = Result<Vec<Vehicle>, FetchError>> + Send;

    /// Latest known position per vehicle. An empty `ids` slice requests every vehicle.
    fn latest(
        &self,
        ids: &[VehicleId],
    ) -> impl Future<Output = Result<Vec<Position>, FetchError>> + Send;

    /// Most recent `limit` points for one vehicle, oldest first.
    fn track(
        &self,
        id: &VehicleId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<TrackPoint>, FetchError>> + Send;
}
