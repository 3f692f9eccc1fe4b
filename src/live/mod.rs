mod interpolate;
mod layers;
mod poll;
mod selection;
mod sync;
mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use poll::{PollMode, Poller, DEFAULT_POLL_INTERVAL};
pub use selection::DEFAULT_TRACK_LIMIT;
pub use sync::{CycleReport, LiveSettings, LiveView, RefreshOutcome, ViewSnapshot};
pub use table::TrackRow;
