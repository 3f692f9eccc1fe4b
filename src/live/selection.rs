use std::collections::HashSet;

use crate::backend::VehicleId;

pub const MAX_TRACK_POINTS: u32 = 100;
pub const DEFAULT_TRACK_LIMIT: u32 = MAX_TRACK_POINTS;

/// What the user picked: raw entries of the vehicle list and the raw text of
/// the points-per-track input.
#[derive(Debug, Clone)]
pub struct Selection {
    entries: Vec<String>,
    track_limit: String,
}

impl Selection {
    pub fn new(track_limit: u32) -> Self {
        Self {
            entries: Vec::new(),
            track_limit: track_limit.to_string(),
        }
    }

    pub fn select<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = entries.into_iter().map(Into::into).collect();
    }

    pub fn set_track_limit_input(&mut self, raw: impl Into<String>) {
        self.track_limit = raw.into();
    }

    pub fn track_limit_input(&self) -> &str {
        &self.track_limit
    }

    /// Selected ids in selection order, without placeholders or repeats.
    pub fn selected_vehicle_ids(&self) -> Vec<VehicleId> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| VehicleId::new(entry.as_str()))
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Normalises the track limit input and writes the effective value back.
    pub fn clamp_track_limit(&mut self) -> u32 {
        let limit = clamp_track_limit(&self.track_limit);
        self.track_limit = limit.to_string();
        limit
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::new(DEFAULT_TRACK_LIMIT)
    }
}

/// Parses a leading integer (`"42abc"` reads as 42) and clamps it to
/// `1..=MAX_TRACK_POINTS`. Anything without leading digits falls back to the default.
pub fn clamp_track_limit(raw: &str) -> u32 {
    match leading_integer(raw) {
        Some(value) => value.clamp(1, MAX_TRACK_POINTS as i64) as u32,
        None => DEFAULT_TRACK_LIMIT,
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_track_limit() {
        assert_eq!(clamp_track_limit("0"), 1);
        assert_eq!(clamp_track_limit("500"), 100);
        assert_eq!(clamp_track_limit("abc"), 100);
        assert_eq!(clamp_track_limit("42"), 42);
    }

    #[test]
    fn track_limit_edge_inputs() {
        assert_eq!(clamp_track_limit(""), 100);
        assert_eq!(clamp_track_limit("  7"), 7);
        assert_eq!(clamp_track_limit("-5"), 1);
        assert_eq!(clamp_track_limit("12.9"), 12);
        assert_eq!(clamp_track_limit("30 points"), 30);
        assert_eq!(clamp_track_limit("99999999999999999999999"), 100);
    }

    #[test]
    fn clamped_value_is_written_back() {
        let mut selection = Selection::default();
        selection.set_track_limit_input("250");
        assert_eq!(selection.clamp_track_limit(), 100);
        assert_eq!(selection.track_limit_input(), "100");

        selection.set_track_limit_input("nope");
        assert_eq!(selection.clamp_track_limit(), 100);
        assert_eq!(selection.track_limit_input(), "100");
    }

    #[test]
    fn placeholders_and_repeats_are_dropped() {
        let mut selection = Selection::default();
        selection.select(["", "12", " ", "3", "12"]);

        assert_eq!(
            selection.selected_vehicle_ids(),
            vec![VehicleId::new("12"), VehicleId::new("3")]
        );
    }
}
