use crate::models::{Track, TrackMatch};

/// Candidates within this many seconds of the canonical duration count as the
/// same recording.
pub const DURATION_TOLERANCE_SECS: f64 = 2.0;

/// Pick the search result whose duration lines up with the canonical track.
///
/// Candidates are scanned in the order the provider returned them and the
/// first one inside the tolerance wins, even if a later result is closer.
/// This is a cheap heuristic, not a fingerprint match: two different
/// recordings of the same length will pass, and a legitimate match with a
/// trimmed intro can fail. Ranking from the search provider does the heavy
/// lifting.
pub fn find_duration_match<'a>(track: &Track, candidates: &'a [TrackMatch]) -> Option<&'a TrackMatch> {
    candidates
        .iter()
        .find(|candidate| (candidate.duration_secs() - track.duration as f64).abs() < DURATION_TOLERANCE_SECS)
}
