use anyhow::{anyhow, Result};
use serde_json::Value;

use super::{LyricLine, Lyrics};
use crate::providers::spotify::PROVIDER_NAME;

const LINE_SYNCED: &str = "LINE_SYNCED";
const NOTE_GLYPH: char = '♪';

/// Normalize a raw lyric payload into one line-level representation.
///
/// Synced payloads carry per-line start times as millisecond counts encoded
/// as strings; plain payloads carry only the words. Lines that don't fit the
/// expected shape are skipped, they never fail the whole payload.
pub fn parse_payload(payload: &Value) -> Result<Lyrics> {
    let synced = payload.get("syncType").and_then(|v| v.as_str()) == Some(LINE_SYNCED);

    let raw_lines = payload
        .get("lines")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("payload has no lines array"))?;

    let lines = raw_lines
        .iter()
        .filter_map(|line| parse_line(line, synced))
        .collect();

    Ok(Lyrics {
        synced,
        provider: PROVIDER_NAME,
        lines,
    })
}

fn parse_line(line: &Value, synced: bool) -> Option<LyricLine> {
    let words = line.get("words")?.as_str()?;

    let time = if synced {
        let start_ms: f64 = line.get("startTimeMs")?.as_str()?.parse().ok()?;
        Some(start_ms / 1000.0)
    } else {
        None
    };

    Some(LyricLine {
        time,
        text: clean_text(words),
    })
}

fn clean_text(words: &str) -> String {
    words.replace(NOTE_GLYPH, " ").trim().to_string()
}
