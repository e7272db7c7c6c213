//! Wire model for the territory tile feed.
//!
//! The feed is a flat JSON object mapping tile names to JSON-encoded strings.
//! Each inner string is decoded on its own so that one malformed entry never
//! spoils the rest of the board.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw response body: tile name to the still-encoded payload, in response order.
pub type RawTileMap = serde_json::Map<String, Value>;

pub const LABEL_RESERVED: &str = "예약중";
pub const LABEL_IN_PROGRESS: &str = "시작중";
pub const LABEL_COMPLETE: &str = "완료";
pub const LABEL_FORMAT_ERROR: &str = "형식오류";

/// Player shown on tiles whose payload could not be decoded.
pub const PLAYER_NOT_AVAILABLE: &str = "N/A";

/// Capture stage of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TileStatus {
    Reserved,
    InProgress,
    Complete,
    /// Sentinel produced by the decoder for malformed payloads.
    FormatError,
    /// Any other status text, kept verbatim.
    Unknown(String),
}

impl TileStatus {
    pub fn from_label(label: &str) -> Self {
        match label {
            LABEL_RESERVED => TileStatus::Reserved,
            LABEL_IN_PROGRESS => TileStatus::InProgress,
            LABEL_COMPLETE => TileStatus::Complete,
            LABEL_FORMAT_ERROR => TileStatus::FormatError,
            other => TileStatus::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TileStatus::Reserved => LABEL_RESERVED,
            TileStatus::InProgress => LABEL_IN_PROGRESS,
            TileStatus::Complete => LABEL_COMPLETE,
            TileStatus::FormatError => LABEL_FORMAT_ERROR,
            TileStatus::Unknown(text) => text,
        }
    }

    /// The three capture stages the board groups by.
    pub fn known(&self) -> Option<KnownStatus> {
        match self {
            TileStatus::Reserved => Some(KnownStatus::Reserved),
            TileStatus::InProgress => Some(KnownStatus::InProgress),
            TileStatus::Complete => Some(KnownStatus::Complete),
            TileStatus::FormatError | TileStatus::Unknown(_) => None,
        }
    }
}

impl From<String> for TileStatus {
    fn from(label: String) -> Self {
        TileStatus::from_label(&label)
    }
}

impl From<TileStatus> for String {
    fn from(status: TileStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownStatus {
    Reserved,
    InProgress,
    Complete,
}

impl KnownStatus {
    pub const ALL: [KnownStatus; 3] = [
        KnownStatus::Reserved,
        KnownStatus::InProgress,
        KnownStatus::Complete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            KnownStatus::Reserved => LABEL_RESERVED,
            KnownStatus::InProgress => LABEL_IN_PROGRESS,
            KnownStatus::Complete => LABEL_COMPLETE,
        }
    }
}

impl From<KnownStatus> for TileStatus {
    fn from(status: KnownStatus) -> Self {
        match status {
            KnownStatus::Reserved => TileStatus::Reserved,
            KnownStatus::InProgress => TileStatus::InProgress,
            KnownStatus::Complete => TileStatus::Complete,
        }
    }
}

/// One decoded tile. `None` fields mean the payload did not carry the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub name: String,
    pub status: Option<TileStatus>,
    pub player: Option<String>,
}

impl TileRecord {
    pub fn new(name: impl Into<String>, status: TileStatus, player: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Some(status),
            player: Some(player.into()),
        }
    }

    pub fn format_error(name: impl Into<String>) -> Self {
        Self::new(name, TileStatus::FormatError, PLAYER_NOT_AVAILABLE)
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self.status, Some(TileStatus::FormatError))
    }

    pub fn known_status(&self) -> Option<KnownStatus> {
        self.status.as_ref().and_then(TileStatus::known)
    }

    pub fn status_label(&self) -> &str {
        self.status.as_ref().map(TileStatus::label).unwrap_or("")
    }

    pub fn player_label(&self) -> &str {
        self.player.as_deref().unwrap_or("")
    }
}

/// Decode one inner payload string.
pub fn decode_tile_payload(name: &str, raw: &str) -> TileRecord {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return TileRecord::format_error(name),
    };

    let fields = match parsed.as_object() {
        Some(fields) => fields,
        None => {
            return TileRecord {
                name: name.to_string(),
                status: None,
                player: None,
            }
        }
    };

    TileRecord {
        name: name.to_string(),
        status: fields.get("status").and_then(status_from_value),
        player: fields.get("player").and_then(player_from_value),
    }
}

/// Decode one entry of the raw map. Only string values are valid payloads.
pub fn decode_tile_value(name: &str, value: &Value) -> TileRecord {
    match value {
        Value::String(raw) => decode_tile_payload(name, raw),
        _ => TileRecord::format_error(name),
    }
}

pub fn decode_tile_map(raw: &RawTileMap) -> Vec<TileRecord> {
    raw.iter()
        .map(|(name, value)| decode_tile_value(name, value))
        .collect()
}

/// Convenience for callers holding the response body as text.
pub fn decode_tile_map_json(body: &str) -> serde_json::Result<Vec<TileRecord>> {
    let raw: RawTileMap = serde_json::from_str(body)?;
    Ok(decode_tile_map(&raw))
}

fn status_from_value(value: &Value) -> Option<TileStatus> {
    match value {
        Value::Null => None,
        Value::String(label) => Some(TileStatus::from_label(label)),
        other => Some(TileStatus::Unknown(other.to_string())),
    }
}

/// Players arrive both as `"7"` and `7`; both become the string `"7"`.
pub fn player_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number_text(number)),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn number_text(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        // 7.0 prints as "7", like an integral player id would.
        Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => format!("{:.0}", float),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}
