use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dark shade used when a color is not in the palette.
pub const DEFAULT_COLOR_DARK: &str = "#0051D5";

/// A stored card. Holds only display-safe data; the raw number, expiry and
/// CVV are consumed by token derivation at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,
    pub token: String,
    pub last4: String,
    pub expiry: String,
    pub color: String,
    pub color_dark: String,
    pub is_primary: bool,
    pub bank_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteColor {
    pub name: &'static str,
    pub value: &'static str,
    pub dark: &'static str,
}

pub const PALETTE: [PaletteColor; 7] = [
    PaletteColor {
        name: "Blue",
        value: "#007AFF",
        dark: "#0051D5",
    },
    PaletteColor {
        name: "Green",
        value: "#34C759",
        dark: "#248A3D",
    },
    PaletteColor {
        name: "Red",
        value: "#FF3B30",
        dark: "#D70015",
    },
    PaletteColor {
        name: "Orange",
        value: "#FF9500",
        dark: "#CC7700",
    },
    PaletteColor {
        name: "Purple",
        value: "#AF52DE",
        dark: "#8E44AD",
    },
    PaletteColor {
        name: "Pink",
        value: "#FF2D55",
        dark: "#CC1A3D",
    },
    PaletteColor {
        name: "Yellow",
        value: "#FFCC00",
        dark: "#CC9900",
    },
];

/// Dark shade for a card color; falls back to [`DEFAULT_COLOR_DARK`].
pub fn darken_color(color: &str) -> &'static str {
    PALETTE
        .iter()
        .find(|c| c.value.eq_ignore_ascii_case(color))
        .map(|c| c.dark)
        .unwrap_or(DEFAULT_COLOR_DARK)
}

/// Issuing network label from the BIN prefix.
pub fn bank_name(number: &str) -> &'static str {
    match number.as_bytes().first() {
        Some(b'4') => "VISA",
        Some(b'5') => "MASTERCARD",
        _ => "BANK",
    }
}

/// Card color suggested by the BIN prefix, used when no color was picked.
pub fn bank_color(number: &str) -> &'static str {
    match number.as_bytes().first() {
        Some(b'5') => "#000000",
        _ => "#007AFF",
    }
}
