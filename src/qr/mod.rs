use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub const FALLBACK_SIZE: usize = 20;

/// What the back of a card encodes. The timestamp is fresh on every request,
/// so repeated views of one card differ only there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub token: String,
    pub timestamp: String,
    pub card_id: String,
}

impl QrPayload {
    pub fn new(token: &str, card_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            token: token.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            card_id: card_id.to_string(),
        }
    }

    /// Compact JSON handed to the renderer.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A rendered code as rows of modules, `true` for dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub modules: Vec<Vec<bool>>,
    pub fallback: bool,
}

impl QrImage {
    /// Rows as text, `#` for dark and `.` for light.
    pub fn to_rows(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|row| row.iter().map(|&m| if m { '#' } else { '.' }).collect())
            .collect()
    }
}

/// External QR code renderer.
pub trait QrRenderer: Send + Sync {
    fn render(&self, data: &str) -> Result<QrImage>;
}

/// Renders with `renderer` if one is available, otherwise, or when it fails,
/// draws the cosmetic fallback pattern.
pub fn render_or_fallback(renderer: Option<&dyn QrRenderer>, data: &str) -> QrImage {
    if let Some(renderer) = renderer {
        match renderer.render(data) {
            Ok(image) => return image,
            Err(e) => tracing::warn!("QR renderer failed, using fallback: {}", e),
        }
    }
    fallback_pattern(data)
}

/// Deterministic checkerboard keyed on the sum of the payload's char codes.
/// Not decodable.
pub fn fallback_pattern(data: &str) -> QrImage {
    let hash: u64 = data.encode_utf16().map(u64::from).sum();
    let modules = (0..FALLBACK_SIZE)
        .map(|i| {
            (0..FALLBACK_SIZE)
                .map(|j| (hash + (i * FALLBACK_SIZE + j) as u64) % 2 == 0)
                .collect()
        })
        .collect();

    QrImage {
        modules,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::TimeZone;

    struct FailingRenderer;

    impl QrRenderer for FailingRenderer {
        fn render(&self, _data: &str) -> Result<QrImage> {
            Err(anyhow!("renderer unavailable"))
        }
    }

    struct SolidRenderer;

    impl QrRenderer for SolidRenderer {
        fn render(&self, _data: &str) -> Result<QrImage> {
            Ok(QrImage {
                modules: vec![vec![true; 3]; 3],
                fallback: false,
            })
        }
    }

    #[test]
    fn test_payload_encoding() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let payload = QrPayload::new("deadbeef", "card_1_abc", at);
        assert_eq!(
            payload.encode().unwrap(),
            r#"{"token":"deadbeef","timestamp":"2025-03-04T05:06:07.000Z","cardId":"card_1_abc"}"#
        );
    }

    #[test]
    fn test_repeated_payloads_differ_only_in_timestamp() {
        let first_at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let later_at = first_at + chrono::Duration::milliseconds(1500);

        let first = QrPayload::new("deadbeef", "card_1_abc", first_at);
        let later = QrPayload::new("deadbeef", "card_1_abc", later_at);

        assert_eq!(first.token, later.token);
        assert_eq!(first.card_id, later.card_id);
        assert_ne!(first.timestamp, later.timestamp);
        assert_eq!(later.timestamp, "2025-03-04T05:06:08.500Z");
        assert_ne!(first.encode().unwrap(), later.encode().unwrap());
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let a = fallback_pattern("payload");
        let b = fallback_pattern("payload");
        assert_eq!(a, b);
        assert!(a.fallback);
        assert_eq!(a.modules.len(), FALLBACK_SIZE);
        assert!(a.modules.iter().all(|row| row.len() == FALLBACK_SIZE));
    }

    #[test]
    fn test_fallback_parity() {
        // "a" = 97 (odd): cell (0,0) is odd, cell (0,1) is even
        let image = fallback_pattern("a");
        assert!(!image.modules[0][0]);
        assert!(image.modules[0][1]);
        assert_eq!(image.to_rows()[0].len(), FALLBACK_SIZE);
        assert!(image.to_rows()[0].starts_with(".#.#"));
    }

    #[test]
    fn test_render_or_fallback() {
        assert!(render_or_fallback(None, "x").fallback);
        assert!(render_or_fallback(Some(&FailingRenderer), "x").fallback);

        let image = render_or_fallback(Some(&SolidRenderer), "x");
        assert!(!image.fallback);
        assert_eq!(image.to_rows(), vec!["###"; 3]);
    }
}
