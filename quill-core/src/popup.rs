//! Promotional popup shown once per page load.
//!
//! The config comes from the content API; this module only decides when the
//! popup is on screen and whether the reader may close it yet.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MAX_FEATURES: usize = 4;
pub const DEFAULT_SHOW_AFTER_SECONDS: u64 = 5;
/// How long a visible popup refuses to close.
pub const CLOSE_LOCK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupConfig {
    pub title: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub description: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    pub price: Price,
    pub button_text: String,
    #[serde(default)]
    pub button_link: String,
    #[serde(default)]
    pub show_after_seconds: u64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub colors: Colors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: "#ff3e00".into(),
            secondary: "#4d61ff".into(),
            accent: "#00e0b0".into(),
        }
    }
}

impl PopupConfig {
    /// Features with text, at most four of them.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .take(MAX_FEATURES)
    }

    /// Zero falls back to [`DEFAULT_SHOW_AFTER_SECONDS`].
    pub fn show_after(&self) -> Duration {
        match self.show_after_seconds {
            0 => Duration::from_secs(DEFAULT_SHOW_AFTER_SECONDS),
            s => Duration::from_secs(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Inactive,
    Waiting { remaining: Duration },
    Visible { close_in: Duration },
    Closable,
    Dismissed,
}

#[derive(Debug, Clone)]
pub struct Popup {
    config: PopupConfig,
    state: PopupState,
}

impl Popup {
    pub fn new(config: PopupConfig) -> Self {
        let state = if config.is_active {
            PopupState::Waiting {
                remaining: config.show_after(),
            }
        } else {
            PopupState::Inactive
        };
        Self { config, state }
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(
            self.state,
            PopupState::Visible { .. } | PopupState::Closable
        )
    }

    /// Whole seconds left on the close countdown, rounded up.
    pub fn seconds_until_closable(&self) -> Option<u64> {
        match self.state {
            PopupState::Visible { close_in } => {
                let secs = close_in.as_secs() + u64::from(close_in.subsec_nanos() > 0);
                Some(secs)
            }
            _ => None,
        }
    }

    /// Advance the clock. Time left over after a transition carries into the next state.
    pub fn tick(&mut self, mut elapsed: Duration) {
        loop {
            match self.state {
                PopupState::Waiting { remaining } => {
                    if elapsed < remaining {
                        self.state = PopupState::Waiting {
                            remaining: remaining - elapsed,
                        };
                        return;
                    }
                    elapsed -= remaining;
                    self.state = PopupState::Visible {
                        close_in: CLOSE_LOCK,
                    };
                }
                PopupState::Visible { close_in } => {
                    if elapsed < close_in {
                        self.state = PopupState::Visible {
                            close_in: close_in - elapsed,
                        };
                    } else {
                        self.state = PopupState::Closable;
                    }
                    return;
                }
                PopupState::Inactive | PopupState::Closable | PopupState::Dismissed => return,
            }
        }
    }

    /// Try to close the popup. Refused while the countdown is running.
    pub fn close(&mut self) -> bool {
        if self.state == PopupState::Closable {
            self.state = PopupState::Dismissed;
            true
        } else {
            false
        }
    }

    /// Link to open when the call-to-action is pressed.
    pub fn click(&self) -> Option<&str> {
        let link = self.config.button_link.trim();
        (self.is_visible() && !link.is_empty()).then_some(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PopupConfig {
        serde_json::from_str(
            r##"{
                "title": "Rust Workshop",
                "tag": "Limited",
                "description": "Two days of ownership and borrowing",
                "features": [
                    {"text": "Live coding", "icon": ""},
                    {"text": "", "icon": ""},
                    {"text": "Exercises"},
                    {"text": "Q&A"},
                    {"text": "Recording"},
                    {"text": "Certificate"}
                ],
                "price": {"amount": 49, "currency": "$", "period": "per seat"},
                "buttonText": "Get Started",
                "buttonLink": "https://example.com/workshop",
                "showAfterSeconds": 3,
                "isActive": true
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_features_capped() {
        let cfg = config();
        let texts: Vec<_> = cfg.features().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, ["Live coding", "Exercises", "Q&A", "Recording"]);
        assert_eq!(cfg.colors, Colors::default());
    }

    #[test]
    fn test_lifecycle() {
        let mut popup = Popup::new(config());
        assert!(!popup.is_visible());
        assert_eq!(popup.click(), None);

        popup.tick(Duration::from_secs(2));
        assert!(!popup.is_visible());

        popup.tick(Duration::from_millis(1500));
        assert!(popup.is_visible());
        assert_eq!(popup.seconds_until_closable(), Some(5));
        assert!(!popup.close());
        assert_eq!(popup.click(), Some("https://example.com/workshop"));

        popup.tick(Duration::from_secs(4));
        assert_eq!(popup.seconds_until_closable(), Some(1));

        popup.tick(Duration::from_secs(1));
        assert_eq!(popup.state(), PopupState::Closable);
        assert!(popup.close());
        assert_eq!(popup.state(), PopupState::Dismissed);
        assert!(!popup.is_visible());
    }

    #[test]
    fn test_large_tick_reaches_closable() {
        let mut popup = Popup::new(config());
        popup.tick(Duration::from_secs(60));
        assert_eq!(popup.state(), PopupState::Closable);
    }

    #[test]
    fn test_inactive_never_shows() {
        let mut cfg = config();
        cfg.is_active = false;
        let mut popup = Popup::new(cfg);
        popup.tick(Duration::from_secs(60));
        assert_eq!(popup.state(), PopupState::Inactive);
    }

    #[test]
    fn test_zero_delay_uses_default() {
        let mut cfg = config();
        cfg.show_after_seconds = 0;
        assert_eq!(cfg.show_after(), Duration::from_secs(DEFAULT_SHOW_AFTER_SECONDS));
    }
}
