use serde::Serialize;

/// Scroll offset after which the progress indicator appears.
pub const VISIBLE_AFTER_PX: f64 = 100.0;
/// Percentage past which a read counts as finished.
pub const COMPLETED_ABOVE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingProgress {
    pub percent: f64,
    pub visible: bool,
    pub completed: bool,
}

impl ReadingProgress {
    pub fn from_scroll(scroll_top: f64, document_height: f64, viewport_height: f64) -> Self {
        let scrollable = document_height - viewport_height;
        let percent = if scrollable <= 0.0 {
            100.0
        } else {
            (scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
        };

        Self {
            percent,
            visible: scroll_top > VISIBLE_AFTER_PX,
            completed: percent > COMPLETED_ABOVE,
        }
    }

    pub fn rounded(&self) -> u8 {
        self.percent.round() as u8
    }
}
