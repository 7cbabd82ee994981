//! Colors used across the bug tracker UI.

use crate::notify::NotificationKind;
use crate::table::Tone;
use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Main window background
    pub const WINDOW: Color32 = Color32::from_rgb(14, 17, 23);

    /// Panel backgrounds - slightly lighter than the window
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// State colors
pub mod state {
    use super::*;

    pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);

    pub const WARNING: Color32 = Color32::from_rgb(245, 158, 11);

    pub const DANGER: Color32 = Color32::from_rgb(239, 68, 68);
}

/// Fill behind a priority cell.
pub fn tone_fill(tone: Tone) -> Color32 {
    match tone {
        Tone::Success => state::SUCCESS,
        Tone::Warning => state::WARNING,
        Tone::Danger => state::DANGER,
    }
}

/// Fill behind a notification banner.
pub fn banner_fill(kind: NotificationKind) -> Color32 {
    match kind {
        NotificationKind::Success => state::SUCCESS.linear_multiply(0.35),
        NotificationKind::Error => state::DANGER.linear_multiply(0.35),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tones_have_distinct_fills() {
        assert_ne!(tone_fill(Tone::Success), tone_fill(Tone::Warning));
        assert_ne!(tone_fill(Tone::Warning), tone_fill(Tone::Danger));
        assert_eq!(tone_fill(Tone::for_priority("Critical")), state::DANGER);
    }
}
