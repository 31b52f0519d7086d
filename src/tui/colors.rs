//! Color palettes for the terminal user interface.

use ratatui::style::Color;

use crate::fields::TargetStatus;

/// Accent used for headers and the active form field.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Confirmation dialogs and error text.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);

/// Every color the UI draws with. Chosen once per frame from the theme flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    /// Text drawn on top of `accent`.
    pub on_accent: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    /// Search match highlight.
    pub mark: Color,
    pub error: Color,
    pub met: Color,
    pub close: Color,
    pub far: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        bg: Color::Reset,
        fg: Color::Black,
        muted: Color::DarkGray,
        accent: Color::Blue,
        on_accent: Color::White,
        selection_bg: Color::Gray,
        selection_fg: Color::Black,
        mark: Color::Yellow,
        error: Color::Red,
        met: DARK_GREEN,
        close: Color::Rgb(184, 134, 11),
        far: DARK_RED,
    };

    pub const DARK: Palette = Palette {
        bg: Color::Rgb(24, 24, 32),
        fg: Color::White,
        muted: Color::Gray,
        accent: GOLD,
        on_accent: Color::Rgb(20, 20, 20),
        selection_bg: Color::Rgb(60, 60, 80),
        selection_fg: Color::White,
        mark: Color::Rgb(120, 90, 0),
        error: Color::LightRed,
        met: Color::LightGreen,
        close: GOLD,
        far: Color::LightRed,
    };

    pub fn for_mode(dark: bool) -> Palette {
        if dark { Palette::DARK } else { Palette::LIGHT }
    }

    pub fn target(&self, status: TargetStatus) -> Color {
        match status {
            TargetStatus::Met => self.met,
            TargetStatus::Close => self.close,
            TargetStatus::Far => self.far,
        }
    }
}
