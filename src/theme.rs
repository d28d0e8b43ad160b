use ratatui::style::Color;

pub const BORDER_GREEN: Color = Color::Rgb(30, 130, 30);
pub const TITLE_GREEN: Color = Color::Rgb(0, 160, 50);
pub const DARK_BG: Color = Color::Rgb(15, 15, 25);

/// Normalized RGB triple, components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(
            (rgb.r * 255.0).round() as u8,
            (rgb.g * 255.0).round() as u8,
            (rgb.b * 255.0).round() as u8,
        )
    }
}

/// Maps a load percentage onto the green→red gradient: 0% is pure green,
/// 100% pure red. Out-of-range input saturates at the nearest endpoint.
pub fn load_color(pct: f64) -> Rgb {
    let t = (pct / 100.0).clamp(0.0, 1.0);
    Rgb {
        r: t,
        g: 1.0 - t,
        b: 0.0,
    }
}
