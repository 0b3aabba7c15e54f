//! Colors for the graph canvas and the status lines around it.

use egui::Color32;

/// Background colors
pub mod bg {
    use super::*;

    /// Graph canvas
    pub const CANVAS: Color32 = Color32::WHITE;

    /// Window behind the canvas
    pub const PANEL: Color32 = Color32::from_rgb(248, 248, 250);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(33, 33, 33);

    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Border colors
pub mod border {
    use super::*;

    /// Frame around the canvas
    pub const CANVAS: Color32 = Color32::from_rgb(204, 204, 204);
}

/// State colors for nodes and status messages
pub mod state {
    use super::*;

    /// Hovered node outline
    pub const HOVER: Color32 = Color32::from_rgb(59, 130, 246);

    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);

    /// Informational notices, e.g. an empty result
    pub const WARNING: Color32 = Color32::from_rgb(245, 158, 11);
}

/// Helper to create a stroke with consistent styling
pub fn stroke(color: Color32, width: f32) -> egui::Stroke {
    egui::Stroke::new(width, color)
}

/// Parse `#rgb` or `#rrggbb`. Anything else is rejected.
pub fn parse_hex(hex: &str) -> Option<Color32> {
    let digits = hex.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match digits.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in digits.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Color32::from_rgb(rgb[0], rgb[1], rgb[2]))
        }
        6 => Some(Color32::from_rgb(
            channel(digits.get(0..2)?)?,
            channel(digits.get(2..4)?)?,
            channel(digits.get(4..6)?)?,
        )),
        _ => None,
    }
}

/// Parse a configured color, falling back when it is malformed
pub fn color_or(hex: &str, fallback: Color32) -> Color32 {
    parse_hex(hex).unwrap_or_else(|| {
        tracing::warn!(color = hex, "Invalid color in settings, using fallback");
        fallback
    })
}
