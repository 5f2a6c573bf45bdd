use ratatui::style::Color;

// Dark grays with an orange accent. Add roles here rather than inlining colors in the renderer.
pub const FG: Color = Color::Rgb(229, 231, 235);
pub const MUTED: Color = Color::Rgb(156, 163, 175);
pub const DIM: Color = Color::Rgb(107, 114, 128);
pub const BORDER: Color = Color::Rgb(55, 65, 81);
pub const FOCUS_BORDER: Color = Color::Rgb(255, 159, 26);

pub const ACCENT: Color = Color::Rgb(255, 159, 26);
pub const ACCENT_BG: Color = Color::Rgb(44, 32, 16);

pub const NOTICE: Color = Color::Rgb(134, 239, 172); // light green
