use std::fmt;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

/// Seaborn's "deep" categorical palette.
const DEEP: [(u8, u8, u8); 10] = [
    (0x4c, 0x72, 0xb0),
    (0xdd, 0x84, 0x52),
    (0x55, 0xa8, 0x68),
    (0xc4, 0x4e, 0x52),
    (0x81, 0x72, 0xb3),
    (0x93, 0x78, 0x60),
    (0xda, 0x8b, 0xc3),
    (0x8c, 0x8c, 0x8c),
    (0xcc, 0xb9, 0x74),
    (0x64, 0xb5, 0xcd),
];

fn to_rgb(c: Srgb<u8>) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Returns `n` series colours: the deep palette while it lasts, otherwise
/// evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n <= DEEP.len() {
        return DEEP[..n]
            .iter()
            .map(|&(r, g, b)| to_rgb(Srgb::new(r, g, b)))
            .collect();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.55, 0.5);
            let rgb: Srgb = hsl.into_color();
            to_rgb(rgb.into_format())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Named figure styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    DarkGrid,
    WhiteGrid,
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "darkgrid" => Ok(Style::DarkGrid),
            "whitegrid" => Ok(Style::WhiteGrid),
            other => Err(format!("unknown style '{other}' (expected darkgrid or whitegrid)")),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Style::DarkGrid => "darkgrid",
            Style::WhiteGrid => "whitegrid",
        })
    }
}

/// Everything the renderer needs to know about colours and type sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub figure_face: RGBColor,
    pub axes_face: RGBColor,
    pub grid: RGBColor,
    pub text: RGBColor,
    pub font_family: &'static str,
    pub tick_font_size: f64,
    pub label_font_size: f64,
    pub title_font_size: f64,
    pub line_width: u32,
    /// Opacity of the error band fill.
    pub band_alpha: f64,
}

impl Theme {
    pub fn new(style: Style) -> Self {
        let (axes_face, grid) = match style {
            Style::DarkGrid => (RGBColor(0xea, 0xea, 0xf2), RGBColor(0xff, 0xff, 0xff)),
            Style::WhiteGrid => (RGBColor(0xff, 0xff, 0xff), RGBColor(0xcc, 0xcc, 0xcc)),
        };
        Theme {
            figure_face: RGBColor(0xff, 0xff, 0xff),
            axes_face,
            grid,
            text: RGBColor(0x26, 0x26, 0x26),
            font_family: "sans-serif",
            tick_font_size: 11.0,
            label_font_size: 12.0,
            title_font_size: 14.0,
            line_width: 2,
            band_alpha: 0.2,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::new(Style::default())
    }
}
