use serde::{Deserialize, Serialize};

/// 8-bit straight-alpha colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// Parse a CSS colour value as returned by `getComputedStyle`.
    ///
    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` and a
    /// handful of named colours. Returns `None` for anything else.
    pub fn parse_css(value: &str) -> Option<Rgba> {
        let v = value.trim().to_ascii_lowercase();
        if let Some(hex) = v.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(body) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|s| s.strip_suffix(')'))
        {
            return parse_rgb_fn(body);
        }
        match v.as_str() {
            "black" => Some(Rgba::BLACK),
            "white" => Some(Rgba::WHITE),
            "transparent" => Some(Rgba::TRANSPARENT),
            "red" => Some(Rgba::rgb(255, 0, 0)),
            "green" => Some(Rgba::rgb(0, 128, 0)),
            "blue" => Some(Rgba::rgb(0, 0, 255)),
            "orange" => Some(Rgba::rgb(255, 165, 0)),
            "gray" | "grey" => Some(Rgba::rgb(128, 128, 128)),
            _ => None,
        }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Rgba { a, ..self }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_rgb_fn(body: &str) -> Option<Rgba> {
    let parts: Vec<&str> = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let n: f64 = s.parse().ok()?;
        Some(n.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(s) => {
            let a = match s.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? / 100.0,
                None => s.parse::<f64>().ok()?,
            };
            (a.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

/// Colours read at render time. Implementations must not be cached by the
/// engine; the browser crate reads CSS custom properties on every call.
pub trait ThemeProvider {
    fn accent(&self) -> Rgba;
    fn grid_line(&self) -> Rgba;
    fn hover(&self) -> Rgba;
}

/// Fixed palette, used by tests, exports and as the browser fallback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub accent: Rgba,
    pub grid_line: Rgba,
    pub hover: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            accent: Rgba::rgb(0x4a, 0x90, 0xe2),
            grid_line: Rgba::rgb(0xdd, 0xdd, 0xdd),
            hover: Rgba::rgb(0xff, 0xa5, 0x00),
        }
    }
}

impl ThemeProvider for Theme {
    fn accent(&self) -> Rgba {
        self.accent
    }

    fn grid_line(&self) -> Rgba {
        self.grid_line
    }

    fn hover(&self) -> Rgba {
        self.hover
    }
}
