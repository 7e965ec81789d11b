use puzzle_core::{Rgba, Theme, ThemeProvider};
use web_sys::Window;

/// Colours from the page's CSS custom properties, re-read on every frame so
/// theme switches apply without a reload.
pub struct CssTheme {
    window: Window,
    fallback: Theme,
}

impl CssTheme {
    pub fn new(window: Window) -> Self {
        CssTheme {
            window,
            fallback: Theme::default(),
        }
    }

    fn var(&self, name: &str) -> Option<Rgba> {
        let body = self.window.document()?.body()?;
        let style = self.window.get_computed_style(&body).ok()??;
        let value = style.get_property_value(name).ok()?;
        Rgba::parse_css(value.trim())
    }
}

impl ThemeProvider for CssTheme {
    fn accent(&self) -> Rgba {
        self.var("--accent-color").unwrap_or(self.fallback.accent)
    }

    fn grid_line(&self) -> Rgba {
        self.var("--container-grid-color")
            .unwrap_or(self.fallback.grid_line)
    }

    fn hover(&self) -> Rgba {
        self.var("--piece-hover-color").unwrap_or(self.fallback.hover)
    }
}
