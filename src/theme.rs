use crate::{foundation::core::Rgba8Premul, model::block::Customization};

/// Immutable color token set shared by every renderer. Colors are straight
/// RGBA on this struct; conversion to premultiplied happens at draw-op
/// construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeColors {
    pub background: [u8; 4],
    pub surface: [u8; 4],
    pub text: [u8; 4],
    pub text_secondary: [u8; 4],
    pub text_tertiary: [u8; 4],
    pub accent: [u8; 4],
    pub border: [u8; 4],
    pub muted: [u8; 4],
}

impl ThemeColors {
    pub fn background_premul(&self) -> Rgba8Premul {
        rgba(self.background)
    }

    pub fn surface_premul(&self) -> Rgba8Premul {
        rgba(self.surface)
    }

    pub fn accent_premul(&self) -> Rgba8Premul {
        rgba(self.accent)
    }

    /// Merge per-block overrides into an effective palette. Absent fields
    /// keep the theme value.
    pub fn customized(mut self, custom: Option<&Customization>) -> Self {
        let Some(custom) = custom else {
            return self;
        };
        if let Some(accent) = custom.accent_rgba8 {
            self.accent = accent;
        }
        if let Some(text) = custom.text_rgba8 {
            self.text = text;
        }
        if let Some(background) = custom.background_rgba8 {
            self.background = background;
        }
        self
    }
}

fn rgba([r, g, b, a]: [u8; 4]) -> Rgba8Premul {
    Rgba8Premul::from_straight_rgba(r, g, b, a)
}

pub const MIDNIGHT: ThemeColors = ThemeColors {
    background: [13, 17, 28, 255],
    surface: [24, 30, 46, 255],
    text: [235, 238, 245, 255],
    text_secondary: [164, 173, 192, 255],
    text_tertiary: [110, 119, 140, 255],
    accent: [94, 129, 255, 255],
    border: [42, 50, 70, 255],
    muted: [58, 66, 88, 255],
};

pub const PAPER: ThemeColors = ThemeColors {
    background: [248, 246, 240, 255],
    surface: [255, 255, 255, 255],
    text: [28, 30, 34, 255],
    text_secondary: [92, 98, 110, 255],
    text_tertiary: [150, 156, 168, 255],
    accent: [214, 88, 52, 255],
    border: [222, 218, 208, 255],
    muted: [200, 196, 186, 255],
};

pub const EMBER: ThemeColors = ThemeColors {
    background: [21, 13, 14, 255],
    surface: [38, 24, 24, 255],
    text: [247, 238, 233, 255],
    text_secondary: [196, 170, 160, 255],
    text_tertiary: [140, 116, 108, 255],
    accent: [255, 120, 73, 255],
    border: [64, 42, 40, 255],
    muted: [88, 60, 56, 255],
};

pub const OCEAN: ThemeColors = ThemeColors {
    background: [8, 22, 30, 255],
    surface: [16, 38, 50, 255],
    text: [230, 243, 248, 255],
    text_secondary: [150, 184, 198, 255],
    text_tertiary: [100, 134, 150, 255],
    accent: [54, 196, 210, 255],
    border: [30, 58, 72, 255],
    muted: [48, 80, 96, 255],
};

pub const DEFAULT_THEME: &str = "midnight";

/// Resolve a theme name to its color set. Unknown names fall back to the
/// default theme: a bad theme string degrades cosmetically, it never fails a
/// render.
pub fn resolve_theme(name: &str) -> ThemeColors {
    match name.trim().to_ascii_lowercase().as_str() {
        "midnight" => MIDNIGHT,
        "paper" => PAPER,
        "ember" => EMBER,
        "ocean" => OCEAN,
        other => {
            tracing::warn!(theme = other, "unknown theme name, using default");
            MIDNIGHT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_themes_resolve() {
        assert_eq!(resolve_theme("paper"), PAPER);
        assert_eq!(resolve_theme("  OCEAN "), OCEAN);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        assert_eq!(resolve_theme("does-not-exist"), MIDNIGHT);
        assert_eq!(resolve_theme(""), MIDNIGHT);
    }

    #[test]
    fn customization_overrides_only_named_fields() {
        let custom = Customization {
            accent_rgba8: Some([1, 2, 3, 255]),
            text_rgba8: None,
            background_rgba8: None,
            align: None,
        };
        let effective = MIDNIGHT.customized(Some(&custom));
        assert_eq!(effective.accent, [1, 2, 3, 255]);
        assert_eq!(effective.text, MIDNIGHT.text);
        assert_eq!(effective.background, MIDNIGHT.background);
    }
}
