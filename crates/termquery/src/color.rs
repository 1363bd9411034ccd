//! The color values reported by terminals.

/// An RGB color with alpha.
///
/// All four components are real numbers between 0 and 1 inclusive. Colors
/// returned by queries never carry premultiplied alpha; the channels always
/// are the actual color, whereas alpha is reported separately and defaults to
/// 1.0 for terminals that do not report it.
///
/// ```
/// # use termquery::Color;
/// let orange = Color::new(1.0, 0.5, 0.0);
/// assert_eq!(orange.alpha(), 1.0);
/// assert_eq!(orange.to_24bit(), [255, 128, 0]);
/// assert_eq!(format!("{}", orange), "#ff8000");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
}

impl Color {
    /// Create a new opaque color.
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self::with_alpha(red, green, blue, 1.0)
    }

    /// Create a new color with the given alpha.
    pub const fn with_alpha(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// The fully transparent black reported for zero alpha.
    pub const TRANSPARENT: Color = Color::with_alpha(0.0, 0.0, 0.0, 0.0);

    /// Get the red channel.
    pub const fn red(&self) -> f64 {
        self.red
    }

    /// Get the green channel.
    pub const fn green(&self) -> f64 {
        self.green
    }

    /// Get the blue channel.
    pub const fn blue(&self) -> f64 {
        self.blue
    }

    /// Get the alpha value.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Get the four components in RGBA order.
    pub const fn components(&self) -> [f64; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }

    /// Determine whether all components are between 0 and 1 inclusive.
    pub fn is_in_gamut(&self) -> bool {
        self.components()
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }

    /// Convert the channels to 24-bit color, ignoring alpha.
    ///
    /// Channels are clamped before scaling and rounding.
    pub fn to_24bit(&self) -> [u8; 3] {
        fn scale(value: f64) -> u8 {
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        [scale(self.red), scale(self.green), scale(self.blue)]
    }
}

impl Default for Color {
    /// Opaque black.
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.to_24bit();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

#[cfg(test)]
mod test {
    use super::Color;

    #[test]
    fn test_gamut() {
        assert!(Color::new(0.0, 0.5, 1.0).is_in_gamut());
        assert!(Color::TRANSPARENT.is_in_gamut());
        assert!(!Color::new(0.0, 1.5, 1.0).is_in_gamut());
        assert!(!Color::with_alpha(0.0, 0.5, 1.0, -0.1).is_in_gamut());
    }

    #[test]
    fn test_24bit() {
        assert_eq!(Color::new(0.0, 1.0, 0.2).to_24bit(), [0, 255, 51]);
        assert_eq!(Color::new(-1.0, 2.0, 0.0).to_24bit(), [0, 255, 0]);
        assert_eq!(format!("{}", Color::new(0.0, 1.0, 0.2)), "#00ff33");
        assert_eq!(format!("{}", Color::default()), "#000000");
    }
}
