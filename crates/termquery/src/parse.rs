//! Recognizing the terminal's replies.
//!
//! Terminals reply to color queries in one of two dialects:
//!
//!   * `OSC <dec>; ... rgb:<hex>/<hex>/<hex>` reports an opaque color. This is
//!     what xterm, VTE, and most other terminals do.
//!   * `OSC <dec>; ... rgba:<hex>/<hex>/<hex>/<hex>` reports alpha followed by
//!     the alpha-premultiplied channels. This is what urxvt does for
//!     translucent backgrounds.
//!
//! The dialect is determined by the number of components, not the keyword.
//! Each component has one or more hexadecimal digits and is normalized by its
//! own width, i.e., a component with `n` digits is divided by `16^n - 1`.
//! Terminals use one to four digits, as in X11 color specifications, but wider
//! components are accepted up to [`MAX_COMPONENT_DIGITS`]. Any bytes after the
//! last component, including the terminating `BEL` or `ST`, are ignored.
//!
//! The guard query's reply is `CSI <row>;<column> R`. Since the guard follows
//! the actual query, everything before the last such reply is the actual
//! query's reply.

use crate::cmd::Control;
use crate::util::Radix;
use crate::Color;

/// The maximum number of hexadecimal digits per color component.
///
/// Wider components do not fit into 64 bits.
pub const MAX_COMPONENT_DIGITS: usize = 16;

/// The maximum number of decimal digits for the row or column of a guard
/// reply.
const MAX_POSITION_DIGITS: usize = 20;

/// The maximum length of a guard reply, i.e., `CSI`, two decimal numbers,
/// `;`, and `R`.
pub const MAX_GUARD_LEN: usize = 2 + MAX_POSITION_DIGITS + 1 + MAX_POSITION_DIGITS + 1;

/// A successful match of the guard's reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardMatch {
    /// The number of bytes preceding the guard's reply.
    pub prefix: usize,
    /// The reported cursor row.
    pub row: u64,
    /// The reported cursor column.
    pub column: u64,
}

/// Try to match `<digits> ; <digits> R` at the start of the bytes.
fn match_position(bytes: &[u8]) -> Option<(u64, u64)> {
    let row_len = Radix::Decimal.count_digits(bytes);
    if MAX_POSITION_DIGITS < row_len {
        return None;
    }
    let row = Radix::Decimal.parse(&bytes[..row_len])?;
    let rest = bytes[row_len..].strip_prefix(b";")?;
    let column_len = Radix::Decimal.count_digits(rest);
    if MAX_POSITION_DIGITS < column_len {
        return None;
    }
    let column = Radix::Decimal.parse(&rest[..column_len])?;
    rest[column_len..].strip_prefix(b"R")?;
    Some((row, column))
}

/// Match the guard's reply.
///
/// This function returns the last cursor position report in the buffer,
/// together with the length of the bytes preceding it. It returns `None` if
/// the buffer does not (yet) contain a complete report.
///
/// ```
/// # use termquery::parse::match_guard;
/// let m = match_guard(b"\x1b]11;rgb:0/0/0\x07\x1b[3;14R").unwrap();
/// assert_eq!((m.prefix, m.row, m.column), (15, 3, 14));
///
/// assert!(match_guard(b"\x1b]11;rgb:0/0/0\x07\x1b[3;1").is_none());
/// ```
pub fn match_guard(buffer: &[u8]) -> Option<GuardMatch> {
    match_guard_after(buffer, 0)
}

/// Match the guard's reply, assuming that it starts at or after the offset.
///
/// When bytes are appended to a buffer known not to contain the guard's
/// reply, any reply must overlap with the new bytes. Hence it suffices to
/// scan from [`MAX_GUARD_LEN`] bytes before the new bytes, which keeps
/// incremental matching linear.
pub fn match_guard_after(buffer: &[u8], offset: usize) -> Option<GuardMatch> {
    let csi = Control::CSI.as_bytes();
    let offset = offset.min(buffer.len());
    let mut end = buffer.len();

    while let Some(start) = buffer[offset..end]
        .windows(csi.len())
        .rposition(|w| w == csi)
        .map(|index| offset + index)
    {
        if let Some((row, column)) = match_position(&buffer[start + csi.len()..]) {
            return Some(GuardMatch {
                prefix: start,
                row,
                column,
            });
        }
        end = start;
    }

    None
}

// ------------------------------------------------------------------------------------------------

/// A component's value and number of hexadecimal digits.
#[derive(Clone, Copy, Debug)]
struct Component {
    value: u64,
    width: usize,
}

impl Component {
    /// Scan a component at the start of the bytes.
    fn scan(bytes: &[u8]) -> Option<Self> {
        let width = Radix::Hexadecimal.count_digits(bytes);
        if width == 0 || MAX_COMPONENT_DIGITS < width {
            return None;
        }

        let value = Radix::Hexadecimal.parse(&bytes[..width])?;
        Some(Self { value, width })
    }

    /// Normalize to the unit interval, i.e., divide by `16^width - 1`.
    fn normalize(&self) -> f64 {
        // The width is between 1 and 16, so the shift is between 0 and 60.
        let scale = u64::MAX >> (64 - 4 * self.width);
        self.value as f64 / scale as f64
    }
}

/// Scan the components after the `rgb:` or `rgba:` keyword.
///
/// This function greedily scans up to four slash-separated components. A
/// trailing slash without digits ends the scan.
fn scan_components(mut bytes: &[u8]) -> Option<([Component; 4], usize)> {
    let mut components = [Component { value: 0, width: 0 }; 4];
    let mut count = 0;

    loop {
        let component = Component::scan(bytes)?;
        components[count] = component;
        count += 1;
        bytes = &bytes[component.width..];

        if count == components.len() {
            break;
        }
        match bytes.strip_prefix(b"/") {
            Some(rest) if rest.first().is_some_and(|b| b.is_ascii_hexdigit()) => bytes = rest,
            _ => break,
        }
    }

    Some((components, count))
}

/// Parse a color reply.
///
/// The reply must start with `OSC`, followed by one or more decimal parameters
/// each terminated by a semicolon, followed by `rgb:` or `rgba:` and three or
/// four components. Alpha-premultiplied channels are un-premultiplied. A reply
/// with zero alpha is transparent black. A reply whose un-premultiplied
/// channels exceed one is rejected.
///
/// This function returns `None` if the reply is not a color.
///
/// ```
/// # use termquery::{parse::parse_color, Color};
/// let color = parse_color(b"\x1b]4;1;rgb:ffff/0000/8080\x07").unwrap();
/// assert_eq!(color, Color::new(1.0, 0.0, 0x8080 as f64 / 65_535.0));
///
/// assert!(parse_color(b"").is_none());
/// ```
pub fn parse_color(reply: &[u8]) -> Option<Color> {
    let mut bytes = reply.strip_prefix(Control::OSC.as_bytes())?;

    let mut params = 0;
    loop {
        let length = Radix::Decimal.count_digits(bytes);
        if length == 0 {
            break;
        }
        bytes = bytes[length..].strip_prefix(b";")?;
        params += 1;
    }
    if params == 0 {
        return None;
    }

    let bytes = bytes
        .strip_prefix(b"rgb:")
        .or_else(|| bytes.strip_prefix(b"rgba:"))?;

    let (components, count) = scan_components(bytes)?;
    match count {
        3 => {
            let [r, g, b, _] = components;
            Some(Color::new(r.normalize(), g.normalize(), b.normalize()))
        }
        4 => {
            let [a, r, g, b] = components;
            let alpha = a.normalize();
            if alpha == 0.0 {
                return Some(Color::TRANSPARENT);
            }

            let color = Color::with_alpha(
                r.normalize() / alpha,
                g.normalize() / alpha,
                b.normalize() / alpha,
                alpha,
            );
            color.is_in_gamut().then_some(color)
        }
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(actual: Color, expected: [f64; 4]) {
        for (a, e) in actual.components().iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-9, "{:?} should be close to {:?}", actual, expected);
        }
    }

    #[test]
    fn test_guard() {
        assert_eq!(
            match_guard(b"\x1b[1;1R"),
            Some(GuardMatch {
                prefix: 0,
                row: 1,
                column: 1
            })
        );

        let m = match_guard(b"junk\x1b[12;80Rmore").expect("guard should match");
        assert_eq!((m.prefix, m.row, m.column), (4, 12, 80));

        // The last report wins.
        let m = match_guard(b"\x1b[1;2R\x1b[3;4R").expect("guard should match");
        assert_eq!((m.prefix, m.row, m.column), (6, 3, 4));

        // A trailing incomplete report does not hide an earlier complete one.
        let m = match_guard(b"\x1b[1;2R\x1b[3;").expect("guard should match");
        assert_eq!((m.prefix, m.row, m.column), (0, 1, 2));

        assert!(match_guard(b"").is_none());
        assert!(match_guard(b"\x1b[").is_none());
        assert!(match_guard(b"\x1b[;5R").is_none());
        assert!(match_guard(b"\x1b[5;R").is_none());
        assert!(match_guard(b"\x1b[5;5").is_none());
        assert!(match_guard(b"\x1b[5:5R").is_none());
        assert!(match_guard(b"\x1b[000000000000000000001;1R").is_none());
        assert!(match_guard(b"\x1b]4;1;rgb:0/0/0\x07").is_none());
    }

    #[test]
    fn test_reply_with_guard() {
        let buffer = b"\x1b]4;9;rgb:ffff/0000/8080\x07\x1b[24;80R";
        let m = match_guard(buffer).expect("guard should match");
        assert_eq!((m.prefix, m.row, m.column), (25, 24, 80));

        let color = parse_color(&buffer[..m.prefix]).expect("color");
        assert_close(color, [1.0, 0.0, 0x8080 as f64 / 65_535.0, 1.0]);

        // Matching after an offset yields the same result.
        for offset in 0..=m.prefix {
            assert_eq!(match_guard_after(buffer, offset), Some(m));
        }
        assert_eq!(match_guard_after(buffer, m.prefix + 1), None);
        assert_eq!(match_guard_after(buffer, buffer.len() + 10), None);
    }

    #[test]
    fn test_opaque() {
        let color = parse_color(b"\x1b]10;rgb:ffff/8000/0000\x1b\\").expect("color");
        assert_close(color, [1.0, 32_768.0 / 65_535.0, 0.0, 1.0]);

        let color = parse_color(b"\x1b]4;255;rgb:eeee/eeee/eeee\x07").expect("color");
        let gray = 0xeeee as f64 / 65_535.0;
        assert_close(color, [gray, gray, gray, 1.0]);

        // Mixed widths normalize each component by its own width.
        let color = parse_color(b"\x1b]11;rgb:f/80/fff").expect("color");
        assert_close(color, [1.0, 128.0 / 255.0, 1.0, 1.0]);

        // The keyword does not determine the dialect.
        let color = parse_color(b"\x1b]11;rgba:0/0/0").expect("color");
        assert_close(color, [0.0, 0.0, 0.0, 1.0]);

        // Components wider than four digits are normalized by their width, too.
        let color = parse_color(b"\x1b]11;rgb:fffff/00000000/ffffffffffffffff").expect("color");
        assert_close(color, [1.0, 0.0, 1.0, 1.0]);
        let color = parse_color(b"\x1b]11;rgb:80000/0/0").expect("color");
        assert_close(color, [524_288.0 / 1_048_575.0, 0.0, 0.0, 1.0]);

        // A trailing slash without digits ends the scan.
        let color = parse_color(b"\x1b]11;rgb:1/2/3/\x07").expect("color");
        assert_close(color, [1.0 / 15.0, 2.0 / 15.0, 3.0 / 15.0, 1.0]);
    }

    #[test]
    fn test_premultiplied() {
        // Half alpha, with channels premultiplied.
        let color = parse_color(b"\x1b]11;rgba:8000/4000/2000/0000\x07").expect("color");
        let alpha = 32_768.0 / 65_535.0;
        assert_close(
            color,
            [
                16_384.0 / 65_535.0 / alpha,
                8_192.0 / 65_535.0 / alpha,
                0.0,
                alpha,
            ],
        );

        // Full alpha is the same as no alpha.
        let color = parse_color(b"\x1b]11;rgba:ffff/1234/5678/9abc\x07").expect("color");
        let opaque = parse_color(b"\x1b]11;rgb:1234/5678/9abc\x07").expect("color");
        assert_close(color, opaque.components());

        // Zero alpha is transparent black, no matter the channels.
        let color = parse_color(b"\x1b]11;rgba:0000/ffff/ffff/ffff\x07").expect("color");
        assert_eq!(color, Color::TRANSPARENT);

        // Channels larger than alpha cannot have been premultiplied.
        assert!(parse_color(b"\x1b]11;rgba:1000/ffff/0000/0000\x07").is_none());
    }

    #[test]
    fn test_unparseable() {
        for reply in [
            b"".as_slice(),
            b"\x1b]",
            b"\x1b]rgb:0/0/0",
            b"\x1b]11rgb:0/0/0",
            b"\x1b];rgb:0/0/0",
            b"\x1b]11;rgb:",
            b"\x1b]11;rgb:0/0",
            b"\x1b]11;rgb:0/0/",
            b"\x1b]11;rgb:00000000000000000/0/0",
            b"\x1b]11;hsl:0/0/0",
            b"\x1b]11;?\x07",
            b"\x1b[11;rgb:0/0/0",
            b"11;rgb:0/0/0",
        ] {
            assert!(parse_color(reply).is_none(), "{:?}", reply);
        }
    }
}
