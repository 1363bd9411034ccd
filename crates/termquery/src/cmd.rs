//! The terminal queries issued by this crate.
//!
//! This module provides the escape sequences for querying colors, i.e.,
//! [`RequestColor`] for the default foreground, default background, and
//! indexed colors as well as [`DynRequestColor`] for arbitrary operating
//! system commands, plus the guard query [`RequestCursorPosition`]. All of them
//! implement [`Command`], i.e., writing their display emits the escape
//! sequence.
//!
//! Color queries are terminated with `BEL` and not `ST`, since more terminals
//! understand the former.
//!
//!
//! # Example
//!
//! ```
//! # use termquery::cmd::{DynRequestColor, RequestColor, RequestCursorPosition};
//! assert_eq!(format!("{}", RequestColor::Indexed(7)), "\x1b]4;7;?\x07");
//! assert_eq!(format!("{}", RequestColor::Background), "\x1b]11;?\x07");
//! assert_eq!(format!("{}", DynRequestColor(&[12])), "\x1b]12;?\x07");
//! assert_eq!(format!("{}", RequestCursorPosition), "\x1b[6n");
//! ```

use crate::Command;

/// Control codes that start or end ANSI escape sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Bell
    BEL,
    /// Escape
    ESC,
    /// Device Control String: `ESC P`
    DCS,
    /// Control Sequence Introducer: `ESC [`
    CSI,
    /// String Terminator: `ESC \`
    ST,
    /// Operating System Command: `ESC ]`
    OSC,
}

impl Control {
    /// Get the 7-bit encoding.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BEL => "\x07",
            Self::ESC => "\x1b",
            Self::DCS => "\x1bP",
            Self::CSI => "\x1b[",
            Self::ST => "\x1b\\",
            Self::OSC => "\x1b]",
        }
    }

    /// Get the 7-bit encoding as bytes.
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------------------------------------------

fn write_color_query(f: &mut std::fmt::Formatter<'_>, params: &[u32]) -> std::fmt::Result {
    f.write_str(Control::OSC.as_str())?;
    for param in params {
        <_ as std::fmt::Display>::fmt(param, f)?;
        f.write_str(";")?;
    }
    f.write_str("?")?;
    f.write_str(Control::BEL.as_str())
}

/// The color queries.
///
/// On xterm and compatible terminals, the number of indexed colors usually is
/// 16, 88, or 256. Use
/// [`Session::probe_color_count`](crate::Session::probe_color_count) to find
/// out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestColor {
    /// The indexed color with the given index.
    Indexed(u32),
    /// The default foreground color.
    Foreground,
    /// The default background color.
    Background,
}

impl Command for RequestColor {}

impl std::fmt::Display for RequestColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Indexed(index) => write_color_query(f, &[4, index]),
            Self::Foreground => write_color_query(f, &[10]),
            Self::Background => write_color_query(f, &[11]),
        }
    }
}

/// The dynamic `DynRequestColor(PARAMS)` command.
///
/// It queries a color-valued terminal parameter by its operating system
/// command parameters. For example, `DynRequestColor(&[4, 1])` queries indexed
/// color 1 and `DynRequestColor(&[12])` queries the cursor color on xterm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynRequestColor<'a>(pub &'a [u32]);

impl Command for DynRequestColor<'_> {}

impl std::fmt::Display for DynRequestColor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_color_query(f, self.0)
    }
}

/// The unit `RequestCursorPosition` command.
///
/// The device status report for the cursor position. Practically all
/// terminals answer it with `CSI <row> ; <column> R`, which makes it the guard
/// following every color query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestCursorPosition;

impl Command for RequestCursorPosition {}

impl std::fmt::Display for RequestCursorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Control::CSI.as_str())?;
        f.write_str("6n")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_size_and_display() {
        assert_eq!(std::mem::size_of::<RequestCursorPosition>(), 0);

        assert_eq!(format!("{}", RequestColor::Indexed(0)), "\x1b]4;0;?\x07");
        assert_eq!(format!("{}", RequestColor::Indexed(255)), "\x1b]4;255;?\x07");
        assert_eq!(format!("{}", RequestColor::Foreground), "\x1b]10;?\x07");
        assert_eq!(format!("{}", RequestColor::Background), "\x1b]11;?\x07");
        assert_eq!(format!("{}", DynRequestColor(&[4, 13])), "\x1b]4;13;?\x07");
        assert_eq!(format!("{}", DynRequestColor(&[])), "\x1b]?\x07");
        assert_eq!(format!("{}", RequestCursorPosition), "\x1b[6n");
        assert_eq!(format!("{}{}", Control::DCS, Control::ST), "\x1bP\x1b\\");
    }
}
