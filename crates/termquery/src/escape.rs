//! Forwarding queries through terminal multiplexers.
//!
//! A terminal multiplexer sits between the application and the actual
//! terminal. It answers some queries itself and silently drops others. Both
//! tmux and GNU screen can relay an escape sequence to the actual terminal
//! when it is wrapped in a device control string:
//!
//!   * tmux expects `DCS tmux; <query> NUL ST`, with every `ESC` of the query
//!     doubled.
//!   * GNU screen expects `DCS <query> ST`, with every `ST` of the query
//!     broken up so that it does not end the device control string early.
//!
//! Forwarding is best effort. The multiplexer may still intercept the query,
//! e.g., when tmux's `allow-passthrough` option is off.

use crate::cmd::Control;

/// The environment variable marking a tmux session.
pub const TMUX_VARIABLE: &str = "TMUX";

/// The environment variable marking a GNU screen session.
pub const SCREEN_VARIABLE: &str = "STY";

const TMUX_PREFIX: &[u8] = b"\x1bPtmux;";
const TMUX_SUFFIX: &[u8] = b"\0\x1b\\";
const SCREEN_ESCAPED_ST: &[u8] = b"\x1b\x1b\\\x1bP\\";

/// A terminal multiplexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplexer {
    /// tmux, marked by `TMUX`.
    Tmux,
    /// GNU screen, marked by `STY`.
    Screen,
}

impl Multiplexer {
    /// Detect the multiplexer from the process environment.
    ///
    /// tmux takes priority over GNU screen.
    pub fn detect() -> Option<Self> {
        Self::detect_with(|name| std::env::var_os(name).is_some_and(|v| !v.is_empty()))
    }

    /// Detect the multiplexer with the given predicate for the presence of an
    /// environment variable.
    pub fn detect_with<F>(is_present: F) -> Option<Self>
    where
        F: Fn(&str) -> bool,
    {
        [Self::Tmux, Self::Screen]
            .into_iter()
            .find(|multiplexer| is_present(multiplexer.variable()))
    }

    /// Get the environment variable marking this multiplexer.
    pub const fn variable(&self) -> &'static str {
        match self {
            Self::Tmux => TMUX_VARIABLE,
            Self::Screen => SCREEN_VARIABLE,
        }
    }

    /// Wrap the query for passthrough.
    ///
    /// ```
    /// # use termquery::escape::Multiplexer;
    /// assert_eq!(
    ///     Multiplexer::Tmux.wrap(b"\x1b[6n"),
    ///     b"\x1bPtmux;\x1b\x1b[6n\0\x1b\\"
    /// );
    /// assert_eq!(Multiplexer::Screen.wrap(b"\x1b[6n"), b"\x1bP\x1b[6n\x1b\\");
    /// ```
    pub fn wrap(&self, query: &[u8]) -> Vec<u8> {
        match self {
            Self::Tmux => {
                let mut wrapped = Vec::with_capacity(TMUX_PREFIX.len() + 2 * query.len() + 3);
                wrapped.extend_from_slice(TMUX_PREFIX);
                for byte in query {
                    if *byte == 0x1b {
                        wrapped.push(0x1b);
                    }
                    wrapped.push(*byte);
                }
                wrapped.extend_from_slice(TMUX_SUFFIX);
                wrapped
            }
            Self::Screen => {
                let mut wrapped = Control::DCS.as_bytes().to_vec();
                wrapped.extend(replace(query, Control::ST.as_bytes(), SCREEN_ESCAPED_ST));
                wrapped.extend_from_slice(Control::ST.as_bytes());
                wrapped
            }
        }
    }

    /// Recover the original query from its wrapped form.
    ///
    /// This method returns `None` if the bytes are not a wrapped query.
    pub fn unwrap(&self, wrapped: &[u8]) -> Option<Vec<u8>> {
        match self {
            Self::Tmux => {
                let inner = wrapped
                    .strip_prefix(TMUX_PREFIX)?
                    .strip_suffix(TMUX_SUFFIX)?;

                let mut query = Vec::with_capacity(inner.len());
                let mut bytes = inner.iter();
                while let Some(byte) = bytes.next() {
                    if *byte == 0x1b && bytes.next() != Some(&0x1b) {
                        return None;
                    }
                    query.push(*byte);
                }
                Some(query)
            }
            Self::Screen => {
                let inner = wrapped
                    .strip_prefix(Control::DCS.as_bytes())?
                    .strip_suffix(Control::ST.as_bytes())?;
                Some(replace(inner, SCREEN_ESCAPED_ST, Control::ST.as_bytes()))
            }
        }
    }
}

/// Replace all non-overlapping occurrences of the pattern.
fn replace(bytes: &[u8], pattern: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index..].starts_with(pattern) {
            result.extend_from_slice(replacement);
            index += pattern.len();
        } else {
            result.push(bytes[index]);
            index += 1;
        }
    }

    result
}

#[cfg(test)]
mod test {
    use super::*;

    const QUERY: &[u8] = b"\x1b]4;1;?\x07\x1b[6n";

    #[test]
    fn test_detect() {
        assert_eq!(Multiplexer::detect_with(|_| false), None);
        assert_eq!(
            Multiplexer::detect_with(|name| name == "TMUX"),
            Some(Multiplexer::Tmux)
        );
        assert_eq!(
            Multiplexer::detect_with(|name| name == "STY"),
            Some(Multiplexer::Screen)
        );
        assert_eq!(Multiplexer::detect_with(|_| true), Some(Multiplexer::Tmux));
        assert_eq!(Multiplexer::Screen.variable(), "STY");
    }

    #[test]
    fn test_tmux() {
        let wrapped = Multiplexer::Tmux.wrap(QUERY);
        assert_eq!(
            wrapped,
            b"\x1bPtmux;\x1b\x1b]4;1;?\x07\x1b\x1b[6n\0\x1b\\".as_slice()
        );

        let escapes = QUERY.iter().filter(|b| **b == 0x1b).count();
        let inner = &wrapped[TMUX_PREFIX.len()..wrapped.len() - TMUX_SUFFIX.len()];
        assert_eq!(inner.iter().filter(|b| **b == 0x1b).count(), 2 * escapes);
        assert!(wrapped.ends_with(b"\0\x1b\\"));

        assert_eq!(Multiplexer::Tmux.unwrap(&wrapped).as_deref(), Some(QUERY));
        assert_eq!(Multiplexer::Tmux.unwrap(b"\x1bPtmux;\x1b[6n\0\x1b\\"), None);
        assert_eq!(Multiplexer::Tmux.unwrap(QUERY), None);
    }

    #[test]
    fn test_screen() {
        assert_eq!(
            Multiplexer::Screen.wrap(QUERY),
            b"\x1bP\x1b]4;1;?\x07\x1b[6n\x1b\\".as_slice()
        );

        let query = b"\x1b]4;1;?\x1b\\\x1b[6n";
        let wrapped = Multiplexer::Screen.wrap(query);
        assert_eq!(
            wrapped,
            b"\x1bP\x1b]4;1;?\x1b\x1b\\\x1bP\\\x1b[6n\x1b\\".as_slice()
        );
        assert_eq!(
            Multiplexer::Screen.unwrap(&wrapped).as_deref(),
            Some(query.as_slice())
        );
        assert_eq!(Multiplexer::Screen.unwrap(QUERY), None);
    }
}
