//! An in-memory terminal for tests and benchmarks.
//!
//! [`SimulatedTerminal`] implements [`Device`] without any operating system
//! resources. It answers color queries for a palette of configurable size,
//! the default foreground and background colors, and the cursor position
//! request. Its builder methods add the misbehavior of real terminals:
//! fragmented delivery, replies that only arrive after waiting, missing
//! guard replies, attributes that cannot be changed, stale input, hang-ups,
//! and an interposed terminal multiplexer.
//!
//!
//! # Example
//!
//! ```
//! # use termquery::{opt::Options, sim::SimulatedTerminal, Session};
//! let terminal = SimulatedTerminal::new().with_palette_size(88);
//! let mut session = Session::open(terminal, Options::default())?;
//! assert_eq!(session.probe_color_count(100)?, 88);
//! # Ok::<(), termquery::err::Error>(())
//! ```

use std::collections::VecDeque;
use std::io::{Read, Result, Write};

use crate::cmd::{Control, RequestCursorPosition};
use crate::escape::Multiplexer;
use crate::{Color, Device};

/// The simulated terminal attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimAttributes {
    pub echo: bool,
    pub canonical: bool,
    pub min: u8,
    pub time: u8,
}

impl Default for SimAttributes {
    /// Cooked mode.
    fn default() -> Self {
        Self {
            echo: true,
            canonical: true,
            min: 1,
            time: 0,
        }
    }
}

/// The reply format for colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// `rgb:RRRR/GGGG/BBBB`
    Rgb,
    /// `rgba:AAAA/RRRR/GGGG/BBBB` with premultiplied channels and the given
    /// alpha.
    Rgba(u16),
}

/// A simulated terminal.
#[derive(Debug)]
pub struct SimulatedTerminal {
    palette_size: u32,
    foreground: Option<Color>,
    background: Option<Color>,
    dialect: Dialect,
    guard_reply: bool,
    sticky: bool,
    failing_restore: bool,
    latency: bool,
    hangup: bool,
    chunks: Vec<usize>,
    next_chunk: usize,
    multiplexer: Option<Multiplexer>,
    attributes: SimAttributes,
    attribute_writes: usize,
    input: VecDeque<u8>,
    in_flight: VecDeque<u8>,
    written: Vec<u8>,
    color_queries: usize,
}

impl Default for SimulatedTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTerminal {
    /// Create a new well-behaved terminal with 256 colors, black on white.
    pub fn new() -> Self {
        Self {
            palette_size: 256,
            foreground: Some(Color::new(0.0, 0.0, 0.0)),
            background: Some(Color::new(1.0, 1.0, 1.0)),
            dialect: Dialect::Rgb,
            guard_reply: true,
            sticky: false,
            failing_restore: false,
            latency: false,
            hangup: false,
            chunks: Vec::new(),
            next_chunk: 0,
            multiplexer: None,
            attributes: SimAttributes::default(),
            attribute_writes: 0,
            input: VecDeque::new(),
            in_flight: VecDeque::new(),
            written: Vec::new(),
            color_queries: 0,
        }
    }

    /// Get the color the simulated terminal reports for the index.
    ///
    /// Each channel is a 16-bit value, so that the color survives the trip
    /// through an `rgb:` reply unchanged.
    pub fn palette_color(index: u32) -> Color {
        let channel = |salt: u32| {
            let value = index.wrapping_mul(0x9e37).wrapping_add(salt) & 0xffff;
            value as f64 / 65_535.0
        };

        Color::new(channel(0x1234), channel(0x5678), channel(0x9abc))
    }

    /// Answer queries for indexes `0..size`.
    #[must_use]
    pub fn with_palette_size(mut self, size: u32) -> Self {
        self.palette_size = size;
        self
    }

    /// Set the default foreground color.
    #[must_use]
    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    /// Set the default background color.
    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Ignore queries for the default colors.
    #[must_use]
    pub fn without_default_colors(mut self) -> Self {
        self.foreground = None;
        self.background = None;
        self
    }

    /// Set the reply format.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Ignore cursor position requests.
    #[must_use]
    pub fn without_guard_reply(mut self) -> Self {
        self.guard_reply = false;
        self
    }

    /// Accept but silently ignore attribute changes.
    #[must_use]
    pub fn with_sticky_attributes(mut self) -> Self {
        self.sticky = true;
        self
    }

    /// Fail all attribute writes after the first one.
    #[must_use]
    pub fn with_failing_restore(mut self) -> Self {
        self.failing_restore = true;
        self
    }

    /// Make replies available only after a poll that waits.
    ///
    /// A poll with zero timeout never sees them.
    #[must_use]
    pub fn with_latency(mut self) -> Self {
        self.latency = true;
        self
    }

    /// Report input as ready and then read zero bytes once the input has been
    /// consumed.
    #[must_use]
    pub fn with_hangup(mut self) -> Self {
        self.hangup = true;
        self
    }

    /// Deliver input in chunks of the given sizes, cycling through them.
    ///
    /// Zero sizes count as one.
    #[must_use]
    pub fn with_chunks(mut self, chunks: Vec<usize>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Interpose a terminal multiplexer.
    ///
    /// The multiplexer relays wrapped queries to the terminal. For all other
    /// queries, it answers the cursor position request itself and drops
    /// everything else.
    #[must_use]
    pub fn with_multiplexer(mut self, multiplexer: Multiplexer) -> Self {
        self.multiplexer = Some(multiplexer);
        self
    }

    /// Add input that is ready before the first query.
    #[must_use]
    pub fn with_stale_input(mut self, bytes: &[u8]) -> Self {
        self.input.extend(bytes);
        self
    }

    /// Get the current attributes.
    pub fn current_attributes(&self) -> SimAttributes {
        self.attributes
    }

    /// Get the number of attribute writes.
    pub fn attribute_writes(&self) -> usize {
        self.attribute_writes
    }

    /// Get the number of bytes not yet read, including those still in flight.
    pub fn pending_input(&self) -> usize {
        self.input.len() + self.in_flight.len()
    }

    /// Get all bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Get the number of color queries received, answered or not.
    pub fn color_queries(&self) -> usize {
        self.color_queries
    }

    // --------------------------------------------------------------------------------------------

    fn reply(&mut self, bytes: &[u8]) {
        if self.latency {
            self.in_flight.extend(bytes);
        } else {
            self.input.extend(bytes);
        }
    }

    fn encode(&self, color: &Color) -> String {
        let to16 = |value: f64| (value.clamp(0.0, 1.0) * 65_535.0).round() as u32;
        let [r, g, b, _] = color.components();

        match self.dialect {
            Dialect::Rgb => format!("rgb:{:04x}/{:04x}/{:04x}", to16(r), to16(g), to16(b)),
            Dialect::Rgba(alpha) => {
                let premultiply = |value: f64| (to16(value) * alpha as u32 + 0x7fff) / 0xffff;
                format!(
                    "rgba:{:04x}/{:04x}/{:04x}/{:04x}",
                    alpha,
                    premultiply(r),
                    premultiply(g),
                    premultiply(b)
                )
            }
        }
    }

    fn answer_color(&mut self, body: &[u8]) {
        let Some(params) = body.strip_suffix(b";?") else {
            return;
        };
        self.color_queries += 1;

        let Ok(text) = std::str::from_utf8(params) else {
            return;
        };
        let numbers = match text
            .split(';')
            .map(str::parse::<u32>)
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            Ok(numbers) => numbers,
            Err(_) => return,
        };

        let color = match numbers.as_slice() {
            [4, index] if *index < self.palette_size => Some(Self::palette_color(*index)),
            [10] => self.foreground,
            [11] => self.background,
            _ => None,
        };

        if let Some(color) = color {
            let reply = format!(
                "{}{};{}{}",
                Control::OSC,
                text,
                self.encode(&color),
                Control::BEL
            );
            self.reply(reply.as_bytes());
        }
    }

    fn answer(&mut self, mut bytes: &[u8], relayed: bool) {
        let guard = RequestCursorPosition.to_string();

        while !bytes.is_empty() {
            if let Some(body) = bytes.strip_prefix(Control::OSC.as_bytes()) {
                let Some(end) = body.iter().position(|b| *b == 0x07 || *b == 0x1b) else {
                    return;
                };

                if relayed {
                    self.answer_color(&body[..end]);
                }
                bytes = if body[end] == 0x07 {
                    &body[end + 1..]
                } else if body[end..].starts_with(Control::ST.as_bytes()) {
                    &body[end + 2..]
                } else {
                    &body[end..]
                };
            } else if let Some(rest) = bytes.strip_prefix(guard.as_bytes()) {
                if self.guard_reply {
                    self.reply(b"\x1b[1;1R");
                }
                bytes = rest;
            } else {
                bytes = &bytes[1..];
            }
        }
    }
}

impl Read for SimulatedTerminal {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut count = buf.len().min(self.input.len());
        if !self.chunks.is_empty() {
            let chunk = self.chunks[self.next_chunk % self.chunks.len()];
            self.next_chunk += 1;
            count = count.min(chunk.max(1));
        }

        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for SimulatedTerminal {
    /// Process the buffer as one complete message.
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written.extend_from_slice(buf);

        match self.multiplexer {
            None => self.answer(buf, true),
            Some(multiplexer) => match multiplexer.unwrap(buf) {
                Some(query) => self.answer(&query, true),
                None => self.answer(buf, false),
            },
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Device for SimulatedTerminal {
    type Attributes = SimAttributes;

    fn attributes(&self) -> Result<SimAttributes> {
        Ok(self.attributes)
    }

    fn set_attributes(&mut self, attributes: &SimAttributes) -> Result<()> {
        self.attribute_writes += 1;
        if self.failing_restore && 1 < self.attribute_writes {
            return Err(std::io::ErrorKind::PermissionDenied.into());
        }
        if !self.sticky {
            self.attributes = *attributes;
        }
        Ok(())
    }

    fn query_attributes(&self, _saved: &SimAttributes) -> SimAttributes {
        SimAttributes {
            echo: false,
            canonical: false,
            min: 0,
            time: 0,
        }
    }

    /// Check for input.
    ///
    /// Replies in flight arrive with any poll that waits. Since nothing else
    /// could ever arrive, a poll that would wait indefinitely for input
    /// returns `false` instead of hanging.
    fn poll(&mut self, timeout: i32) -> Result<bool> {
        if !self.input.is_empty() {
            return Ok(true);
        }
        if timeout != 0 && !self.in_flight.is_empty() {
            self.input.append(&mut self.in_flight);
            return Ok(true);
        }
        Ok(self.hangup)
    }
}
