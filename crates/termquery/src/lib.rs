//! # Term 🎨 Query
//!
//! This crate **queries a live terminal for its colors**, i.e., the default
//! foreground and background colors as well as the indexed colors of its
//! palette, and it **probes how many indexed colors the terminal supports**.
//! Its only runtime dependencies are [`libc`](https://crates.io/crates/libc)
//! for system calls and [`tracing`](https://crates.io/crates/tracing) for
//! diagnostics.
//!
//! Terminals answer queries in-band, by writing escape sequences to the same
//! input stream the user types into, and they silently ignore queries they do
//! not understand. That makes querying fragile. Hence this crate follows every
//! query with a **guard query**, the request for the cursor position, which
//! practically all terminals answer. Once the guard's reply arrives, whatever
//! came before it is the reply to the actual query, if any.
//!
//! Using the crate is straight-forward:
//!
//!   * Open a [`Session`], which puts the terminal into query mode.
//!   * Issue queries such as [`Session::query_background`] or
//!     [`Session::probe_color_count`].
//!   * Check [`Session::error_count`] for the number of failed queries.
//!   * Drop the session, which restores the terminal.
//!
//! Queries that time out or receive an unparseable reply return `None`
//! instead of failing, so that a single misbehaving query does not abort a
//! longer run.
//!
//!
//! # Example
//!
//! ```no_run
//! # use termquery::{opt::Options, Session};
//! let mut session = Session::with_stdin(Options::default())?;
//!
//! let background = session.query_background(500)?;
//! let count = session.probe_color_count(500)?;
//! if let Some(color) = background {
//!     println!("{} colors on {}", count, color);
//! }
//! # Ok::<(), termquery::err::Error>(())
//! ```
//!
//!
//! # Terminal Multiplexers
//!
//! tmux and GNU screen intercept queries. With
//! [`OptionBuilder::forward`](opt::OptionBuilder::forward) enabled, a session
//! detects either multiplexer from the environment and wraps queries for
//! passthrough to the actual terminal. See [`escape`].
//!
//!
//! # Testing
//!
//! A [`Session`] is generic over the [`Device`], which makes it possible to
//! substitute the in-memory [`sim::SimulatedTerminal`] for an actual terminal.

mod api;
mod channel;
pub mod cmd;
mod color;
pub mod err;
pub mod escape;
pub mod opt;
pub mod parse;
pub mod probe;
mod session;
pub mod sim;
mod sys;
pub mod util;

pub use api::{Command, Device};
pub use color::Color;
pub use escape::Multiplexer;
pub use session::Session;
#[cfg(unix)]
pub use sys::{Config, Tty};
