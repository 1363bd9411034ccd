use tracing::{debug, trace, warn};

use crate::cmd::{DynRequestColor, RequestColor, RequestCursorPosition};
use crate::err::{Error, ErrorKind, Result};
use crate::parse::{match_guard_after, parse_color, MAX_GUARD_LEN};
use crate::sys::retry;
use crate::util::nicely_str;
use crate::{Color, Command, Device, Session};

impl<D: Device> Session<D> {
    /// Write the query followed by the guard and read the reply.
    ///
    /// This method appends the cursor position request as guard, wraps both
    /// for the multiplexer if any, writes them, and then reads until the
    /// guard's reply arrives. It returns the bytes preceding the guard's reply,
    /// i.e., the reply to the actual query, which may well be empty.
    ///
    /// The timeout applies to each wait for more input, not to the query as a
    /// whole. Zero checks for input without waiting, and a negative timeout
    /// waits indefinitely.
    ///
    /// Timeouts and pathologically long replies increment the error count.
    pub fn guarded_query(&mut self, query: &[u8], timeout: i32) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if self.options.flush() {
            self.drain()?;
        }

        let mut request = query.to_vec();
        request.extend_from_slice(RequestCursorPosition.to_string().as_bytes());
        if let Some(multiplexer) = self.multiplexer {
            request = multiplexer.wrap(&request);
        }

        debug!(query = %nicely_str(&request), "terminal::write");
        self.device.write_all(&request)?;
        self.device.flush()?;

        let mut reply = Vec::new();
        loop {
            if !retry(|| self.device.poll(timeout))? {
                self.errors += 1;
                warn!(
                    timeout,
                    partial = %nicely_str(&reply),
                    "terminal did not reply in time"
                );
                return Err(ErrorKind::Timeout.into());
            }

            let count = retry(|| self.device.read(&mut self.chunk))?;
            if count == 0 {
                return Err(Error::unreadable(std::io::ErrorKind::UnexpectedEof.into()));
            }

            trace!(bytes = %nicely_str(&self.chunk[..count]), "terminal::read");
            let offset = reply.len().saturating_sub(MAX_GUARD_LEN);
            reply.extend_from_slice(&self.chunk[..count]);

            if let Some(guard) = match_guard_after(&reply, offset) {
                reply.truncate(guard.prefix);
                debug!(reply = %nicely_str(&reply), "terminal::reply");
                return Ok(reply);
            }

            if self.options.pathological_size() <= reply.len() {
                self.errors += 1;
                warn!(length = reply.len(), "terminal reply without guard");
                return Err(ErrorKind::PathologicalResponse.into());
            }
        }
    }

    /// Query for a color and parse the reply.
    ///
    /// Unlike [`Session::rgb_query`], this method reports recoverable errors as
    /// errors. They still count.
    pub fn try_color_query<C: Command>(&mut self, query: C, timeout: i32) -> Result<Color> {
        let reply = self.guarded_query(query.to_string().as_bytes(), timeout)?;

        parse_color(&reply).ok_or_else(|| {
            self.errors += 1;
            warn!(query = ?query, reply = %nicely_str(&reply), "terminal reply is not a color");
            ErrorKind::Unparseable.into()
        })
    }

    fn color_query<C: Command>(&mut self, query: C, timeout: i32) -> Result<Option<Color>> {
        match self.try_color_query(query, timeout) {
            Ok(color) => Ok(Some(color)),
            Err(err) if err.is_recoverable() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Query for the color with the given operating system command parameters.
    ///
    /// For example, `[4, 1]` queries indexed color 1 and `[10]` queries the
    /// default foreground color. This method returns `None` if the terminal
    /// does not reply in time or if the reply is not a color. Both cases
    /// increment the error count. All other errors are returned as errors.
    pub fn rgb_query(&mut self, params: &[u32], timeout: i32) -> Result<Option<Color>> {
        self.color_query(DynRequestColor(params), timeout)
    }

    /// Query for the indexed color.
    pub fn query_indexed_color(&mut self, index: u32, timeout: i32) -> Result<Option<Color>> {
        self.color_query(RequestColor::Indexed(index), timeout)
    }

    /// Query for the default foreground color.
    pub fn query_foreground(&mut self, timeout: i32) -> Result<Option<Color>> {
        self.color_query(RequestColor::Foreground, timeout)
    }

    /// Query for the default background color.
    pub fn query_background(&mut self, timeout: i32) -> Result<Option<Color>> {
        self.color_query(RequestColor::Background, timeout)
    }

    /// Query for the indexed colors, starting with index 0.
    ///
    /// This method stops with the first failed query or after the limit. When
    /// called without limit, it expects the query past the last color to fail
    /// and hence does not count that failure.
    pub fn query_indexed_colors(&mut self, limit: Option<u32>, timeout: i32) -> Result<Vec<Color>> {
        let mut colors = Vec::new();

        for index in 0..limit.unwrap_or(u32::MAX) {
            match self.query_indexed_color(index, timeout)? {
                Some(color) => colors.push(color),
                None => {
                    if limit.is_none() {
                        self.errors = self.errors.saturating_sub(1);
                    }
                    break;
                }
            }
        }

        Ok(colors)
    }
}

#[cfg(test)]
mod test {
    use crate::err::ErrorKind;
    use crate::escape::Multiplexer;
    use crate::opt::Options;
    use crate::sim::SimulatedTerminal;
    use crate::{Color, Session};

    #[test]
    fn test_foreground_and_background() -> crate::err::Result<()> {
        let terminal = SimulatedTerminal::new()
            .with_foreground(Color::new(1.0, 1.0, 1.0))
            .with_background(Color::new(0.0, 0.0, 0.0));
        let mut session = Session::open(terminal, Options::default())?;

        assert_eq!(session.query_foreground(100)?, Some(Color::new(1.0, 1.0, 1.0)));
        assert_eq!(session.query_background(100)?, Some(Color::new(0.0, 0.0, 0.0)));
        assert_eq!(session.rgb_query(&[11], 100)?, Some(Color::new(0.0, 0.0, 0.0)));
        assert_eq!(session.error_count(), 0);
        Ok(())
    }

    #[test]
    fn test_guarded_query_prefix() -> crate::err::Result<()> {
        let mut session = Session::open(SimulatedTerminal::new(), Options::default())?;

        // The terminal ignores the unknown query and answers the guard only.
        let reply = session.guarded_query(b"\x1b[>q", 100)?;
        assert!(reply.is_empty());

        let reply = session.guarded_query(b"\x1b]4;3;?\x07", 100)?;
        assert!(reply.starts_with(b"\x1b]4;3;rgb:"));
        assert_eq!(session.error_count(), 0);
        Ok(())
    }

    #[test]
    fn test_unparseable_and_timeout() -> crate::err::Result<()> {
        let terminal = SimulatedTerminal::new().with_palette_size(16);
        let mut session = Session::open(terminal, Options::default())?;

        // Index 16 is out of range, so the reply is empty.
        assert_eq!(session.query_indexed_color(16, 100)?, None);
        assert_eq!(session.error_count(), 1);

        let error = session
            .try_color_query(crate::cmd::RequestColor::Indexed(17), 100)
            .expect_err("reply is empty");
        assert_eq!(error.kind(), ErrorKind::Unparseable);
        assert_eq!(session.error_count(), 2);

        let mut session = Session::open(
            SimulatedTerminal::new().without_guard_reply(),
            Options::default(),
        )?;
        assert_eq!(session.query_indexed_color(0, 0)?, None);
        assert_eq!(session.error_count(), 1);
        Ok(())
    }

    #[test]
    fn test_byte_by_byte() -> crate::err::Result<()> {
        let terminal = SimulatedTerminal::new()
            .with_chunks(vec![1])
            .with_stale_input(b"\x1b[7;7R");
        let options = Options::builder().flush(false).build();
        let mut session = Session::open(terminal, options)?;

        // The stale guard reply completes the first query with an empty reply.
        assert_eq!(session.guarded_query(b"", 100)?, b"");
        // Its own guard reply remains and is flushed by the next query.
        session.flush_input()?;

        let reply = session.guarded_query(b"\x1b]4;200;?\x07", 100)?;
        assert_eq!(reply, b"\x1b]4;200;rgb:ad2c/f170/35b4\x07");
        assert_eq!(
            crate::parse::parse_color(&reply),
            Some(SimulatedTerminal::palette_color(200))
        );
        Ok(())
    }

    #[test]
    fn test_pathological() -> crate::err::Result<()> {
        let options = Options::builder()
            .read_buffer_size(8)
            .pathological_size(16)
            .flush(false)
            .build();
        let terminal = SimulatedTerminal::new().with_stale_input(&[b'x'; 64]);
        let mut session = Session::open(terminal, options)?;

        let error = session
            .guarded_query(b"", 100)
            .expect_err("reply is too long");
        assert_eq!(error.kind(), ErrorKind::PathologicalResponse);
        assert_eq!(session.error_count(), 1);
        Ok(())
    }

    #[test]
    fn test_indexed_colors() -> crate::err::Result<()> {
        let terminal = SimulatedTerminal::new().with_palette_size(16);
        let mut session = Session::open(terminal, Options::default())?;

        let colors = session.query_indexed_colors(None, 100)?;
        assert_eq!(colors.len(), 16);
        assert_eq!(colors[5], SimulatedTerminal::palette_color(5));
        assert_eq!(session.error_count(), 0);

        let colors = session.query_indexed_colors(Some(4), 100)?;
        assert_eq!(colors.len(), 4);

        let colors = session.query_indexed_colors(Some(20), 100)?;
        assert_eq!(colors.len(), 16);
        assert_eq!(session.error_count(), 1);
        Ok(())
    }

    #[test]
    fn test_forwarding() -> crate::err::Result<()> {
        for multiplexer in [Multiplexer::Tmux, Multiplexer::Screen] {
            let terminal = SimulatedTerminal::new().with_multiplexer(multiplexer);
            let mut session = Session::open(terminal, Options::default())?;

            // Without passthrough, the multiplexer answers the guard only.
            assert_eq!(session.query_indexed_color(1, 100)?, None);

            let mut session = session.with_multiplexer(Some(multiplexer));
            assert_eq!(
                session.query_indexed_color(1, 100)?,
                Some(SimulatedTerminal::palette_color(1))
            );
            assert_eq!(session.error_count(), 1);
        }
        Ok(())
    }

    #[test]
    fn test_closed() -> crate::err::Result<()> {
        let mut session = Session::open(SimulatedTerminal::new(), Options::default())?;
        session.close()?;

        let error = session.query_foreground(100).expect_err("session is closed");
        assert_eq!(error.kind(), ErrorKind::Uninitialized);
        assert_eq!(session.error_count(), 0);
        Ok(())
    }
}
