use tracing::{debug, warn};

use crate::err::{Error, ErrorKind, Result};
use crate::escape::Multiplexer;
use crate::opt::Options;
use crate::sys::retry;
use crate::Device;

#[cfg(unix)]
use crate::Tty;

/// A terminal query session.
///
/// A session temporarily puts the terminal into query mode, i.e., it disables
/// echo and line-buffered input and makes reads non-blocking. Opening a
/// session takes a snapshot of the terminal attributes, applies the query
/// mode, and reads the attributes back to verify that the terminal honored
/// the change. If it did not, the session restores the snapshot and fails with
/// [`ErrorKind::SetupFailure`].
///
/// Closing the session discards pending input and restores the snapshot. That
/// happens exactly once, either through an explicit [`Session::close`] or
/// when the session is dropped, no matter whether the code using the session
/// completed normally, returned early, or failed. Once closed, every query
/// fails with [`ErrorKind::Uninitialized`].
///
/// Sessions also keep count of failed queries. Timeouts and unparseable
/// replies do not abort a run. Instead, queries return no value and the
/// [`Session::error_count`] tells the caller afterwards how many results are
/// missing.
///
/// A session is not safe for concurrent use. Its methods take `&mut self`,
/// which rules out overlapping queries.
pub struct Session<D: Device> {
    pub(crate) device: D,
    pub(crate) options: Options,
    pub(crate) saved: Option<D::Attributes>,
    pub(crate) multiplexer: Option<Multiplexer>,
    pub(crate) errors: usize,
    pub(crate) chunk: Vec<u8>,
}

#[cfg(unix)]
impl Session<Tty> {
    /// Open a session on standard input.
    pub fn with_stdin(options: Options) -> Result<Self> {
        Self::open(Tty::stdin(), options)
    }

    /// Open a session on the process's controlling terminal.
    pub fn with_tty(options: Options) -> Result<Self> {
        let tty = Tty::open().map_err(Error::setup)?;
        Self::open(tty, options)
    }
}

impl<D: Device> Session<D> {
    /// Open a session on the given device.
    ///
    /// If the options request forwarding, this method also detects a
    /// surrounding tmux or GNU screen session.
    pub fn open(mut device: D, options: Options) -> Result<Self> {
        let saved = device.attributes().map_err(Error::setup)?;
        let requested = device.query_attributes(&saved);

        let verified = device
            .set_attributes(&requested)
            .and_then(|()| device.attributes())
            .map(|actual| actual == requested);
        match verified {
            Ok(true) => {}
            Ok(false) => {
                warn!(?saved, ?requested, "terminal did not enter query mode");
                device.set_attributes(&saved).map_err(Error::setup)?;
                return Err(ErrorKind::SetupFailure.into());
            }
            Err(err) => {
                warn!(?err, "could not configure terminal");
                let _ = device.set_attributes(&saved);
                return Err(Error::setup(err));
            }
        }

        let multiplexer = if options.forward() {
            Multiplexer::detect()
        } else {
            None
        };
        debug!(?saved, ?multiplexer, "terminal::open");

        let chunk = vec![0; options.read_buffer_size()];
        Ok(Self {
            device,
            options,
            saved: Some(saved),
            multiplexer,
            errors: 0,
            chunk,
        })
    }

    /// Override the multiplexer for forwarding queries.
    ///
    /// `None` disables forwarding, independent of the options.
    #[must_use]
    pub fn with_multiplexer(mut self, multiplexer: Option<Multiplexer>) -> Self {
        self.multiplexer = multiplexer;
        self
    }

    /// Get the options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get the multiplexer queries are forwarded through.
    pub fn multiplexer(&self) -> Option<Multiplexer> {
        self.multiplexer
    }

    /// Get the device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Determine whether this session is open.
    pub fn is_open(&self) -> bool {
        self.saved.is_some()
    }

    /// Get the number of failed queries.
    ///
    /// Capability probing does not affect this count.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ErrorKind::Uninitialized.into())
        }
    }

    /// Discard all input that can be read right now.
    ///
    /// This is best effort only. A reply to an earlier query may still arrive
    /// afterwards.
    pub fn flush_input(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.drain()
    }

    pub(crate) fn drain(&mut self) -> Result<()> {
        let mut discarded = 0;
        while retry(|| self.device.poll(0))? {
            let count = retry(|| self.device.read(&mut self.chunk))?;
            if count == 0 {
                break;
            }
            discarded += count;
        }

        if 0 < discarded {
            debug!(discarded, "terminal::flush");
        }
        Ok(())
    }

    /// Close this session.
    ///
    /// This method discards pending input and restores the terminal
    /// attributes. It does nothing if the session already is closed. Even if
    /// discarding input fails, the attributes are restored.
    pub fn close(&mut self) -> Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };

        let drained = self.drain();
        let restored = self.device.set_attributes(&saved);
        debug!(errors = self.errors, "terminal::close");

        drained?;
        restored?;
        Ok(())
    }
}

impl<D: Device> Drop for Session<D> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl<D: Device> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("multiplexer", &self.multiplexer)
            .field("errors", &self.errors)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
