use std::ffi::c_void;
use std::fs::OpenOptions;
use std::io::{Read, Result, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::ptr::{from_mut, from_ref};

use super::{retry, Status};
use crate::Device;

// ----------------------------------------------------------------------------------------------------------

#[derive(Debug)]
enum TtyHandle {
    Owned(OwnedFd),
    Borrowed(RawFd),
}

impl TtyHandle {
    fn fd(&self) -> RawFd {
        match self {
            Self::Owned(handle) => handle.as_raw_fd(),
            Self::Borrowed(fd) => *fd,
        }
    }
}

/// A terminal device identified by a POSIX file descriptor.
///
/// The same descriptor serves for reading replies and writing queries. A tty
/// either borrows a descriptor owned by someone else, usually standard input,
/// or owns the descriptor for the process's controlling terminal.
#[derive(Debug)]
pub struct Tty {
    handle: TtyHandle,
}

impl Tty {
    /// Access the terminal through standard input, i.e., file descriptor 0.
    ///
    /// This is almost always the right choice when running in a terminal.
    pub fn stdin() -> Self {
        Self::with_fd(libc::STDIN_FILENO)
    }

    /// Access the terminal through the given file descriptor.
    ///
    /// The descriptor must remain open for the lifetime of the tty.
    pub fn with_fd(fd: RawFd) -> Self {
        Self {
            handle: TtyHandle::Borrowed(fd),
        }
    }

    /// Open the process's controlling terminal.
    ///
    /// This works even when standard input has been redirected.
    pub fn open() -> Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")?
            .into();

        Ok(Self {
            handle: TtyHandle::Owned(fd),
        })
    }

    /// Get the file descriptor.
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.handle.fd()
    }
}

impl Read for Tty {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        // SAFETY: The buffer is valid for writes of its length.
        let count = unsafe {
            libc::read(
                self.fd(),
                buf.as_mut_ptr().cast::<c_void>(),
                buf.len() as libc::size_t,
            )
        }
        .check()?;
        Ok(count as usize)
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        // SAFETY: The buffer is valid for reads of its length.
        let count = unsafe {
            libc::write(
                self.fd(),
                buf.as_ptr().cast::<c_void>(),
                buf.len() as libc::size_t,
            )
        }
        .check()?;
        Ok(count as usize)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Device for Tty {
    type Attributes = Config;

    fn attributes(&self) -> Result<Config> {
        let mut state = std::mem::MaybeUninit::uninit();
        // SAFETY: tcgetattr fully initializes the termios struct on success.
        unsafe { libc::tcgetattr(self.fd(), state.as_mut_ptr()) }.check()?;
        Ok(Config {
            // SAFETY: The call succeeded.
            state: unsafe { state.assume_init() },
        })
    }

    fn set_attributes(&mut self, attributes: &Config) -> Result<()> {
        // SAFETY: The termios struct was initialized by tcgetattr.
        unsafe { libc::tcsetattr(self.fd(), libc::TCSANOW, from_ref(&attributes.state)) }
            .check()?;
        Ok(())
    }

    fn query_attributes(&self, saved: &Config) -> Config {
        let mut state = saved.state;
        state.c_lflag &= !(libc::ECHO | libc::ICANON);
        state.c_cc[libc::VMIN] = 0;
        state.c_cc[libc::VTIME] = 0;
        Config { state }
    }

    fn poll(&mut self, timeout: i32) -> Result<bool> {
        let mut fds = libc::pollfd {
            fd: self.fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout = if timeout < 0 { -1 } else { timeout };

        let ready = retry(|| {
            // SAFETY: The pointer refers to exactly one valid pollfd.
            unsafe { libc::poll(from_mut(&mut fds), 1, timeout) }.check()
        })?;
        Ok(0 < ready)
    }
}

// ----------------------------------------------------------------------------------------------------------

/// A terminal configuration, i.e., the termios attributes.
#[derive(Clone, Copy)]
pub struct Config {
    state: libc::termios,
}

impl Config {
    fn speeds(&self) -> (libc::speed_t, libc::speed_t) {
        // SAFETY: Both functions only read from the initialized struct.
        unsafe {
            (
                libc::cfgetispeed(from_ref(&self.state)),
                libc::cfgetospeed(from_ref(&self.state)),
            )
        }
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.state.c_iflag == other.state.c_iflag
            && self.state.c_oflag == other.state.c_oflag
            && self.state.c_cflag == other.state.c_cflag
            && self.state.c_lflag == other.state.c_lflag
            && self.state.c_cc == other.state.c_cc
            && self.speeds() == other.speeds()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut flags = Vec::new();

        for (name, value) in [
            ("ECHO", libc::ECHO),
            ("ECHOE", libc::ECHOE),
            ("ECHOK", libc::ECHOK),
            ("ECHONL", libc::ECHONL),
            ("ICANON", libc::ICANON),
            ("IEXTEN", libc::IEXTEN),
            ("ISIG", libc::ISIG),
        ] {
            if self.state.c_lflag & value != 0 {
                flags.push(name);
            }
        }

        f.debug_struct("Config")
            .field("lflags", &flags)
            .field("vmin", &self.state.c_cc[libc::VMIN])
            .field("vtime", &self.state.c_cc[libc::VTIME])
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::Tty;
    use crate::Device;
    use std::io::{Read, Write};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    fn pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0; 2];
        // SAFETY: The array has room for both file descriptors.
        let status = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(status, 0, "pipe() should succeed");
        // SAFETY: pipe() just opened both descriptors, and nothing else owns them.
        let reader = unsafe { OwnedFd::from_raw_fd(fds[0]) };
        // SAFETY: See above.
        let writer = unsafe { OwnedFd::from_raw_fd(fds[1]) };
        (reader, writer)
    }

    #[test]
    fn test_borrowed_fd() -> std::io::Result<()> {
        let (reader, writer) = pipe();
        let mut input = Tty::with_fd(reader.as_raw_fd());
        let mut output = Tty::with_fd(writer.as_raw_fd());
        assert_eq!(input.fd(), reader.as_raw_fd());

        assert!(!input.poll(0)?);
        output.write_all(b"\x1b[6n")?;
        output.flush()?;
        assert!(input.poll(100)?);

        let mut buffer = [0; 16];
        let count = input.read(&mut buffer)?;
        assert_eq!(&buffer[..count], b"\x1b[6n");
        assert!(!input.poll(0)?);

        // A pipe is not a terminal.
        let error = input.attributes().expect_err("pipe has no attributes");
        assert_eq!(error.raw_os_error(), Some(libc::ENOTTY));
        Ok(())
    }
}
