#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use self::unix::{Config, Tty};

use std::io::{Error, ErrorKind, Result};

/// The status code of a libc call, which signals failure with -1.
pub(crate) trait Status: Copy + PartialEq {
    /// The failure value.
    const FAILURE: Self;

    /// Turn the status into a result, capturing `errno` on failure.
    #[inline]
    fn check(self) -> Result<Self> {
        if self == Self::FAILURE {
            Err(Error::last_os_error())
        } else {
            Ok(self)
        }
    }
}

impl Status for i32 {
    const FAILURE: Self = -1;
}

impl Status for isize {
    const FAILURE: Self = -1;
}

/// Repeat the system call for as long as it is interrupted.
pub(crate) fn retry<T, F>(mut call: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    loop {
        match call() {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
