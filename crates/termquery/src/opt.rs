//! Helper module with the options for terminal query sessions.
//!
//! This module provides the options for a [`Session`](crate::Session) and the
//! corresponding builder.
//!
//!
//! # Example
//!
//! ```
//! # use termquery::opt::Options;
//! let options = Options::builder()
//!     .timeout(250)
//!     .forward(true)
//!     .build();
//!
//! assert_eq!(options.timeout(), 250);
//! assert!(options.forward());
//! ```

#[derive(Clone, Debug)]
struct OptionData {
    timeout: i32,
    flush: bool,
    forward: bool,
    read_buffer_size: usize,
    pathological_size: usize,
}

impl OptionData {
    pub const fn new() -> Self {
        Self {
            timeout: -1,
            flush: true,
            forward: false,
            read_buffer_size: 4_096,
            pathological_size: 65_536,
        }
    }
}

/// A builder of options objects.
#[derive(Debug)]
pub struct OptionBuilder(OptionData);

impl OptionBuilder {
    /// Set the default timeout in milliseconds.
    ///
    /// A negative timeout waits indefinitely.
    pub fn timeout(&mut self, timeout: i32) -> &mut Self {
        self.0.timeout = timeout;
        self
    }

    /// Set whether to discard stale input before each query.
    pub fn flush(&mut self, flush: bool) -> &mut Self {
        self.0.flush = flush;
        self
    }

    /// Set whether to forward queries through a terminal multiplexer.
    ///
    /// Forwarding only takes effect if the environment indicates a tmux or GNU
    /// screen session.
    pub fn forward(&mut self, forward: bool) -> &mut Self {
        self.0.forward = forward;
        self
    }

    /// Set the read buffer size.
    ///
    /// This method ensures that the pathological size is at least double the
    /// given size, updating it if necessary.
    pub fn read_buffer_size(&mut self, size: usize) -> &mut Self {
        self.0.read_buffer_size = size.max(1);
        self.0.pathological_size = self
            .0
            .pathological_size
            .max(self.0.read_buffer_size.saturating_add(self.0.read_buffer_size));
        self
    }

    /// Set the minimum length for pathological replies.
    ///
    /// This method ensures that the given size is at least double the read
    /// buffer size, updating it if necessary.
    pub fn pathological_size(&mut self, size: usize) -> &mut Self {
        self.0.pathological_size = size.max(
            self.0
                .read_buffer_size
                .saturating_add(self.0.read_buffer_size),
        );
        self
    }

    /// Instantiate the options.
    pub fn build(&self) -> Options {
        Options(self.0.clone())
    }
}

/// An options object.
#[derive(Clone, Debug)]
pub struct Options(OptionData);

impl Default for Options {
    fn default() -> Self {
        Options(OptionData::new())
    }
}

impl Options {
    /// Create a new builder with the default option values.
    pub fn builder() -> OptionBuilder {
        OptionBuilder(OptionData::new())
    }

    /// Instantiate the default options but with the given timeout.
    pub fn with_timeout(timeout: i32) -> Options {
        Self::builder().timeout(timeout).build()
    }

    /// Get the default timeout in milliseconds.
    pub fn timeout(&self) -> i32 {
        self.0.timeout
    }

    /// Determine whether stale input is discarded before each query.
    pub fn flush(&self) -> bool {
        self.0.flush
    }

    /// Determine whether queries should be forwarded through a multiplexer.
    pub fn forward(&self) -> bool {
        self.0.forward
    }

    /// Get the size of each read.
    pub fn read_buffer_size(&self) -> usize {
        self.0.read_buffer_size
    }

    /// Get the pathological size.
    pub fn pathological_size(&self) -> usize {
        self.0.pathological_size
    }
}

#[cfg(test)]
mod test {
    use super::Options;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.timeout(), -1);
        assert!(options.flush());
        assert!(!options.forward());
        assert_eq!(options.read_buffer_size(), 4_096);
        assert_eq!(options.pathological_size(), 65_536);
        assert_eq!(Options::with_timeout(100).timeout(), 100);
    }

    #[test]
    fn test_sizes_stay_consistent() {
        let options = Options::builder()
            .pathological_size(10)
            .read_buffer_size(100_000)
            .build();
        assert_eq!(options.read_buffer_size(), 100_000);
        assert_eq!(options.pathological_size(), 200_000);

        let options = Options::builder().read_buffer_size(16).pathological_size(8).build();
        assert_eq!(options.pathological_size(), 32);
    }
}
