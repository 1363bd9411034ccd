use std::io::{Read, Result, Write};

/// A command for the terminal.
///
/// Commands are communicated in-band by writing ANSI escape codes. Doing so is
/// the responsibility of the [`std::fmt::Display`] implementation, whereas the
/// [`std::fmt::Debug`] implementation should simply identify the command.
///
/// This trait is object-safe.
pub trait Command: std::fmt::Debug + std::fmt::Display {}

/// A borrowed command is a command.
impl<C: Command + ?Sized> Command for &C {}

/// A boxed command is a command.
impl<C: Command + ?Sized> Command for Box<C> {}

// ------------------------------------------------------------------------------------------------

/// A terminal device.
///
/// A device combines byte-level input and output with the terminal
/// attributes and a readiness check. A [`Session`](crate::Session) needs
/// nothing else to put the terminal into query mode, issue queries, and
/// restore the terminal again. [`Tty`](crate::Tty) implements this trait for
/// actual terminals, whereas [`SimulatedTerminal`](crate::sim::SimulatedTerminal)
/// implements it in memory.
///
/// Reads must not block. That is, when no input is available, `read` returns
/// zero bytes. The only blocking operation is [`Device::poll`].
pub trait Device: Read + Write {
    /// The terminal attributes.
    type Attributes: Clone + PartialEq + std::fmt::Debug;

    /// Read the current attributes.
    fn attributes(&self) -> Result<Self::Attributes>;

    /// Write the attributes, effective immediately.
    fn set_attributes(&mut self, attributes: &Self::Attributes) -> Result<()>;

    /// Derive the attributes for issuing queries.
    ///
    /// The derived attributes disable echo and line-buffered input and make
    /// reads non-blocking, i.e., they require no minimum number of bytes and
    /// use no inter-byte timer. Everything else stays the same.
    fn query_attributes(&self, saved: &Self::Attributes) -> Self::Attributes;

    /// Wait for input.
    ///
    /// This method waits up to the given number of milliseconds for input to
    /// become available, returning `true` if it has. A zero timeout checks
    /// without waiting, a negative timeout waits indefinitely.
    fn poll(&mut self, timeout: i32) -> Result<bool>;
}

/// A mutably borrowed device is a device.
impl<D: Device + ?Sized> Device for &mut D {
    type Attributes = D::Attributes;

    fn attributes(&self) -> Result<Self::Attributes> {
        (**self).attributes()
    }

    fn set_attributes(&mut self, attributes: &Self::Attributes) -> Result<()> {
        (**self).set_attributes(attributes)
    }

    fn query_attributes(&self, saved: &Self::Attributes) -> Self::Attributes {
        (**self).query_attributes(saved)
    }

    fn poll(&mut self, timeout: i32) -> Result<bool> {
        (**self).poll(timeout)
    }
}

fn _assert_command_is_object_safe() {
    fn is_object_safe<T: ?Sized>() {}

    is_object_safe::<dyn Command>();
}
