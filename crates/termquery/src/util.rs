//! Helper module with utilities for byte strings.

use std::fmt;

/// Nicely format a byte.
fn format_nicely<W>(byte: u8, output: &mut W) -> Result<(), fmt::Error>
where
    W: fmt::Write + ?Sized,
{
    if (0x20..=0x7e).contains(&byte) {
        return output.write_char(byte as char);
    }

    // Mnemonics use math sans-serif letters, with at least one letter that is
    // not a hexadecimal digit.
    let replacement = match byte {
        0x00 => "‹𝗇𝗎𝗅›",
        0x07 => "‹𝖻𝖾𝗅›",
        0x08 => "‹𝖻s›",
        0x09 => "‹𝗁𝗍›",
        0x0a => "‹𝗅𝖿›",
        0x0d => "‹𝖼𝗋›",
        0x1b => "‹𝖾𝗌𝖼›",
        0x7f => "‹𝖽𝖾𝗅›",
        0x90 => "‹𝖽𝖼𝗌›",
        0x9b => "‹𝖼𝗌𝗂›",
        0x9c => "‹𝗌𝗍›",
        0x9d => "‹𝗈𝗌𝖼›",
        _ => "",
    };

    if replacement.is_empty() {
        output.write_fmt(format_args!("‹{:02x}›", byte))
    } else {
        output.write_str(replacement)
    }
}

/// A newtype for nicely formatting a byte slice.
struct ByteStringNicely<'a>(&'a [u8]);

impl std::fmt::Display for ByteStringNicely<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("\"")?;
        for byte in self.0.iter() {
            if *byte == b'"' {
                f.write_str("\\\"")?;
            } else {
                format_nicely(*byte, f)?;
            }
        }
        f.write_str("\"")
    }
}

impl std::fmt::Debug for ByteStringNicely<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Turn the slice into a value that displays nicely.
///
/// Printable ASCII displays as is, common controls as mnemonics such as
/// `‹𝖾𝗌𝖼›`, and all other bytes as two-digit hexadecimal numbers. Query
/// diagnostics rely on this function to keep escape sequences out of the log.
///
/// ```
/// # use termquery::util::nicely_str;
/// assert_eq!(
///     format!("{}", nicely_str(b"\x1b[6n")),
///     "\"‹𝖾𝗌𝖼›[6n\""
/// );
/// ```
pub fn nicely_str(bytes: &[u8]) -> impl std::fmt::Debug + std::fmt::Display + '_ {
    ByteStringNicely(bytes)
}

// ------------------------------------------------------------------------------------------------

/// A choice of radix for converting byte slices to integers.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Radix {
    Decimal = 10,
    Hexadecimal = 16,
}

impl Radix {
    /// Determine whether the byte is a digit in this radix.
    pub const fn is_digit(&self, byte: u8) -> bool {
        match self {
            Radix::Decimal => byte.is_ascii_digit(),
            Radix::Hexadecimal => byte.is_ascii_hexdigit(),
        }
    }

    /// Count the leading digits of the byte slice.
    pub fn count_digits(&self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|b| self.is_digit(**b)).count()
    }

    /// Parse the byte slice, which must consist of digits only.
    ///
    /// This method returns `None` if the slice is empty, contains a non-digit,
    /// or overflows.
    pub fn parse(&self, bytes: &[u8]) -> Option<u64> {
        if bytes.is_empty() {
            return None;
        }

        let mut result: u64 = 0;
        for byte in bytes {
            let digit = (*byte as char).to_digit(*self as u32)?;
            result = result
                .checked_mul(*self as u64)?
                .checked_add(digit as u64)?;
        }

        Some(result)
    }
}
