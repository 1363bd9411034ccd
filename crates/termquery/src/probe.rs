//! Probing the number of indexed colors.
//!
//! Terminals answer queries for indexed colors `0..k` and ignore queries for
//! all other indexes. Hence the terminal's palette size `k` can be found with
//! a binary search over the index. Since `k` is unknown, the search first
//! doubles the index until a query fails and then bisects the interval between
//! the last successful and the first failed query. That takes `O(log k)`
//! queries, which matters because every failed query costs a round trip.

use tracing::info;

use crate::err::Result;
use crate::{Device, Session};

/// The largest index probed.
///
/// A terminal that answers for this index is assumed to have this many
/// colors.
pub const MAX_COLOR_COUNT: u32 = 1 << 24;

/// Search for the number of indexed colors.
///
/// The probe determines whether the query for the given index succeeds. It
/// must succeed exactly for the indexes below the count. This function
/// returns zero if the probe for index 0 fails. Errors returned by the probe
/// abort the search.
///
/// ```
/// # use termquery::probe::search_color_count;
/// let count = search_color_count(|index| Ok(index < 88)).unwrap();
/// assert_eq!(count, 88);
/// ```
pub fn search_color_count<F>(mut probe: F) -> Result<u32>
where
    F: FnMut(u32) -> Result<bool>,
{
    if !probe(0)? {
        return Ok(0);
    }

    // The probe succeeds for lower and fails for upper.
    let (mut lower, mut upper) = (0, 1);
    while upper < MAX_COLOR_COUNT {
        if !probe(upper)? {
            break;
        }
        lower = upper;
        upper *= 2;
    }
    if upper == MAX_COLOR_COUNT && probe(upper - 1)? {
        return Ok(MAX_COLOR_COUNT);
    }

    while 1 < upper - lower {
        let middle = lower + (upper - lower) / 2;
        if probe(middle)? {
            lower = middle;
        } else {
            upper = middle;
        }
    }

    Ok(upper)
}

impl<D: Device> Session<D> {
    /// Determine the number of indexed colors.
    ///
    /// This method issues `O(log k)` queries for a terminal with `k` colors.
    /// Failed queries are an expected part of the search and hence leave the
    /// error count unchanged, whether the search succeeds or not.
    pub fn probe_color_count(&mut self, timeout: i32) -> Result<u32> {
        let errors = self.errors;
        let count = search_color_count(|index| {
            self.query_indexed_color(index, timeout)
                .map(|color| color.is_some())
        });
        self.errors = errors;

        let count = count?;
        info!(count, "terminal::colors");
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use super::{search_color_count, MAX_COLOR_COUNT};
    use crate::err::ErrorKind;
    use crate::opt::Options;
    use crate::sim::SimulatedTerminal;
    use crate::Session;

    fn search(count: u32) -> (u32, usize) {
        let mut probes = 0;
        let result = search_color_count(|index| {
            probes += 1;
            Ok(index < count)
        })
        .expect("probe never fails");
        (result, probes)
    }

    #[test]
    fn test_search() {
        for count in [0, 1, 2, 3, 5, 16, 88, 255, 256, 257, 300, 4_096] {
            let (result, probes) = search(count);
            assert_eq!(result, count);

            // At most 2 * ceil(log2(count + 1)) + 2 probes.
            let log = u32::BITS - count.leading_zeros();
            assert!(
                probes <= 2 * log as usize + 2,
                "{} probes for {} colors",
                probes,
                count
            );
        }
    }

    #[test]
    fn test_search_bound() {
        let (result, _) = search(u32::MAX);
        assert_eq!(result, MAX_COLOR_COUNT);
        let (result, _) = search(MAX_COLOR_COUNT - 1);
        assert_eq!(result, MAX_COLOR_COUNT - 1);
    }

    #[test]
    fn test_search_error() {
        let result = search_color_count(|index| {
            if index < 8 {
                Ok(true)
            } else {
                Err(ErrorKind::Unreadable.into())
            }
        });
        assert_eq!(result.map_err(|e| e.kind()), Err(ErrorKind::Unreadable));
    }

    #[test]
    fn test_probe() -> crate::err::Result<()> {
        for count in [0, 1, 2, 16, 88, 256] {
            let terminal = SimulatedTerminal::new().with_palette_size(count);
            let mut session = Session::open(terminal, Options::default())?;

            assert_eq!(session.probe_color_count(100)?, count);
            assert_eq!(session.error_count(), 0);
        }
        Ok(())
    }

    #[test]
    fn test_probe_keeps_error_count() -> crate::err::Result<()> {
        let terminal = SimulatedTerminal::new().with_palette_size(16);
        let mut session = Session::open(terminal, Options::default())?;

        assert_eq!(session.query_indexed_color(99, 100)?, None);
        assert_eq!(session.probe_color_count(100)?, 16);
        assert_eq!(session.error_count(), 1);
        Ok(())
    }
}
