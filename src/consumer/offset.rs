//! Starting-offset resolution

use std::fmt;

/// Caller-supplied offset specification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetSpec {
    /// Start from the beginning of the log
    Earliest,
    /// The last `limit` records currently in each partition
    #[default]
    Latest,
    /// An explicit offset
    Exact(i64),
    /// Only records produced after the call
    End,
}

impl OffsetSpec {
    /// Parse an offset specification.
    ///
    /// `"earliest"` and `"latest"` are matched exactly. A string made only of
    /// ASCII digits is an explicit offset. Anything else, including offsets
    /// too large for the broker's offset type, means end-of-log.
    pub fn parse(spec: &str) -> Self {
        match spec {
            "earliest" => OffsetSpec::Earliest,
            "latest" => OffsetSpec::Latest,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                digits.parse().map(OffsetSpec::Exact).unwrap_or(OffsetSpec::End)
            }
            _ => OffsetSpec::End,
        }
    }

    /// Whether resolution needs the partition watermarks
    pub fn needs_watermarks(&self) -> bool {
        matches!(self, OffsetSpec::Latest)
    }

    /// Resolve to a concrete starting point.
    ///
    /// `watermarks` is `(low, high)` and only consulted for [`OffsetSpec::Latest`].
    pub fn resolve(&self, watermarks: Option<(i64, i64)>, limit: usize) -> StartOffset {
        match self {
            OffsetSpec::Earliest => StartOffset::Beginning,
            OffsetSpec::Exact(offset) => StartOffset::At(*offset),
            OffsetSpec::End => StartOffset::End,
            OffsetSpec::Latest => match watermarks {
                Some((low, high)) => last_records(low, high, limit),
                None => StartOffset::Beginning,
            },
        }
    }
}

impl fmt::Display for OffsetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetSpec::Earliest => f.write_str("earliest"),
            OffsetSpec::Latest => f.write_str("latest"),
            OffsetSpec::Exact(offset) => write!(f, "{}", offset),
            OffsetSpec::End => f.write_str("end"),
        }
    }
}

/// A resolved starting position within one partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOffset {
    Beginning,
    End,
    At(i64),
}

/// Offset of the last `limit` records, `max(low, high - limit)`.
///
/// An empty partition (`high <= 0`) and a window reaching past the low
/// watermark both start from the beginning of the log.
pub fn last_records(low: i64, high: i64, limit: usize) -> StartOffset {
    if high <= 0 {
        return StartOffset::Beginning;
    }
    let window = i64::try_from(limit).unwrap_or(i64::MAX);
    let start = high.saturating_sub(window);
    if start < low {
        StartOffset::Beginning
    } else {
        StartOffset::At(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_specs() {
        assert_eq!(OffsetSpec::parse("earliest"), OffsetSpec::Earliest);
        assert_eq!(OffsetSpec::parse("latest"), OffsetSpec::Latest);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(OffsetSpec::parse("EARLIEST"), OffsetSpec::End);
        assert_eq!(OffsetSpec::parse("Latest"), OffsetSpec::End);
    }

    #[test]
    fn test_parse_digits() {
        assert_eq!(OffsetSpec::parse("0"), OffsetSpec::Exact(0));
        assert_eq!(OffsetSpec::parse("0042"), OffsetSpec::Exact(42));
    }

    #[test]
    fn test_parse_other_means_end() {
        for spec in ["", "-1", "+5", "1.5", "12a", "now", "99999999999999999999999"] {
            assert_eq!(OffsetSpec::parse(spec), OffsetSpec::End, "spec {:?}", spec);
        }
    }

    #[test]
    fn test_last_records_window() {
        assert_eq!(last_records(0, 100, 5), StartOffset::At(95));
        assert_eq!(last_records(0, 5, 5), StartOffset::At(0));
        assert_eq!(last_records(90, 100, 5), StartOffset::At(95));
    }

    #[test]
    fn test_last_records_short_partition() {
        assert_eq!(last_records(0, 4, 5), StartOffset::Beginning);
        assert_eq!(last_records(3, 6, 5), StartOffset::Beginning);
    }

    #[test]
    fn test_last_records_empty_partition() {
        assert_eq!(last_records(0, 0, 10), StartOffset::Beginning);
    }

    #[test]
    fn test_last_records_huge_limit() {
        assert_eq!(last_records(0, 10, usize::MAX), StartOffset::Beginning);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(OffsetSpec::Earliest.resolve(None, 10), StartOffset::Beginning);
        assert_eq!(OffsetSpec::End.resolve(Some((0, 50)), 10), StartOffset::End);
        assert_eq!(OffsetSpec::Exact(7).resolve(None, 10), StartOffset::At(7));
        assert_eq!(OffsetSpec::Latest.resolve(Some((0, 50)), 10), StartOffset::At(40));
    }
}
