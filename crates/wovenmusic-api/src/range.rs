//! HTTP Range header parsing for audio streaming.
//!
//! Only single `bytes=start-end` ranges are supported; that is what media
//! elements send. Anything else falls back to a full 200 response rather
//! than a 416, which keeps playback working in every client we have seen.

/// A resolved byte range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered; never zero since both ends are inclusive.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a `bytes=start-end` header value. The end is optional
/// (`bytes=500-` means "from 500 to the end").
fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.trim().strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;
    let start: u64 = start_str.trim().parse().ok()?;
    let end = match end_str.trim() {
        "" => None,
        s => Some(s.parse::<u64>().ok()?),
    };
    if let Some(end) = end {
        if end < start {
            return None;
        }
    }
    Some((start, end))
}

/// Resolve a Range header against the object's total size.
///
/// Returns `None` when the header is absent, malformed, or unsatisfiable
/// (start beyond the last byte); callers then serve the full object with
/// a 200. The end is clamped to `total - 1`.
pub fn resolve_range(header: Option<&str>, total: u64) -> Option<ByteRange> {
    let (start, end) = parse_range_header(header?)?;
    if total == 0 || start >= total {
        return None;
    }
    let end = end.map_or(total - 1, |e| e.min(total - 1));
    Some(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_prefix_range() {
        let range = resolve_range(Some("bytes=0-99"), 1000).expect("range");
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn test_open_ended_range() {
        let range = resolve_range(Some("bytes=500-"), 1000).expect("range");
        assert_eq!(
            range,
            ByteRange {
                start: 500,
                end: 999
            }
        );
    }

    #[test]
    fn test_end_clamped_to_total() {
        let range = resolve_range(Some("bytes=0-5000"), 1000).expect("range");
        assert_eq!(range.end, 999);
    }

    #[test]
    fn test_start_beyond_total_falls_back() {
        assert_eq!(resolve_range(Some("bytes=1000-"), 1000), None);
        assert_eq!(resolve_range(Some("bytes=2000-3000"), 1000), None);
    }

    #[test]
    fn test_malformed_headers_fall_back() {
        assert_eq!(resolve_range(Some("bytes=abc"), 1000), None);
        assert_eq!(resolve_range(Some("bytes=-"), 1000), None);
        assert_eq!(resolve_range(Some("items=0-99"), 1000), None);
        assert_eq!(resolve_range(Some("bytes=99-0"), 1000), None);
        assert_eq!(resolve_range(Some(""), 1000), None);
    }

    #[test]
    fn test_absent_header() {
        assert_eq!(resolve_range(None, 1000), None);
    }

    #[test]
    fn test_zero_length_object() {
        assert_eq!(resolve_range(Some("bytes=0-"), 0), None);
    }

    #[test]
    fn test_last_byte() {
        let range = resolve_range(Some("bytes=999-999"), 1000).expect("range");
        assert_eq!(
            range,
            ByteRange {
                start: 999,
                end: 999
            }
        );
        assert_eq!(range.len(), 1);
    }
}
