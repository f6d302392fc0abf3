//! HTTP Range request parsing module
//!
//! Single `bytes` ranges per RFC 7233; anything else falls back to the full body.

/// Inclusive byte range within a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn byte_count(self) -> usize {
        self.end - self.start + 1
    }

    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// How to answer a request given its Range header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header: send the whole body
    Full,
    /// Send 206 with this slice
    Partial(ByteRange),
    /// Send 416
    Unsatisfiable,
}

/// Evaluate a Range header against a body of `size` bytes.
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
/// Multi-range, other units and malformed values yield `Full`.
pub fn evaluate(header: Option<&str>, size: usize) -> RangeOutcome {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix form: the final `last` bytes
        return match last.parse::<usize>() {
            Ok(0) => RangeOutcome::Unsatisfiable,
            Ok(_) if size == 0 => RangeOutcome::Unsatisfiable,
            Ok(n) => RangeOutcome::Partial(ByteRange {
                start: size.saturating_sub(n),
                end: size - 1,
            }),
            Err(_) => RangeOutcome::Full,
        };
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }

    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<usize>() {
            Ok(e) if e < start => return RangeOutcome::Unsatisfiable,
            Ok(e) => e.min(size - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };

    RangeOutcome::Partial(ByteRange { start, end })
}
