//! Event Framing
//!
//! Splits raw response bytes into server-sent event frames.
//!
//! ```text
//! data: {"id":"cmpl-1", ...}
//!
//! data: {"id":"cmpl-1", ...}
//!
//! data: [DONE]
//! ```

use bytes::Bytes;

/// Prefix every event frame must start with
pub const EVENT_PREFIX: &[u8] = b"data: ";

/// Separator between two frames
pub const FRAME_SEPARATOR: &[u8] = b"\n\n";

/// Payload marking the normal end of a stream
pub const DONE_SENTINEL: &[u8] = b"[DONE]";

/// Why framing stopped before the end of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The `[DONE]` sentinel was seen
    Done,

    /// A segment did not start with `data: `
    BadPrefix,
}

/// Frames found in one buffer
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedEvents {
    /// Accepted frames, prefix included, in input order
    pub frames: Vec<Bytes>,

    /// Set when framing stopped early
    pub terminal: Option<Terminal>,
}

impl ParsedEvents {
    fn stop(mut self, terminal: Terminal) -> Self {
        self.terminal = Some(terminal);
        self
    }
}

/// Split `buf` into frames.
///
/// A segment without a trailing separator is still a complete frame once its
/// prefix is validated. Segments after a bad prefix or after `[DONE]` are not
/// looked at.
pub fn parse_events(buf: &Bytes) -> ParsedEvents {
    let mut parsed = ParsedEvents::default();
    let end = trim_padding(buf);

    let mut start = 0;
    while start < end {
        let seg_end = find(&buf[start..end], FRAME_SEPARATOR)
            .map(|pos| start + pos)
            .unwrap_or(end);
        let segment = &buf[start..seg_end];
        let next = if seg_end < end {
            seg_end + FRAME_SEPARATOR.len()
        } else {
            end
        };

        if !is_blank(segment) {
            let Some(payload) = segment.strip_prefix(EVENT_PREFIX) else {
                return parsed.stop(Terminal::BadPrefix);
            };
            if payload.trim_ascii_end() == DONE_SENTINEL {
                return parsed.stop(Terminal::Done);
            }
            parsed.frames.push(buf.slice(start..seg_end));
        }

        start = next;
    }

    parsed
}

/// Payload of a frame, without the `data: ` prefix.
pub fn frame_payload(frame: &Bytes) -> Bytes {
    if frame.starts_with(EVENT_PREFIX) {
        frame.slice(EVENT_PREFIX.len()..)
    } else {
        frame.clone()
    }
}

/// Offset just past the last frame separator in `buf`, if any.
///
/// Everything before the offset is made of complete frames.
pub fn last_boundary(buf: &[u8]) -> Option<usize> {
    buf.windows(FRAME_SEPARATOR.len())
        .rposition(|w| w == FRAME_SEPARATOR)
        .map(|pos| pos + FRAME_SEPARATOR.len())
}

fn trim_padding(buf: &[u8]) -> usize {
    buf.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1)
}

fn is_blank(segment: &[u8]) -> bool {
    segment.iter().all(|&b| b == 0 || b.is_ascii_whitespace())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &'static [u8]) -> ParsedEvents {
        parse_events(&Bytes::from_static(input))
    }

    #[test]
    fn test_no_frames() {
        assert_eq!(parse(b""), ParsedEvents::default());
        assert_eq!(parse(b"\0\0\0\0"), ParsedEvents::default());
        assert_eq!(parse(b"\n\n\n\n"), ParsedEvents::default());
    }

    #[test]
    fn test_single_frame_without_separator() {
        let parsed = parse(b"data: {}");
        assert_eq!(parsed.frames, vec![Bytes::from_static(b"data: {}")]);
        assert_eq!(parsed.terminal, None);
    }

    #[test]
    fn test_two_frames_in_order() {
        let parsed = parse(b"data: {\"n\":1}\n\ndata: {\"n\":2}\n\n");
        assert_eq!(
            parsed.frames,
            vec![
                Bytes::from_static(b"data: {\"n\":1}"),
                Bytes::from_static(b"data: {\"n\":2}"),
            ]
        );
        assert_eq!(parsed.terminal, None);
    }

    #[test]
    fn test_done_sentinel() {
        let parsed = parse(b"data: {}\n\ndata: [DONE]\n\n");
        assert_eq!(parsed.frames, vec![Bytes::from_static(b"data: {}")]);
        assert_eq!(parsed.terminal, Some(Terminal::Done));
    }

    #[test]
    fn test_frames_after_done_are_dropped() {
        let parsed = parse(b"data: [DONE]\n\ndata: {}\n\n");
        assert!(parsed.frames.is_empty());
        assert_eq!(parsed.terminal, Some(Terminal::Done));
    }

    #[test]
    fn test_bad_prefix_fails_fast() {
        let parsed = parse(b"bad-prefix: {}\n\ndata: {}\n\n");
        assert!(parsed.frames.is_empty());
        assert_eq!(parsed.terminal, Some(Terminal::BadPrefix));
    }

    #[test]
    fn test_bad_prefix_keeps_accepted_frames() {
        let parsed = parse(b"data: {}\n\nevent: ping\n\ndata: {}\n\n");
        assert_eq!(parsed.frames, vec![Bytes::from_static(b"data: {}")]);
        assert_eq!(parsed.terminal, Some(Terminal::BadPrefix));
    }

    #[test]
    fn test_trailing_nul_padding_is_ignored() {
        let mut buf = b"data: {}\n\n".to_vec();
        buf.resize(64, 0);

        let parsed = parse_events(&Bytes::from(buf));
        assert_eq!(parsed.frames, vec![Bytes::from_static(b"data: {}")]);
        assert_eq!(parsed.terminal, None);
    }

    #[test]
    fn test_frames_alias_the_input() {
        let buf = Bytes::from_static(b"data: {\"a\":true}\n\n");
        let parsed = parse_events(&buf);
        assert_eq!(parsed.frames[0].as_ptr(), buf.as_ptr());
    }

    #[test]
    fn test_frame_payload() {
        let frame = Bytes::from_static(b"data: {\"a\":1}");
        assert_eq!(frame_payload(&frame), Bytes::from_static(b"{\"a\":1}"));
    }

    #[test]
    fn test_last_boundary() {
        assert_eq!(last_boundary(b"data: {}"), None);
        assert_eq!(last_boundary(b"data: {}\n\n"), Some(10));
        assert_eq!(last_boundary(b"data: {}\n\ndata: {\"par"), Some(10));
        assert_eq!(last_boundary(b"data: 1\n\ndata: 2\n\n"), Some(18));
    }
}
