use crate::MAX_EVENT_DATA_BYTES;

/// Incremental text/event-stream parser.
///
/// Transport chunks arrive at arbitrary byte boundaries, including inside
/// a multi-byte UTF-8 character; feed them in with [`SseParser::push`] and
/// collect completed frames. Incomplete bytes stay buffered until their
/// line terminator arrives, so decoding only ever sees whole lines.
/// Follows EventSource framing: `field: value` lines, a blank line
/// terminates a frame, `:`-prefixed lines are comments (servers use them
/// as keepalives).
///
/// A line or a frame's accumulated `data` growing past
/// [`MAX_EVENT_DATA_BYTES`] marks the frame oversized; its remaining bytes
/// are drained and the frame is dropped at its terminator. Parsing resumes
/// cleanly on the next frame.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    data: String,
    id: Option<String>,
    event: Option<String>,
    skipping_line: bool,
    oversized: bool,
}

/// One completed frame. `data` lines are joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: String,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a transport chunk, returning any frames it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if self.skipping_line {
                // Tail of a line that already blew past the ceiling.
                self.skipping_line = false;
                continue;
            }

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
                continue;
            }

            self.handle_line(&String::from_utf8_lossy(&line));
        }

        if self.buffer.len() > MAX_EVENT_DATA_BYTES {
            self.buffer.clear();
            self.skipping_line = true;
            self.oversized = true;
        }

        frames
    }

    fn handle_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            // A field name with no colon is a valid line with empty value.
            None => (line, ""),
        };

        match field {
            "data" => {
                if self.oversized {
                    return;
                }
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                if self.data.len() > MAX_EVENT_DATA_BYTES {
                    self.data.clear();
                    self.oversized = true;
                }
            }
            // Per the EventSource spec, ids containing NUL are ignored.
            "id" if !value.contains('\0') => self.id = Some(value.to_owned()),
            "event" => self.event = Some(value.to_owned()),
            // "retry" and anything unknown: ignored.
            _ => {}
        }
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        let data = std::mem::take(&mut self.data);
        let id = self.id.take();
        let event = self.event.take();

        if std::mem::take(&mut self.oversized) || data.is_empty() {
            return None;
        }

        Some(SseFrame { id, event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_frame() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: {\"id\":\"a\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"id\":\"a\"}");
        assert_eq!(frames[0].id, None);
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: {\"per").is_empty());
        assert!(parser.push(b"cent\":50}").is_empty());
        let frames = parser.push(b"\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"percent\":50}");
    }

    #[test]
    fn chunk_boundary_inside_multibyte_character() {
        let mut parser = SseParser::new();
        // "é" is 0xC3 0xA9; the split lands between its two bytes.
        assert!(parser.push(b"data: {\"file\":\"r\xc3").is_empty());
        let frames = parser.push(b"\xa9sum\xc3\xa9.txt\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"file\":\"résumé.txt\"}");
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: one\n\ndata: two\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "one");
        assert_eq!(frames[1].data, "two");
    }

    #[test]
    fn multiline_data_joined_with_newline() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: first\ndata: second\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn id_and_event_fields_captured() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"id: 42\nevent: progress\ndata: x\n\n");
        assert_eq!(frames[0].id.as_deref(), Some("42"));
        assert_eq!(frames[0].event.as_deref(), Some("progress"));
    }

    #[test]
    fn comments_and_empty_frames_skipped() {
        let mut parser = SseParser::new();
        let frames = parser.push(b": keepalive\n\n: another\n\ndata: real\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "real");
    }

    #[test]
    fn crlf_line_endings_accepted() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: windows\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "windows");
    }

    #[test]
    fn value_without_leading_space() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data:compact\n\n");
        assert_eq!(frames[0].data, "compact");
    }

    #[test]
    fn id_with_nul_is_ignored() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"id: bad\0id\ndata: x\n\n");
        assert_eq!(frames[0].id, None);
    }

    #[test]
    fn endless_line_does_not_grow_the_buffer() {
        let mut parser = SseParser::new();
        let giant = vec![b'x'; MAX_EVENT_DATA_BYTES + 1024];
        assert!(parser.push(&giant).is_empty());
        assert!(parser.buffer.is_empty());

        // The line's tail and terminator are drained, the frame dropped,
        // and the next frame parses normally.
        let frames = parser.push(b"tail\n\ndata: next\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "next");
    }

    #[test]
    fn oversized_data_accumulation_drops_the_frame() {
        let mut parser = SseParser::new();
        let half = "data: ".to_owned() + &"y".repeat(MAX_EVENT_DATA_BYTES / 2 + 64) + "\n";
        assert!(parser.push(half.as_bytes()).is_empty());
        assert!(parser.push(half.as_bytes()).is_empty());

        let frames = parser.push(b"\ndata: after\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "after");
    }
}
