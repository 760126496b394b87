use crate::types::Event;

/// Line-buffered decoder for executor `stream-json` output.
///
/// Bytes are buffered until a newline so multi-byte characters split across
/// chunks decode intact.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a raw chunk and returns the events of every line it completed.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(end) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let line_end = start + end;
            let line = String::from_utf8_lossy(&self.buffer[start..line_end]);
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
            start = line_end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        events
    }

    /// Feeds output that ends at a line boundary, as delivered by
    /// line-buffered process output. Embedded newlines split further lines.
    pub fn push_line(&mut self, line: &str) -> Vec<Event> {
        let mut chunk = Vec::with_capacity(line.len() + 1);
        chunk.extend_from_slice(line.as_bytes());
        chunk.push(b'\n');
        self.process(&chunk)
    }

    /// Decodes whatever partial line is still buffered.
    pub fn finish(&mut self) -> Option<Event> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
    }
}

fn parse_line(line: &str) -> Option<Event> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Event>(line) {
        Ok(event) => Some(event),
        Err(error) => {
            tracing::debug!(%error, line, "skipping undecodable stream line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentBlock;

    #[test]
    fn test_fragmented_lines_are_joined() {
        let mut parser = StreamParser::new();

        let events = parser.process(br#"{"type":"assistant","message":{"content":[{"type":"te"#);
        assert!(events.is_empty());

        let events = parser.process(b"xt\",\"text\":\"Hi\"}]}}\n{\"type\":\"result\",");
        assert_eq!(events, vec![Event::assistant(vec![ContentBlock::text("Hi")])]);

        let events = parser.process(b"\"subtype\":\"success\"}\n");
        assert_eq!(events, vec![Event::result("success")]);
    }

    #[test]
    fn test_invalid_and_untagged_lines_are_skipped() {
        let mut parser = StreamParser::new();
        let chunk = b"not json\n\n{\"message\":{}}\n{\"type\":\"result\",\"subtype\":\"success\"}\n";
        assert_eq!(parser.process(chunk), vec![Event::result("success")]);
    }

    #[test]
    fn test_finish_decodes_unterminated_line() {
        let mut parser = StreamParser::new();
        assert!(parser
            .process(br#"{"type":"result","subtype":"error_max_turns"}"#)
            .is_empty());
        assert_eq!(parser.finish(), Some(Event::result("error_max_turns")));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_multibyte_text_split_across_chunks() {
        let line = "{\"type\":\"assistant\",\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"héllo\"}]}}\n";
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;

        let mut parser = StreamParser::new();
        assert!(parser.process(&bytes[..split]).is_empty());
        assert_eq!(
            parser.process(&bytes[split..]),
            vec![Event::assistant(vec![ContentBlock::text("héllo")])]
        );
    }

    #[test]
    fn test_push_line_handles_line_buffered_output() {
        let mut parser = StreamParser::new();
        let events = parser.push_line(r#"{"type":"result","subtype":"success"}"#);
        assert_eq!(events, vec![Event::result("success")]);
        assert!(parser.push_line("   ").is_empty());

        let two = "{\"type\":\"result\",\"subtype\":\"a\"}\n{\"type\":\"result\",\"subtype\":\"b\"}";
        assert_eq!(
            parser.push_line(two),
            vec![Event::result("a"), Event::result("b")]
        );
    }
}
