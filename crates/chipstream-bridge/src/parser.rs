//! Screen framing and field extraction.
//!
//! The game writes a terminal screen as a raw byte stream with no
//! framing signal of its own. The bridge treats a fixed number of
//! accumulated bytes as one screen refresh; this byte-count heuristic
//! is a known approximation (it depends on the game's terminal size and
//! redraw discipline) kept deliberately in place of a smarter signal.

use regex::Regex;

/// Bytes of one screen refresh: a full 80x24 text screen.
pub const SCREEN_REFRESH_BYTES: usize = 1920;

/// Keywords that fire one-shot triggers when they appear on screen.
const TRIGGER_KEYWORDS: &[&str] = &["scored", "hit", "fire"];

/// One parsed screenful of game output.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedScreen {
    /// The raw screen text, forwarded as the frame's display payload.
    pub text: String,
    /// Observed `(player, velocity)` pairs.
    pub velocities: Vec<(usize, f32)>,
    /// Keyword triggers detected in this screen.
    pub triggers: Vec<String>,
}

/// Accumulates raw process output and cuts it into screens.
pub struct FrameParser {
    buffer: Vec<u8>,
    velocity_pattern: Regex,
}

impl FrameParser {
    /// Create a parser with an empty accumulator.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(SCREEN_REFRESH_BYTES * 2),
            // Matches lines like "P0 speed: 4.5" or "p1 vel= -2".
            velocity_pattern: Regex::new(r"(?i)\bp(\d+)\s+(?:vel|speed)\s*[:=]\s*(-?\d+(?:\.\d+)?)")
                .expect("velocity pattern is valid"),
        }
    }

    /// Feed raw output; returns one parsed screen when enough bytes
    /// have accumulated, clearing the buffer.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Option<ParsedScreen> {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() < SCREEN_REFRESH_BYTES {
            return None;
        }

        let text = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        let velocities = self.extract_velocities(&text);
        let triggers = detect_triggers(&text);
        Some(ParsedScreen {
            text,
            velocities,
            triggers,
        })
    }

    fn extract_velocities(&self, text: &str) -> Vec<(usize, f32)> {
        self.velocity_pattern
            .captures_iter(text)
            .filter_map(|captures| {
                let player = captures.get(1)?.as_str().parse().ok()?;
                let velocity = captures.get(2)?.as_str().parse().ok()?;
                Some((player, velocity))
            })
            .collect()
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_triggers(text: &str) -> Vec<String> {
    let lowered = text.to_ascii_lowercase();
    TRIGGER_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(**keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_with(lines: &str) -> Vec<u8> {
        let mut screen = lines.to_string();
        while screen.len() < SCREEN_REFRESH_BYTES {
            screen.push_str("................................\n");
        }
        screen.into_bytes()
    }

    #[test]
    fn buffers_until_a_full_screen_arrives() {
        let mut parser = FrameParser::new();
        assert!(parser.push_bytes(&[b'x'; 100]).is_none());
        assert!(parser.push_bytes(&[b'x'; 100]).is_none());
        assert!(parser.push_bytes(&vec![b'x'; SCREEN_REFRESH_BYTES]).is_some());

        // The buffer was cleared; small follow-ups buffer again.
        assert!(parser.push_bytes(&[b'x'; 10]).is_none());
    }

    #[test]
    fn extracts_player_velocities() {
        let mut parser = FrameParser::new();
        let screen = parser
            .push_bytes(&screen_with("P0 speed: 4.5\nP1 vel= -2\n"))
            .unwrap();

        assert_eq!(screen.velocities, vec![(0, 4.5), (1, -2.0)]);
    }

    #[test]
    fn detects_keyword_triggers_case_insensitively() {
        let mut parser = FrameParser::new();
        let screen = parser
            .push_bytes(&screen_with("*** SCORED ***\nplayer 2 took a Hit\n"))
            .unwrap();

        assert_eq!(screen.triggers, vec!["scored".to_string(), "hit".to_string()]);
    }

    #[test]
    fn screens_without_fields_parse_empty() {
        let mut parser = FrameParser::new();
        let screen = parser.push_bytes(&screen_with("just track art\n")).unwrap();

        assert!(screen.velocities.is_empty());
        assert!(screen.triggers.is_empty());
        assert!(!screen.text.is_empty());
    }

    #[test]
    fn non_utf8_output_is_replaced_not_fatal() {
        let mut parser = FrameParser::new();
        let mut bytes = vec![0xFFu8; SCREEN_REFRESH_BYTES];
        bytes[0..13].copy_from_slice(b"P0 speed: 1.0");

        let screen = parser.push_bytes(&bytes).unwrap();
        assert_eq!(screen.velocities, vec![(0, 1.0)]);
    }
}
