//! Tokenizer for the driver's text report lines
//!
//! The driver prints one line per report, e.g.
//!
//! ```text
//! X1:  -234 Y1:  1234  X2:     0 Y2:     0  du:0 dd:0 dl:0 dr:0  back:0 guide:0 start:0 ...
//! ```
//!
//! Only lines carrying `X1:` are full reports; everything else is chatter.

use tracing::trace;

use super::frame::Frame;

const REPORT_MARKER: &str = "X1:";

/// Parses one report line into a [`Frame`], `None` for non-report lines
pub fn parse_frame(line: &str) -> Option<Frame> {
    if !line.contains(REPORT_MARKER) {
        return None;
    }

    let mut frame = Frame::new();
    let mut rest = line;

    while let Some(colon) = rest.find(':') {
        let key = rest[..colon]
            .rsplit(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .next()
            .unwrap_or("");
        rest = &rest[colon + 1..];

        if key.is_empty() {
            continue;
        }

        match leading_integer(rest) {
            Some(value) => {
                frame.insert(key, value);
            }
            None => trace!("Skipping token without integer value: {}", key),
        }
    }

    Some(frame)
}

// Optional whitespace, optional '-', then ASCII digits
fn leading_integer(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with('-'));
    let digits_len = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits_len == 0 {
        return None;
    }
    text[..sign_len + digits_len].parse().ok()
}
