//! Parse response header lines into a ResponseHead.

use super::ResponseHead;

/// Parse the header lines of the last response (status line first).
/// A missing or malformed status line yields status 0.
pub(crate) fn parse_head(lines: &[String]) -> ResponseHead {
    let mut status = 0;
    let mut content_length = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse::<u32>().ok())
                .unwrap_or(0);
            content_length = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<u64>().ok();
            }
        }
    }

    ResponseHead {
        status,
        content_length,
    }
}
