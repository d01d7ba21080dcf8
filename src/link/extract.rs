use std::borrow::Cow;

/// Attribute markers whose quoted value is a link
const MARKERS: [&[u8]; 2] = [b"href=\"", b"src=\""];

/// Lazy scan over a buffer for `href="…"` and `src="…"` values
///
/// Each step looks for whichever marker occurs first in the rest of the
/// buffer and yields the text up to the next `"`. A marker without a closing
/// quote ends the scan: the value is dropped and nothing after it is read.
#[derive(Debug, Clone)]
pub struct Links<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Links<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = self.buf;
        let rest = buf.get(self.pos..)?;

        let marker = MARKERS
            .iter()
            .filter_map(|marker| find(rest, marker).map(|at| at + marker.len()))
            .min();

        let Some(value_start) = marker else {
            self.pos = self.buf.len();
            return None;
        };

        match rest[value_start..].iter().position(|&b| b == b'"') {
            Some(len) => {
                self.pos += value_start + len + 1;
                Some(String::from_utf8_lossy(
                    &rest[value_start..value_start + len],
                ))
            }
            None => {
                tracing::trace!("unterminated attribute at byte {}", self.pos + value_start);
                self.pos = self.buf.len();
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Links<'_> {}

/// Scans `bytes` for raw link values, left to right
///
/// This is attribute-pattern scanning, not HTML parsing: markers are matched
/// wherever they occur, case-sensitively, and values are returned verbatim.
///
/// # Examples
///
/// ```
/// use spindle::link::extract_links;
///
/// let links: Vec<_> = extract_links(br#"<a href="http://example.com/x">"#).collect();
/// assert_eq!(links, vec!["http://example.com/x"]);
/// ```
pub fn extract_links(bytes: &[u8]) -> Links<'_> {
    Links { buf: bytes, pos: 0 }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
