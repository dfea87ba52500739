/// Parses a committed-range header of the form `bytes=0-<end>`.
///
/// Returns the number of bytes the server holds (`end + 1`), or `None` if
/// the value is malformed. The caller falls back to its own arithmetic in
/// that case.
pub fn parse_committed_range(value: &str) -> Option<u64> {
    let (unit, span) = value.trim().split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (start, end) = span.trim().split_once('-')?;
    start.trim().parse::<u64>().ok()?;
    let end: u64 = end.trim().parse().ok()?;
    end.checked_add(1)
}

/// Builds the `Content-Range` value for a window of `len` bytes at `offset`.
///
/// An empty window is expressed as `bytes */<total>`, the form used to ask
/// the server for its current state.
pub fn content_range(offset: u64, len: usize, total: u64) -> String {
    if len == 0 {
        return format!("bytes */{total}");
    }
    let last = offset + len as u64 - 1;
    format!("bytes {offset}-{last}/{total}")
}
