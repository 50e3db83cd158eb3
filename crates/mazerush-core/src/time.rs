/// Milliseconds since the Unix epoch.
///
/// The simulation never reads the clock itself; callers sample this once
/// per tick and pass it down, which keeps deadline logic testable.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
