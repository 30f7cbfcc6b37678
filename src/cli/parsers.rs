//! Shared CLI argument parsers.

/// Parse a memory size into bytes.
///
/// Accepts a plain number of MiB (`4096`) or a number with a binary unit
/// suffix (`512M`, `8G`, `8GiB`, `1T`).
pub fn parse_memory_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);

    let number: u64 = number
        .parse()
        .map_err(|_| format!("invalid memory size: {}", s))?;

    let shift = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "M" | "MB" | "MIB" => 20,
        "K" | "KB" | "KIB" => 10,
        "G" | "GB" | "GIB" => 30,
        "T" | "TB" | "TIB" => 40,
        other => return Err(format!("unknown memory unit '{}' in {}", other, s)),
    };

    number
        .checked_mul(1u64 << shift)
        .ok_or_else(|| format!("memory size too large: {}", s))
}
