fn with_commas(int_part: &str) -> String {
    let mut out = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    if !val.is_finite() {
        return undefined(val);
    }
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let sign = if negative { "-" } else { "" };
    format!("{sign}${}.{dec_part}", with_commas(int_part))
}

/// Format a ratio or score with one decimal: 80.0
pub fn score(val: f64) -> String {
    if !val.is_finite() {
        return undefined(val);
    }
    format!("{val:.1}")
}

fn undefined(val: f64) -> String {
    if val.is_nan() {
        "NaN".to_string()
    } else if val > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

/// Human-readable file size: 1.5 KB
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
