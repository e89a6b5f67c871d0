use crate::SweepError;

const SIZE_1KB: u64 = 1024;
const SIZE_1MB: u64 = 1024 * SIZE_1KB;
const SIZE_1GB: u64 = 1024 * SIZE_1MB;
const SIZE_1TB: u64 = 1024 * SIZE_1GB;

pub fn format_file_size(size: u64) -> String {
    if size >= SIZE_1GB * 2 {
        format!("{:.2} GB", (size as f64) / (SIZE_1GB as f64))
    } else if size >= SIZE_1MB * 2 {
        format!("{:.2} MB", (size as f64) / (SIZE_1MB as f64))
    } else if size >= SIZE_1KB * 2 {
        format!("{:.2} KB", (size as f64) / (SIZE_1KB as f64))
    } else {
        format!("{} bytes", size)
    }
}

/// Parses a human size specification like `10MB` into bytes.
/// Unit casing is ignored; a bare number is taken as bytes.
pub fn parse_size(value: &str) -> Result<u64, SweepError> {
    let value = value.trim().to_uppercase();
    let unit_start = value
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(unit_start);

    let number = number
        .parse::<f64>()
        .map_err(|_| SweepError::InvalidSize(value.clone()))?;
    let factor = match unit.trim() {
        "" | "B" => 1,
        "KB" => SIZE_1KB,
        "MB" => SIZE_1MB,
        "GB" => SIZE_1GB,
        "TB" => SIZE_1TB,
        _ => return Err(SweepError::InvalidSize(value.clone())),
    };

    Ok((number * factor as f64) as u64)
}
