use super::{date_parser, Cell, RowLabel};
use crate::error::{GradeError, GradeResult};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Spreadsheet exports spell "no value" in a handful of ways.
fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || matches!(s, "nan" | "NaN" | "NAN" | "NA" | "N/A" | "null" | "NULL")
}

/// Interpret one raw value cell.
pub fn parse_cell(raw: &str) -> Cell {
    let s = clean_str(raw);
    if is_missing_marker(s) {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) => Cell::from_f64(v),
        Err(_) => Cell::Text(s.to_string()),
    }
}

/// Infer the label kind for a whole index column at once: every label must
/// agree before the column counts as time-valued or ordinal.
pub fn infer_labels(raw: &[String]) -> GradeResult<Vec<RowLabel>> {
    let cleaned: Vec<&str> = raw.iter().map(|s| clean_str(s)).collect();
    if let Some(pos) = cleaned.iter().position(|s| s.is_empty()) {
        return Err(GradeError::parse(format!(
            "row {} has an empty row label",
            pos + 1
        )));
    }

    let times: Option<Vec<_>> = cleaned
        .iter()
        .map(|s| date_parser::parse_timestamp(s))
        .collect();
    if let Some(times) = times {
        return Ok(times.into_iter().map(RowLabel::Time).collect());
    }

    let ordinals: Option<Vec<i64>> = cleaned.iter().map(|s| s.parse().ok()).collect();
    if let Some(ordinals) = ordinals {
        return Ok(ordinals.into_iter().map(RowLabel::Ordinal).collect());
    }

    Ok(cleaned
        .into_iter()
        .map(|s| RowLabel::Text(s.to_string()))
        .collect())
}
