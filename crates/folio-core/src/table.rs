use crate::ast::TableModel;

/// Builds a grid from raw pipe-delimited lines.
///
/// Line 0 is always the header. When a later line looks like a separator,
/// data starts on the line after the first such separator and any lines
/// between the header and it are dropped. Without a separator, data starts
/// at line 1. Rows shorter than the header are padded with empty cells, and
/// a row longer than the header widens the header with empty cells, so no
/// cell is ever dropped and every row ends up with `headers.len()` cells.
pub fn render_table(raw_lines: &[&str]) -> TableModel {
    let Some((header_line, rest)) = raw_lines.split_first() else {
        return TableModel::default();
    };
    let mut headers = split_cells(header_line);
    let header_width = headers.len();

    let separator = rest.iter().position(|line| is_separator_row(line));
    let data = match separator {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    let mut source_rows: Vec<Vec<String>> = data
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| split_cells(line))
        .collect();

    let width = source_rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    headers.resize(width, String::new());

    let mut ragged_rows = Vec::new();
    for (idx, row) in source_rows.iter_mut().enumerate() {
        if row.len() != header_width {
            ragged_rows.push(idx);
        }
        row.resize(width, String::new());
    }

    TableModel {
        headers,
        rows: source_rows,
        has_separator: separator.is_some(),
        ragged_rows,
    }
}

/// Splits one row into trimmed cells, ignoring the empty cells produced by
/// a leading or trailing pipe.
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// A row of `-`/`:` cells, or any row containing a `--` run.
pub fn is_separator_row(line: &str) -> bool {
    if line.contains("--") {
        return true;
    }
    let cells = split_cells(line);
    cells.iter().any(|cell| !cell.is_empty())
        && cells
            .iter()
            .all(|cell| cell.chars().all(|c| matches!(c, '-' | ':' | ' ')))
        && cells.iter().any(|cell| cell.contains('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn standard_table() {
        let model = render_table(&["| a | b |", "|---|:-:|", "| 1 | 2 |", "| 3 | 4 |"]);
        assert_eq!(model.headers, strings(&["a", "b"]));
        assert_eq!(
            model.rows,
            vec![strings(&["1", "2"]), strings(&["3", "4"])]
        );
        assert!(model.has_separator);
        assert!(model.ragged_rows.is_empty());
    }

    #[test]
    fn short_row_is_padded() {
        let model = render_table(&["a | b | c", "--- | --- | ---", "1 | 2"]);
        assert_eq!(model.rows, vec![strings(&["1", "2", ""])]);
        assert_eq!(model.ragged_rows, vec![0]);
    }

    #[test]
    fn long_row_widens_the_header() {
        let model = render_table(&["| a | b |", "|---|---|", "| 1 | 2 | 3 |", "| 4 | 5 |"]);
        assert_eq!(model.headers, strings(&["a", "b", ""]));
        assert_eq!(
            model.rows,
            vec![strings(&["1", "2", "3"]), strings(&["4", "5", ""])]
        );
        assert_eq!(model.ragged_rows, vec![0]);
    }

    #[test]
    fn missing_separator_starts_data_at_line_one() {
        let model = render_table(&["| a | b |", "| 1 | 2 |"]);
        assert!(!model.has_separator);
        assert_eq!(model.rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn data_starts_after_a_late_separator() {
        let model = render_table(&["| a | b |", "| x | y |", "|---|---|", "| 1 | 2 |"]);
        assert!(model.has_separator);
        assert_eq!(model.headers, strings(&["a", "b"]));
        assert_eq!(model.rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn only_the_first_separator_is_consumed() {
        let model = render_table(&["| a | b |", "|---|---|", "| 1 | 2 |", "|---|---|"]);
        assert_eq!(
            model.rows,
            vec![strings(&["1", "2"]), strings(&["---", "---"])]
        );
    }

    #[test]
    fn header_only_table() {
        let model = render_table(&["| a | b |"]);
        assert_eq!(model.headers, strings(&["a", "b"]));
        assert!(model.rows.is_empty());
    }

    #[test]
    fn separator_detection() {
        assert!(is_separator_row("|---|---|"));
        assert!(is_separator_row("| :-: | -: |"));
        assert!(is_separator_row("a -- b"));
        assert!(!is_separator_row("| a | b |"));
        assert!(!is_separator_row("| : | : |"));
    }
}
