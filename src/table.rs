//! Plain-text table rendering for terminal output.

/// Render `rows` under `headers` in a bordered grid.
///
/// Columns are sized to their widest cell; short rows are padded. Line
/// breaks inside a cell are flattened to spaces.
pub fn render_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| single_line(cell.as_ref())).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for w in &widths {
            line.push_str(&"-".repeat(w + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&render_row(headers.iter().copied(), &widths));
    out.push_str(&border);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row.iter().map(String::as_str), &widths));
    }
    out.push_str(&border);
    out.push('\n');
    out
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut cells = cells;
    let mut line = String::from("|");
    for w in widths {
        let cell = cells.next().unwrap_or("");
        let pad = w - cell.chars().count();
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 1));
        line.push('|');
    }
    line.push('\n');
    line
}

fn single_line(cell: &str) -> String {
    cell.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Text for a table cell: `-` when empty.
pub fn cell_or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}
