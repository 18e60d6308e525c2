//! Plain-text rendering of tables and forms

use std::fmt::Write;

use cms_lib::table::InputControl;
use cms_lib::table::InputWidget;

/// Cells wider than this are cut and end in "...".
pub const MAX_CELL_WIDTH: usize = 40;

fn width(s: &str) -> usize {
    s.chars().count()
}

fn clip(s: &str, max: usize) -> String {
    if width(s) <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn pad(s: &str, to: usize) -> String {
    let mut out = s.to_string();
    out.extend(std::iter::repeat_n(' ', to.saturating_sub(width(s))));
    out
}

/// Lays out `rows` under `header` with aligned columns.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| clip(&c.replace('\n', " "), MAX_CELL_WIDTH)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| width(h)).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(width(cell));
            }
        }
    }

    let line = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| pad(v, *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(header.iter().map(|h| h.to_string()).collect()));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    if cells.is_empty() {
        let _ = writeln!(out, "(no records)");
    }
    for row in cells {
        let _ = writeln!(out, "{}", line(row));
    }
    out
}

/// Lists form controls as `label: value` lines with the widget kind.
pub fn render_form(title: &str, controls: &[InputControl]) -> String {
    let labels: Vec<String> = controls.iter().map(|c| c.display_label()).collect();
    let label_width = labels.iter().map(|l| width(l)).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    for (control, label) in controls.iter().zip(&labels) {
        let hint = match &control.widget {
            InputWidget::Checkbox { .. } => "yes/no".to_string(),
            InputWidget::Select { options, .. } => options
                .iter()
                .filter(|o| !o.value.is_empty())
                .map(|o| o.value.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            InputWidget::Number { .. } => "number".to_string(),
            InputWidget::DateTimeLocal { .. } => "YYYY-MM-DDTHH:MM".to_string(),
            InputWidget::Text { .. } => "text".to_string(),
        };
        let lock = if control.read_only { " (read-only)" } else { "" };
        let _ = writeln!(
            out,
            "  {} [{}] {}  <{}>{}",
            pad(label, label_width),
            control.key,
            control.display_value(),
            hint,
            lock
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use cms_lib::model::FieldSpec;
    use cms_lib::model::Value;
    use cms_lib::table::FieldRenderer;

    use super::*;

    #[test]
    fn test_columns_align() {
        let out = render_table(
            &["ID", "Name"],
            &[vec!["1".into(), "Rock".into()], vec!["22".into(), "Jazz".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID | Name");
        assert_eq!(lines[1], "---+-----");
        assert_eq!(lines[2], "1  | Rock");
        assert_eq!(lines[3], "22 | Jazz");
    }

    #[test]
    fn test_long_cells_clipped() {
        let long = "x".repeat(100);
        let out = render_table(&["Content"], &[vec![long]]);
        let row = out.lines().nth(2).unwrap();
        assert_eq!(row.chars().count(), MAX_CELL_WIDTH);
        assert!(row.ends_with("..."));
    }

    #[test]
    fn test_empty_table() {
        assert!(render_table(&["ID"], &[]).contains("(no records)"));
    }

    #[test]
    fn test_form_lines() {
        let renderer = FieldRenderer::utc();
        let controls = vec![
            renderer.render_input(&FieldSpec::text("name", "Name").required(), &Value::from("Rock"), false),
            renderer.render_input(&FieldSpec::enumeration("role", "Role", ["USER", "ADMIN"]), &Value::Null, false),
        ];
        let out = render_form("New Tag", &controls);
        assert!(out.contains("Name * [name] Rock  <text>"));
        assert!(out.contains("[role] Select...  <USER|ADMIN>"));
    }
}
