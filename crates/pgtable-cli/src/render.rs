use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use pgtable::Record;

const NULL: &str = "NULL";

/// Render rows as a table, header taken from the first row's columns.
pub fn records_table(rows: &[Record]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let Some(first) = rows.first() else {
        return table;
    };
    table.set_header(
        first
            .columns()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for row in rows {
        table.add_row(
            first
                .columns()
                .map(|c| Cell::new(row.get(c).unwrap_or(NULL)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Table text, or a short notice when there is nothing to show.
pub fn render_records(rows: &[Record]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    records_table(rows).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_values_and_nulls() {
        let mut row = Record::from_pairs([("email_address", "john@example.com")]);
        row.push("country", None);
        let text = render_records(&[row]);
        assert!(text.contains("email_address"));
        assert!(text.contains("john@example.com"));
        assert!(text.contains("NULL"));
    }

    #[test]
    fn empty_result_is_a_notice() {
        assert_eq!(render_records(&[]), "(no rows)");
    }
}
