
use std::io::Write;

use csv::WriterBuilder;

use super::model::Table;

/// Both tables in one sheet: a `--- Title ---` row, the header, the rows,
/// and an empty line between sections.
pub fn render(tables: &[Table]) -> anyhow::Result<Vec<u8>> {
    let mut builder = WriterBuilder::new();
    builder.flexible(true);
    let mut wtr = builder.from_writer(Vec::new());

    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            // A record with one empty field would come out as `""`.
            wtr.flush()?;
            let mut buf = wtr
                .into_inner()
                .map_err(|e| anyhow::anyhow!("flush csv export: {}", e.error()))?;
            buf.write_all(b"\n")?;
            wtr = builder.from_writer(buf);
        }
        wtr.write_record([format!("--- {} ---", table.title)])?;
        wtr.write_record(table.headers)?;
        for row in table.display_rows() {
            wtr.write_record(&row)?;
        }
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv export: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::model::{fixtures, meals_table, readings_table};

    #[test]
    fn sections_are_separated_by_an_empty_line() {
        let bytes = render(&[
            readings_table(&fixtures::readings()),
            meals_table(&fixtures::meals()),
        ])
        .expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "--- Glucose Readings ---");
        assert_eq!(lines[1], "Date,Time,Level (mg/dL),Type,Notes");
        assert_eq!(lines[2], "2024-03-05,07:15:00,100,Fasting,");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "--- Meals ---");
        assert_eq!(lines[7], "Date,Time,Type,Description,Calories,Carbs");
        assert_eq!(lines[8], "2024-03-05,12:30:00,Lunch,Pasta,450,60.0");
        assert_eq!(lines[9], "2024-03-06,19:00:00,Dinner,\"soup, homemade\",,");
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn empty_history_still_has_both_headers() {
        let bytes = render(&[readings_table(&[]), meals_table(&[])]).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text.lines().count(), 5);
    }
}
