use anyhow::Context;
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};
use time::{macros::date, Date, Time};

use super::model::{Cell, Table, MEALS_TITLE};

const READINGS_FILL: u32 = 0xCCE5FF;
const MEALS_FILL: u32 = 0xE5FFCC;

/// Day count since the spreadsheet epoch (1899-12-30).
fn date_serial(d: Date) -> f64 {
    f64::from(d.to_julian_day() - date!(1899 - 12 - 30).to_julian_day())
}

fn time_serial(t: Time) -> f64 {
    let secs = u32::from(t.hour()) * 3600 + u32::from(t.minute()) * 60 + u32::from(t.second());
    f64::from(secs) / 86_400.0
}

fn header_format(table: &Table) -> Format {
    let fill = if table.title == MEALS_TITLE {
        MEALS_FILL
    } else {
        READINGS_FILL
    };
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(fill))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin)
}

fn write_sheet(sheet: &mut Worksheet, table: &Table) -> anyhow::Result<()> {
    sheet.set_name(table.title)?;

    let head = header_format(table);
    let date_fmt = Format::new().set_num_format("yyyy-mm-dd");
    let time_fmt = Format::new().set_num_format("hh:mm:ss");

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.len()).collect();
    for (col, h) in table.headers.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *h, &head)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write(r, c, s.as_str())?;
                }
                Cell::Int(n) => {
                    sheet.write(r, c, *n as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write(r, c, *f)?;
                }
                Cell::Date(d) => {
                    sheet.write_with_format(r, c, date_serial(*d), &date_fmt)?;
                }
                Cell::Time(t) => {
                    sheet.write_with_format(r, c, time_serial(*t), &time_fmt)?;
                }
                Cell::Empty => {}
            }
            widths[col] = widths[col].max(cell.display().chars().count());
        }
    }

    for (col, w) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, (*w).min(60) as f64 + 2.0)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// One worksheet per table.
pub fn render(tables: &[Table]) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    for table in tables {
        let sheet = workbook.add_worksheet();
        write_sheet(sheet, table).with_context(|| format!("write sheet {}", table.title))?;
    }
    workbook.save_to_buffer().context("serialize xlsx export")
}
