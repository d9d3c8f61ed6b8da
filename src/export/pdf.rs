use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use super::model::Table;

/// Encodes text for the WinAnsi Helvetica font. Latin-1 letters share their
/// code points there; anything else becomes `?`.
fn win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Flowing A4 document: text and tables are laid out top to bottom and
/// continue on a new page when the current one is full.
pub struct PdfReport {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    font_id: Ref,
    next_id: i32,
    page_refs: Vec<Ref>,
    pages: Vec<Content>,

    y: f32,
    page_w: f32,
    page_h: f32,
    margin: f32,
    row_h: f32,
    font_size: f32,
}

impl Default for PdfReport {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfReport {
    pub fn new() -> Self {
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);
        pdf.type1_font(font_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        let mut report = Self {
            pdf,
            catalog_id,
            pages_id,
            font_id,
            next_id: 4,
            page_refs: Vec::new(),
            pages: Vec::new(),
            y: 0.0,
            page_w: 595.0,
            page_h: 842.0,
            margin: 50.0,
            row_h: 18.0,
            font_size: 9.0,
        };
        report.start_page();
        report
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    fn start_page(&mut self) {
        self.pages.push(Content::new());
        self.y = self.page_h - self.margin;
    }

    fn content(&mut self) -> &mut Content {
        if self.pages.is_empty() {
            self.start_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Starts a new page unless `height` still fits above the bottom margin.
    fn ensure_room(&mut self, height: f32) -> bool {
        if self.y - height < self.margin {
            self.start_page();
            true
        } else {
            false
        }
    }

    fn text_at(&mut self, x: f32, y: f32, size: f32, text: &str) {
        let text = win_ansi(text);
        let content = self.content();
        content.begin_text();
        content.set_font(Name(b"F1"), size);
        content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
        content.show(Str(&text));
        content.end_text();
    }

    pub fn heading(&mut self, text: &str, size: f32) {
        self.ensure_room(size + 8.0);
        self.y -= size + 4.0;
        let (x, y) = (self.margin, self.y);
        self.text_at(x, y, size, text);
        self.y -= 6.0;
    }

    pub fn line(&mut self, text: &str) {
        self.ensure_room(self.row_h);
        self.y -= self.row_h;
        let (x, y, size) = (self.margin, self.y + 4.0, self.font_size + 1.0);
        self.text_at(x, y, size, text);
    }

    pub fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn col_widths(&self, headers: &[&str], rows: &[Vec<String>]) -> Vec<f32> {
        let mut widths: Vec<f32> = headers.iter().map(|h| h.len() as f32 * 5.5 + 8.0).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count() as f32 * 5.0 + 8.0);
            }
        }
        let total: f32 = widths.iter().sum();
        let max = self.page_w - 2.0 * self.margin;
        if total > max {
            let scale = max / total;
            widths.iter_mut().for_each(|w| *w *= scale);
        }
        widths
    }

    fn row(&mut self, widths: &[f32], cells: &[String], fill: Option<f32>) {
        self.y -= self.row_h;
        let (y, row_h, size) = (self.y, self.row_h, self.font_size);
        let total: f32 = widths.iter().sum();
        let margin = self.margin;

        let content = self.content();
        if let Some(gray) = fill {
            content.save_state();
            content.set_fill_gray(gray);
            content.rect(margin, y, total, row_h);
            content.fill_nonzero();
            content.restore_state();
        }

        let mut x = margin;
        for (cell, w) in cells.iter().zip(widths) {
            // Truncate so text stays inside its column.
            let max_chars = ((w - 8.0) / 5.0).max(1.0) as usize;
            let shown: String = cell.chars().take(max_chars).collect();
            self.text_at(x + 4.0, y + 5.0, size, &shown);

            let content = self.content();
            content.save_state();
            content.set_stroke_gray(0.65);
            content.rect(x, y, *w, row_h);
            content.stroke();
            content.restore_state();
            x += w;
        }
    }

    /// Table with a shaded header row, repeated on every page it spans.
    pub fn table(&mut self, table: &Table) {
        let rows = table.display_rows();
        let widths = self.col_widths(table.headers, &rows);
        let header: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();

        self.heading(table.title, 12.0);
        self.ensure_room(self.row_h * 2.0);
        self.row(&widths, &header, Some(0.85));

        for (i, r) in rows.iter().enumerate() {
            if self.ensure_room(self.row_h) {
                self.row(&widths, &header, Some(0.85));
            }
            let fill = (i % 2 == 1).then_some(0.96);
            self.row(&widths, r, fill);
        }
        if rows.is_empty() {
            self.line("No entries.");
        }
        self.gap(12.0);
    }

    pub fn finish(mut self) -> Vec<u8> {
        let pages = std::mem::take(&mut self.pages);
        let count = pages.len();
        for (i, mut content) in pages.into_iter().enumerate() {
            let footer = win_ansi(&format!("Page {} of {}", i + 1, count));
            content.begin_text();
            content.set_font(Name(b"F1"), self.font_size);
            content.set_text_matrix([
                1.0,
                0.0,
                0.0,
                1.0,
                self.page_w - self.margin - 60.0,
                self.margin - 30.0,
            ]);
            content.show(Str(&footer));
            content.end_text();

            let page_id = self.fresh_ref();
            let content_id = self.fresh_ref();
            self.page_refs.push(page_id);

            {
                let mut page = self.pdf.page(page_id);
                page.parent(self.pages_id)
                    .media_box(Rect::new(0.0, 0.0, self.page_w, self.page_h))
                    .contents(content_id);
                page.resources().fonts().pair(Name(b"F1"), self.font_id);
            }

            self.pdf.stream(content_id, &content.finish());
        }

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .count(self.page_refs.len() as i32)
            .kids(self.page_refs.iter().copied());
        self.pdf.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::model::{fixtures, readings_table};
    use crate::readings::repo_types::GlucoseReading;

    #[test]
    fn latin1_survives_and_the_rest_is_replaced() {
        assert_eq!(win_ansi("caffè ok"), b"caff\xe8 ok");
        assert_eq!(win_ansi("Müller 5°"), b"M\xfcller 5\xb0");
        assert_eq!(win_ansi("tab\there"), b"tab?here");
        assert_eq!(win_ansi("5 € 日"), b"5 ? ?");
    }

    #[test]
    fn produces_a_pdf_document() {
        let mut report = PdfReport::new();
        report.heading("Report", 16.0);
        report.table(&readings_table(&fixtures::readings()));
        let bytes = report.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/WinAnsiEncoding"));
    }

    #[test]
    fn long_tables_spill_onto_more_pages() {
        let template = fixtures::readings().remove(0);
        let many: Vec<GlucoseReading> = (0..120).map(|_| template.clone()).collect();
        let mut report = PdfReport::new();
        report.table(&readings_table(&many));
        let bytes = report.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 4"), "120 rows span four pages");
    }
}
