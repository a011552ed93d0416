use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem,
};

use crate::error::{Error, Result};
use crate::export::report::{wrap_text, Block, Report};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_SIZE: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

/// Wrap width in characters for a given font size. Helvetica averages
/// roughly half an em per glyph.
fn chars_per_line(font_size: f32) -> usize {
    let usable_pt = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / PT_TO_MM;
    (usable_pt / (font_size * 0.5)) as usize
}

/// The builtin fonts only cover WinAnsi, so keep text to printable ASCII.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '*',
            '\t' => ' ',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

struct Line {
    text: String,
    font: BuiltinFont,
    size: f32,
    space_before: f32,
}

fn layout(report: &Report) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut push = |text: &str, font: BuiltinFont, size: f32, space_before: f32| {
        let wrapped_lines = wrap_text(&sanitize(text), chars_per_line(size));
        for (i, wrapped) in wrapped_lines.into_iter().enumerate() {
            lines.push(Line {
                text: wrapped,
                font,
                size,
                space_before: if i == 0 { space_before } else { 0.0 },
            });
        }
    };

    push(&report.title, BuiltinFont::HelveticaBold, 18.0, 0.0);
    push(&report.subtitle, BuiltinFont::Helvetica, BODY_SIZE, 2.0);

    for section in &report.sections {
        push(&section.heading, BuiltinFont::HelveticaBold, 14.0, 8.0);
        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => push(text, BuiltinFont::Helvetica, BODY_SIZE, 3.0),
                Block::Bullets(items) => {
                    for item in items {
                        push(&format!("- {}", item), BuiltinFont::Helvetica, BODY_SIZE, 1.0);
                    }
                }
                Block::KeyValues(rows) => {
                    for (key, value) in rows {
                        let row = format!("{}: {}", key, value);
                        push(&row, BuiltinFont::Helvetica, BODY_SIZE, 1.0);
                    }
                }
            }
        }
    }

    lines
}

fn paginate(lines: Vec<Line>) -> Vec<PdfPage> {
    let mut pages = Vec::new();
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    for line in lines {
        let advance = line.size * 1.3 * PT_TO_MM + line.space_before;
        if y - advance < MARGIN_MM && !ops.is_empty() {
            pages.push(PdfPage::new(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                std::mem::take(&mut ops),
            ));
            y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        y -= advance;

        if line.text.is_empty() {
            continue;
        }
        ops.extend([
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point::new(Mm(MARGIN_MM), Mm(y)),
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(line.size),
                font: line.font,
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.text)],
                font: line.font,
            },
            Op::EndTextSection,
        ]);
    }

    pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    pages
}

pub fn render(report: &Report) -> Result<Vec<u8>> {
    let pages = paginate(layout(report));
    let mut doc = PdfDocument::new(&sanitize(&report.title));
    let mut warnings = Vec::new();
    let bytes = doc.with_pages(pages).save(&PdfSaveOptions::default(), &mut warnings);

    if !warnings.is_empty() {
        tracing::debug!("PDF renderer reported {} warnings", warnings.len());
    }
    if bytes.is_empty() {
        return Err(Error::ExportFailed("PDF renderer produced no output".to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::report::Section;

    #[test]
    fn test_sanitize_replaces_non_ascii() {
        assert_eq!(sanitize("“quoted” – ok ✓"), "\"quoted\" - ok ?");
    }

    #[test]
    fn test_long_reports_span_pages() {
        let report = Report {
            title: "Big".to_string(),
            subtitle: "https://github.com/a/b".to_string(),
            sections: vec![Section {
                heading: "Files".to_string(),
                blocks: vec![Block::Bullets((0..200).map(|i| format!("file{}.rs", i)).collect())],
            }],
        };
        assert!(paginate(layout(&report)).len() > 1);
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let report = Report {
            title: "Small".to_string(),
            subtitle: "https://github.com/a/b".to_string(),
            sections: Vec::new(),
        };
        let bytes = render(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
