use docx_rs::{Docx, Paragraph, Run};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::export::report::{Block, Report};

// Sizes are in half-points.
const TITLE_SIZE: usize = 36;
const HEADING_SIZE: usize = 28;
const BODY_SIZE: usize = 22;

fn heading(text: &str, size: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold().size(size))
}

/// One paragraph per line so model line breaks survive.
fn body(text: &str) -> Vec<Paragraph> {
    text.lines()
        .map(|line| Paragraph::new().add_run(Run::new().add_text(line).size(BODY_SIZE)))
        .collect()
}

pub fn render(report: &Report) -> Result<Vec<u8>> {
    let mut docx = Docx::new()
        .add_paragraph(heading(&report.title, TITLE_SIZE))
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(&report.subtitle).italic().size(BODY_SIZE)),
        );

    for section in &report.sections {
        docx = docx.add_paragraph(heading(&section.heading, HEADING_SIZE));
        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => {
                    for paragraph in body(text) {
                        docx = docx.add_paragraph(paragraph);
                    }
                }
                Block::Bullets(items) => {
                    for item in items {
                        let run = Run::new()
                            .add_text(format!("\u{2022} {}", item))
                            .size(BODY_SIZE);
                        docx = docx.add_paragraph(Paragraph::new().add_run(run));
                    }
                }
                Block::KeyValues(rows) => {
                    for (key, value) in rows {
                        docx = docx.add_paragraph(
                            Paragraph::new()
                                .add_run(
                                    Run::new()
                                        .add_text(format!("{}: ", key))
                                        .bold()
                                        .size(BODY_SIZE),
                                )
                                .add_run(Run::new().add_text(value).size(BODY_SIZE)),
                        );
                    }
                }
            }
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| Error::ExportFailed(format!("DOCX packaging failed: {}", e)))?;
    Ok(buffer.into_inner())
}
