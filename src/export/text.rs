use crate::export::report::{wrap_text, Block, Report};

pub const LINE_WIDTH: usize = 80;

fn underline(text: &str, ch: char) -> String {
    ch.to_string().repeat(text.chars().count().min(LINE_WIDTH))
}

fn push_wrapped(out: &mut String, text: &str, first_prefix: &str, indent: &str) {
    let width = LINE_WIDTH - first_prefix.chars().count();
    for (i, line) in wrap_text(text, width).iter().enumerate() {
        let prefix = if i == 0 { first_prefix } else { indent };
        out.push_str(prefix);
        out.push_str(line);
        out.push('\n');
    }
}

pub fn render(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&report.title);
    out.push('\n');
    out.push_str(&underline(&report.title, '='));
    out.push('\n');
    out.push_str(&report.subtitle);
    out.push('\n');

    for section in &report.sections {
        out.push('\n');
        out.push_str(&section.heading);
        out.push('\n');
        out.push_str(&underline(&section.heading, '-'));
        out.push('\n');

        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => {
                    push_wrapped(&mut out, text, "", "");
                }
                Block::Bullets(items) => {
                    for item in items {
                        push_wrapped(&mut out, item, "- ", "  ");
                    }
                }
                Block::KeyValues(rows) => {
                    for (key, value) in rows {
                        push_wrapped(&mut out, &format!("{}: {}", key, value), "", "    ");
                    }
                }
            }
            out.push('\n');
        }
    }

    out.trim_end().to_string() + "\n"
}
