use crate::export::report::{Block, Report};

fn table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

pub fn render(report: &Report) -> String {
    let mut out = format!("# {}\n\n<{}>\n", report.title, report.subtitle);

    for section in &report.sections {
        out.push_str(&format!("\n## {}\n", section.heading));
        for block in &section.blocks {
            out.push('\n');
            match block {
                Block::Paragraph(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
                Block::Bullets(items) => {
                    for item in items {
                        out.push_str(&format!("- {}\n", item));
                    }
                }
                Block::KeyValues(rows) => {
                    out.push_str("| Field | Value |\n| --- | --- |\n");
                    for (key, value) in rows {
                        out.push_str(&format!("| {} | {} |\n", table_cell(key), table_cell(value)));
                    }
                }
            }
        }
    }

    out
}
