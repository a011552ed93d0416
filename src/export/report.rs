use crate::models::{ranked_languages, Analysis, DerivationSource, Derived, LanguageStats};

/// Format-neutral rendering of an analysis. Every output format is produced
/// from the same `Report`, so they always carry the same content.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Free text. Single newlines are kept as line breaks.
    Paragraph(String),
    Bullets(Vec<String>),
    KeyValues(Vec<(String, String)>),
}

impl Section {
    fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_string(),
            blocks: Vec::new(),
        }
    }

    fn push(mut self, block: Block) -> Self {
        let empty = match &block {
            Block::Paragraph(text) => text.trim().is_empty(),
            Block::Bullets(items) => items.is_empty(),
            Block::KeyValues(rows) => rows.is_empty(),
        };
        if !empty {
            self.blocks.push(block);
        }
        self
    }
}

fn provenance<T>(derived: &Derived<T>) -> String {
    match &derived.source {
        DerivationSource::Model { model } => format!("Generated by {}.", model),
        DerivationSource::Heuristic { fallback } => {
            format!("Derived locally ({}).", fallback)
        }
    }
}

/// Split model text into paragraphs on blank lines.
fn paragraphs(text: &str) -> Vec<Block> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Block::Paragraph(p.to_string()))
        .collect()
}

fn language_lines(stats: &LanguageStats) -> Vec<String> {
    ranked_languages(stats)
        .into_iter()
        .map(|share| {
            format!(
                "{}: {:.1}% ({} bytes)",
                share.language, share.percentage, share.bytes
            )
        })
        .collect()
}

impl Report {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let info = analysis.repository_data.as_ref().map(|data| &data.info);
        let not_available = || "N/A".to_string();

        let mut overview = vec![
            ("Repository".to_string(), analysis.full_name()),
            ("URL".to_string(), analysis.repository_url.clone()),
            (
                "Description".to_string(),
                analysis.description.clone().unwrap_or_else(not_available),
            ),
            (
                "Primary Language".to_string(),
                analysis.language.clone().unwrap_or_else(not_available),
            ),
            ("Stars".to_string(), analysis.stars.to_string()),
            ("Forks".to_string(), analysis.forks.to_string()),
        ];
        if let Some(info) = info {
            if let Some(license) = info.license_name() {
                overview.push(("License".to_string(), license.to_string()));
            }
            if !info.topics.is_empty() {
                overview.push(("Topics".to_string(), info.topics.join(", ")));
            }
        }
        overview.push(("Status".to_string(), analysis.status.to_string()));
        overview.push((
            "Analyzed At".to_string(),
            analysis.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ));

        let mut sections =
            vec![Section::new("Repository Overview").push(Block::KeyValues(overview))];

        match &analysis.insights {
            Some(insights) => {
                let mut summary = Section::new("Summary");
                for block in paragraphs(&insights.summary.value) {
                    summary = summary.push(block);
                }
                sections.push(summary.push(Block::Paragraph(provenance(&insights.summary))));

                let stack_rows: Vec<(String, String)> = insights
                    .tech_stack
                    .value
                    .categories()
                    .iter()
                    .filter(|(_, items)| !items.is_empty())
                    .map(|(label, items)| (label.to_string(), items.join(", ")))
                    .collect();
                let stack = if stack_rows.is_empty() {
                    Section::new("Technology Stack")
                        .push(Block::Paragraph("No technologies identified.".to_string()))
                } else {
                    Section::new("Technology Stack").push(Block::KeyValues(stack_rows))
                };
                sections.push(stack.push(Block::Paragraph(provenance(&insights.tech_stack))));

                let mut setup = Section::new("Setup Instructions");
                for block in paragraphs(&insights.setup_instructions.value) {
                    setup = setup.push(block);
                }
                sections.push(
                    setup.push(Block::Paragraph(provenance(&insights.setup_instructions))),
                );
            }
            None => sections.push(Section::new("Summary").push(Block::Paragraph(
                "AI insights are not available for this analysis.".to_string(),
            ))),
        }

        let languages = analysis
            .file_structure
            .as_ref()
            .map(|fs| &fs.languages)
            .filter(|langs| !langs.is_empty())
            .or_else(|| analysis.repository_data.as_ref().map(|data| &data.languages));
        if let Some(languages) = languages {
            sections.push(
                Section::new("Languages").push(Block::Bullets(language_lines(languages))),
            );
        }

        if let Some(structure) = &analysis.file_structure {
            let mut rows = vec![("Total Files".to_string(), structure.total_files.to_string())];
            rows.extend(
                structure
                    .breakdown
                    .buckets()
                    .iter()
                    .filter(|(_, names)| !names.is_empty())
                    .map(|(label, names)| (label.to_string(), names.join(", "))),
            );
            sections.push(Section::new("File Structure").push(Block::KeyValues(rows)));
        }

        if let Some(error) = analysis.insights.as_ref().and_then(|i| i.error.as_ref()) {
            sections.push(Section::new("Notes").push(Block::Paragraph(error.clone())));
        }

        sections.retain(|section| !section.blocks.is_empty());

        Report {
            title: format!("Repository Analysis: {}", analysis.full_name()),
            subtitle: analysis.repository_url.clone(),
            sections,
        }
    }
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split_at = word
                    .char_indices()
                    .nth(width)
                    .map(|(idx, _)| idx)
                    .unwrap_or(word.len());
                let rest = word.split_off(split_at);
                lines.push(word);
                word = rest;
            }
            if current.is_empty() {
                current = word;
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(&word);
            } else {
                lines.push(std::mem::replace(&mut current, word));
            }
        }
        lines.push(current);
    }
    lines
}
