use crate::models::{FileNode, LanguageStats, ManifestFile, ReadmeFile, RepositoryInfo, TechStack};

pub const SUMMARY_README_CHARS: usize = 3000;
pub const SETUP_README_CHARS: usize = 2000;
pub const MANIFEST_EXCERPT_CHARS: usize = 500;
pub const TREE_SAMPLE_ENTRIES: usize = 50;

const TECH_STACK_SCHEMA: &str = r#"{
    "primary_languages": ["language1", "language2"],
    "frameworks": ["framework1", "framework2"],
    "databases": ["db1", "db2"],
    "tools_and_services": ["tool1", "tool2"],
    "deployment": ["platform1", "platform2"],
    "testing": ["testing_framework1", "testing_framework2"],
    "build_tools": ["build_tool1", "build_tool2"],
    "package_managers": ["manager1", "manager2"],
    "development_tools": ["tool1", "tool2"],
    "api_technologies": ["api1", "api2"]
}"#;

/// Everything the prompts may draw on for one repository.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub info: &'a RepositoryInfo,
    pub languages: &'a LanguageStats,
    pub readme: Option<&'a ReadmeFile>,
    pub manifests: &'a [ManifestFile],
    pub tree: &'a [FileNode],
}

/// Longest prefix of at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("N/A")
}

fn format_manifests(manifests: &[ManifestFile]) -> String {
    if manifests.is_empty() {
        return "No package files found".to_string();
    }
    manifests
        .iter()
        .map(|m| format!("{}:\n{}", m.filename, truncate_chars(&m.content, MANIFEST_EXCERPT_CHARS)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_tree_sample(tree: &[FileNode]) -> String {
    if tree.is_empty() {
        return "No file structure data".to_string();
    }
    tree.iter()
        .take(TREE_SAMPLE_ENTRIES)
        .map(|node| {
            if node.is_dir() {
                format!("[dir] {}/", node.name)
            } else {
                format!("[file] {} ({} bytes)", node.name, node.size)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_languages(languages: &LanguageStats) -> String {
    if languages.is_empty() {
        return "No language data".to_string();
    }
    serde_json::to_string_pretty(languages).unwrap_or_else(|_| "No language data".to_string())
}

fn readme_block(readme: Option<&ReadmeFile>, max_chars: usize, heading: &str) -> String {
    match readme {
        Some(readme) => format!("{}\n{}", heading, truncate_chars(&readme.content, max_chars)),
        None => "No README available".to_string(),
    }
}

pub fn summary_prompt(ctx: &PromptContext<'_>) -> String {
    format!(
        r#"Analyze this GitHub repository and provide a comprehensive summary:

Repository Information:
- Name: {name}
- Description: {description}
- Primary Language: {language}
- Stars: {stars}
- Forks: {forks}
- Topics: {topics}

{readme}

Package Files:
{manifests}

Please provide:
1. A clear, concise summary of what this project does (2-3 sentences)
2. The main purpose and target audience
3. Key features and capabilities
4. Notable technologies or frameworks used

Format the response as a well-structured summary without markdown headers."#,
        name = ctx.info.name,
        description = or_na(ctx.info.description.as_deref()),
        language = or_na(ctx.info.language.as_deref()),
        stars = ctx.info.stargazers_count,
        forks = ctx.info.forks_count,
        topics = ctx.info.topics.join(", "),
        readme = readme_block(ctx.readme, SUMMARY_README_CHARS, "README Content:"),
        manifests = format_manifests(ctx.manifests),
    )
}

pub fn tech_stack_prompt(ctx: &PromptContext<'_>) -> String {
    format!(
        r#"Analyze this repository's technology stack and provide a detailed breakdown:

Programming Languages (by bytes of code):
{languages}

Package/Dependency Files:
{manifests}

File Structure Sample:
{tree}

Repository Metadata:
- Primary Language: {language}
- Topics: {topics}

Please analyze and return a JSON object with the following structure:
{schema}

Only include technologies that you can confidently identify from the provided information.
Return only the JSON object, no additional text."#,
        languages = format_languages(ctx.languages),
        manifests = format_manifests(ctx.manifests),
        tree = format_tree_sample(ctx.tree),
        language = or_na(ctx.info.language.as_deref()),
        topics = ctx.info.topics.join(", "),
        schema = TECH_STACK_SCHEMA,
    )
}

pub fn setup_prompt(ctx: &PromptContext<'_>, tech_stack: &TechStack) -> String {
    let stack = if tech_stack.is_empty() {
        "No tech stack data".to_string()
    } else {
        serde_json::to_string_pretty(tech_stack)
            .unwrap_or_else(|_| "No tech stack data".to_string())
    };

    format!(
        r#"Generate comprehensive setup and installation instructions for this repository:

Repository: {name}
Primary Language: {language}

{readme}

Package Files:
{manifests}

Detected Tech Stack:
{stack}

Please provide step-by-step setup instructions including:
1. Prerequisites and system requirements
2. Installation steps
3. Configuration requirements
4. How to run/start the application
5. Basic usage examples
6. Common troubleshooting tips

Format as clear, numbered steps without markdown headers.
Be specific about commands and file locations where possible."#,
        name = ctx.info.name,
        language = or_na(ctx.info.language.as_deref()),
        readme = readme_block(ctx.readme, SETUP_README_CHARS, "README Content (first 2000 chars):"),
        manifests = format_manifests(ctx.manifests),
        stack = stack,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn info() -> RepositoryInfo {
        RepositoryInfo {
            name: "Hello-World".to_string(),
            description: Some("My first repository".to_string()),
            language: Some("Rust".to_string()),
            stargazers_count: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_summary_prompt_truncates_readme() {
        let info = info();
        let languages = LanguageStats::new();
        let readme = ReadmeFile {
            filename: "README.md".to_string(),
            content: "x".repeat(SUMMARY_README_CHARS + 500),
        };
        let ctx = PromptContext {
            info: &info,
            languages: &languages,
            readme: Some(&readme),
            manifests: &[],
            tree: &[],
        };
        let prompt = summary_prompt(&ctx);
        assert!(prompt.contains("Hello-World"));
        assert!(prompt.contains(&"x".repeat(SUMMARY_README_CHARS)));
        assert!(!prompt.contains(&"x".repeat(SUMMARY_README_CHARS + 1)));
        assert!(prompt.contains("No package files found"));
    }

    #[test]
    fn test_tech_stack_prompt_samples_tree_and_manifests() {
        let info = info();
        let mut languages = LanguageStats::new();
        languages.insert("Rust".to_string(), 1000);
        let manifests = vec![ManifestFile {
            filename: "Cargo.toml".to_string(),
            content: "y".repeat(MANIFEST_EXCERPT_CHARS * 2),
        }];
        let tree: Vec<FileNode> = (0..60)
            .map(|i| FileNode {
                name: format!("file{}.rs", i),
                path: format!("file{}.rs", i),
                kind: EntryKind::File,
                size: 10,
                download_url: None,
                children: None,
            })
            .collect();
        let ctx = PromptContext {
            info: &info,
            languages: &languages,
            readme: None,
            manifests: &manifests,
            tree: &tree,
        };
        let prompt = tech_stack_prompt(&ctx);
        assert!(prompt.contains("file49.rs"));
        assert!(!prompt.contains("file50.rs"));
        assert!(!prompt.contains(&"y".repeat(MANIFEST_EXCERPT_CHARS + 1)));
        assert!(prompt.contains("\"package_managers\""));
    }
}
