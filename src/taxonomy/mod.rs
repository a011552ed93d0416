//! Local, deterministic classification used whenever the language model
//! cannot answer.

pub mod files;
pub mod languages;

use std::collections::BTreeMap;

use crate::models::{
    ranked_languages, FileNode, LanguageStats, ManifestFile, ReadmeFile, RepositoryInfo, TechStack,
};

pub use files::categorize_files;
pub use languages::detect_language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolKind {
    PackageManager,
    BuildTool,
}

struct ManifestRule {
    filename: &'static str,
    tool: &'static str,
    kind: ToolKind,
    install: &'static str,
}

#[rustfmt::skip]
const MANIFEST_RULES: &[ManifestRule] = &[
    ManifestRule { filename: "package.json", tool: "npm", kind: ToolKind::PackageManager, install: "npm install" },
    ManifestRule { filename: "requirements.txt", tool: "pip", kind: ToolKind::PackageManager, install: "pip install -r requirements.txt" },
    ManifestRule { filename: "Pipfile", tool: "pip", kind: ToolKind::PackageManager, install: "pipenv install" },
    ManifestRule { filename: "poetry.lock", tool: "poetry", kind: ToolKind::PackageManager, install: "poetry install" },
    ManifestRule { filename: "Gemfile", tool: "bundler", kind: ToolKind::PackageManager, install: "bundle install" },
    ManifestRule { filename: "composer.json", tool: "composer", kind: ToolKind::PackageManager, install: "composer install" },
    ManifestRule { filename: "pom.xml", tool: "maven", kind: ToolKind::BuildTool, install: "mvn install" },
    ManifestRule { filename: "build.gradle", tool: "gradle", kind: ToolKind::BuildTool, install: "gradle build" },
    ManifestRule { filename: "Cargo.toml", tool: "cargo", kind: ToolKind::PackageManager, install: "cargo build" },
    ManifestRule { filename: "go.mod", tool: "go modules", kind: ToolKind::PackageManager, install: "go mod download" },
    ManifestRule { filename: "pubspec.yaml", tool: "pub", kind: ToolKind::PackageManager, install: "dart pub get" },
    ManifestRule { filename: "Package.swift", tool: "swift package manager", kind: ToolKind::PackageManager, install: "swift build" },
];

fn rule_for(filename: &str) -> Option<&'static ManifestRule> {
    MANIFEST_RULES.iter().find(|rule| rule.filename == filename)
}

fn push_unique(items: &mut Vec<String>, value: &str) {
    if !items.iter().any(|existing| existing == value) {
        items.push(value.to_string());
    }
}

/// Languages seen in the tree, most files first.
pub fn languages_from_tree(tree: &[FileNode]) -> Vec<String> {
    fn count(nodes: &[FileNode], counts: &mut BTreeMap<&'static str, usize>) {
        for node in nodes {
            match &node.children {
                Some(children) => count(children, counts),
                None if !node.is_dir() => {
                    if let Some(language) = detect_language(&node.name) {
                        *counts.entry(language).or_default() += 1;
                    }
                }
                None => {}
            }
        }
    }

    let mut counts = BTreeMap::new();
    count(tree, &mut counts);

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().map(|(language, _)| language.to_string()).collect()
}

/// Minimal stack built only from language statistics and manifest names.
pub fn fallback_tech_stack(
    languages: &LanguageStats,
    manifests: &[ManifestFile],
    tree: &[FileNode],
) -> TechStack {
    let mut stack = TechStack {
        primary_languages: if languages.is_empty() {
            languages_from_tree(tree)
        } else {
            ranked_languages(languages)
                .into_iter()
                .map(|share| share.language)
                .collect()
        },
        ..TechStack::default()
    };

    for manifest in manifests {
        let Some(rule) = rule_for(&manifest.filename) else {
            continue;
        };
        match rule.kind {
            ToolKind::PackageManager => push_unique(&mut stack.package_managers, rule.tool),
            ToolKind::BuildTool => push_unique(&mut stack.build_tools, rule.tool),
        }
    }

    stack
}

/// First prose paragraph of a README, skipping headings, badges and markup.
fn readme_lead(readme: &ReadmeFile) -> Option<String> {
    readme
        .content
        .split("\n\n")
        .map(|para| {
            para.lines()
                .map(str::trim)
                .filter(|line| {
                    !line.is_empty()
                        && !line.starts_with('#')
                        && !line.starts_with("[!")
                        && !line.starts_with("![")
                        && !line.starts_with('<')
                        && !line.starts_with("===")
                        && !line.starts_with("---")
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|para| !para.is_empty())
        .map(|para| crate::llm::prompts::truncate_chars(&para, 400).to_string())
}

pub fn fallback_summary(
    info: &RepositoryInfo,
    readme: Option<&ReadmeFile>,
    manifests: &[ManifestFile],
) -> String {
    let mut summary = match info.language.as_deref() {
        Some(language) => format!("{} is a {} project", info.name, language),
        None => format!("{} is a software project", info.name),
    };
    let description = info
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if let Some(description) = description {
        summary.push_str(": ");
        summary.push_str(description);
    }
    if !summary.ends_with(['.', '!', '?']) {
        summary.push('.');
    }
    summary.push_str(&format!(
        " It has {} stars and {} forks.",
        info.stargazers_count, info.forks_count
    ));

    if !info.topics.is_empty() {
        summary.push_str(&format!(" Topics: {}.", info.topics.join(", ")));
    }

    if !manifests.is_empty() {
        let names: Vec<&str> = manifests.iter().map(|m| m.filename.as_str()).collect();
        summary.push_str(&format!(" Dependency manifests: {}.", names.join(", ")));
    }

    if let Some(lead) = readme.and_then(readme_lead) {
        summary.push_str("\n\n");
        summary.push_str(&lead);
    }

    summary
}

pub fn fallback_setup_instructions(
    info: &RepositoryInfo,
    readme: Option<&ReadmeFile>,
    manifests: &[ManifestFile],
) -> String {
    let full_name = if info.full_name.is_empty() {
        format!("{}/{}", info.owner.login, info.name)
    } else {
        info.full_name.clone()
    };

    let mut steps = vec![format!(
        "Clone the repository: git clone https://github.com/{}.git && cd {}",
        full_name, info.name
    )];

    let installs: Vec<&str> = manifests
        .iter()
        .filter_map(|m| rule_for(&m.filename))
        .map(|rule| rule.install)
        .collect();
    if installs.is_empty() {
        steps.push(
            "No dependency manifest was found; check the project documentation for prerequisites."
                .to_string(),
        );
    } else {
        steps.push(format!("Install dependencies: {}", installs.join("; ")));
    }

    match readme {
        Some(readme) => steps.push(format!(
            "Follow {} for configuration and run instructions.",
            readme.filename
        )),
        None => steps.push(
            "Inspect the source tree for an entry point and run it with the toolchain above."
                .to_string(),
        ),
    }

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}
