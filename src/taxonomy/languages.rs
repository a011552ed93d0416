/// Extension to language, for files the languages endpoint did not cover.
const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("py", "Python"),
    ("pyw", "Python"),
    ("pyx", "Python"),
    ("js", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("go", "Go"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("scala", "Scala"),
    ("clj", "Clojure"),
    ("groovy", "Groovy"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("hxx", "C++"),
    ("cs", "C#"),
    ("swift", "Swift"),
    ("m", "Objective-C"),
    ("mm", "Objective-C++"),
    ("rb", "Ruby"),
    ("rake", "Ruby"),
    ("php", "PHP"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("hs", "Haskell"),
    ("ml", "OCaml"),
    ("fs", "F#"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("ps1", "PowerShell"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("sql", "SQL"),
    ("lua", "Lua"),
    ("r", "R"),
    ("pl", "Perl"),
    ("dart", "Dart"),
    ("zig", "Zig"),
    ("jl", "Julia"),
    ("sol", "Solidity"),
    ("tf", "HCL"),
];

pub fn detect_language(filename: &str) -> Option<&'static str> {
    let lower = filename.to_lowercase();
    if lower == "dockerfile" || lower.starts_with("dockerfile.") {
        return Some("Dockerfile");
    }
    if lower == "makefile" || lower == "gnumakefile" {
        return Some("Makefile");
    }
    if lower.ends_with(".d.ts") {
        return Some("TypeScript");
    }

    let (_, extension) = lower.rsplit_once('.')?;
    EXTENSION_LANGUAGES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

/// File extension in lowercase, without the dot. Dotfiles have none.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
