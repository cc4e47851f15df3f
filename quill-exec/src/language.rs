use crate::error::RunError;

/// A language the execution service can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Name used in `data-language` attributes.
    pub name: &'static str,
    pub display: &'static str,
    /// Judge0 `language_id`.
    pub id: u32,
}

pub const SUPPORTED_LANGUAGES: [Language; 12] = [
    Language { name: "javascript", display: "JavaScript", id: 63 },
    Language { name: "python", display: "Python", id: 71 },
    Language { name: "java", display: "Java", id: 62 },
    Language { name: "cpp", display: "C++", id: 54 },
    Language { name: "c", display: "C", id: 50 },
    Language { name: "csharp", display: "C#", id: 51 },
    Language { name: "php", display: "PHP", id: 68 },
    Language { name: "ruby", display: "Ruby", id: 72 },
    Language { name: "go", display: "Go", id: 60 },
    Language { name: "rust", display: "Rust", id: 73 },
    Language { name: "sql", display: "SQL", id: 82 },
    Language { name: "bash", display: "Bash", id: 46 },
];

pub const JAVASCRIPT: &Language = &SUPPORTED_LANGUAGES[0];

/// Comma separated display names, in table order.
pub fn supported_list() -> String {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|l| l.display)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Case-insensitive lookup.
pub fn lookup_language(name: &str) -> Result<&'static Language, RunError> {
    let wanted = name.trim().to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| l.name == wanted)
        .ok_or_else(|| RunError::Unsupported {
            language: name.to_string(),
            supported: supported_list(),
        })
}
