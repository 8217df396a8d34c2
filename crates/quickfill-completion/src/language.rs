/// Language identification for completion
///
/// The engine knows three language targets. Every lookup that misses falls
/// back to C++, which is also the language the reserved-word and snippet
/// tables use as their default.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C++ (the default target)
    #[default]
    Cpp,
    /// Java
    Java,
    /// Python
    Python,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 3] = [Language::Cpp, Language::Java, Language::Python];

    /// Resolve a language tag such as `"cpp"` or `"python"`
    ///
    /// # Example
    ///
    /// ```ignore
    /// assert_eq!(Language::from_tag("java"), Language::Java);
    /// assert_eq!(Language::from_tag("haskell"), Language::Cpp);
    /// ```
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "cpp" | "c++" | "cc" | "cxx" => Language::Cpp,
            "java" => Language::Java,
            "python" | "py" | "python3" => Language::Python,
            _ => Language::Cpp,
        }
    }

    /// Resolve a free-form label shown by the host editor, e.g. `"C++ (g++ 5.4)"`
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("c++") {
            Language::Cpp
        } else if label.contains("java") {
            Language::Java
        } else if label.contains("python") {
            Language::Python
        } else {
            Language::Cpp
        }
    }

    /// Convert language to the tag sent over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
