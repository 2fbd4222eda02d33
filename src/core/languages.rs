//! Target languages: the configured list, the audio API's list, or a builtin one.

use serde::{Deserialize, Serialize};

const BUILTIN: [(&str, &str); 6] = [
    ("english", "en"),
    ("spanish", "es"),
    ("french", "fr"),
    ("german", "de"),
    ("japanese", "ja"),
    ("italian", "it"),
];

pub const FALLBACK_CODE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOption {
    pub value: String,
    pub label: String,
    pub code: Option<String>,
}

impl LanguageOption {
    pub fn from_name(name: &str) -> Self {
        let value = name.trim().to_lowercase();
        LanguageOption {
            label: capitalize(&value),
            code: builtin_code(&value).map(str::to_string),
            value,
        }
    }

    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or(FALLBACK_CODE)
    }
}

/// Entries of `GET /languages`: bare names or objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LanguageEntry {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn builtin_code(value: &str) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, code)| *code)
}

pub fn builtin_languages() -> Vec<LanguageOption> {
    BUILTIN
        .iter()
        .map(|(name, _)| LanguageOption::from_name(name))
        .collect()
}

pub fn from_names(names: &[String]) -> Vec<LanguageOption> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| LanguageOption::from_name(n))
        .collect()
}

/// Decode a `/languages` response body.
pub fn parse_payload(body: &str) -> Result<Vec<LanguageOption>, serde_json::Error> {
    let entries: Vec<LanguageEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            LanguageEntry::Name(name) if !name.trim().is_empty() => {
                Some(LanguageOption::from_name(&name))
            }
            LanguageEntry::Name(_) => None,
            LanguageEntry::Detailed { name, value, code } => {
                let value = value.or_else(|| name.clone())?.trim().to_lowercase();
                if value.is_empty() {
                    return None;
                }
                let label = name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| capitalize(&value));
                let code = code
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .or_else(|| builtin_code(&value).map(str::to_string));
                Some(LanguageOption { value, label, code })
            }
        })
        .collect())
}

/// Configured names win, then whatever the audio API returned, then the builtin list.
pub fn resolve(configured: &[String], fetched: Option<Vec<LanguageOption>>) -> Vec<LanguageOption> {
    if !configured.is_empty() {
        return from_names(configured);
    }
    match fetched {
        Some(list) if !list.is_empty() => list,
        _ => builtin_languages(),
    }
}

/// Case-insensitive lookup by value or label.
pub fn find<'a>(available: &'a [LanguageOption], name: &str) -> Option<&'a LanguageOption> {
    let name = name.trim();
    available
        .iter()
        .find(|l| l.value.eq_ignore_ascii_case(name) || l.label.eq_ignore_ascii_case(name))
}

/// ISO code for `language`, `en` when unknown.
pub fn language_code(available: &[LanguageOption], language: &str) -> String {
    find(available, language)
        .and_then(|l| l.code.clone())
        .or_else(|| builtin_code(language.trim()).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_CODE.to_string())
}

/// Pick the language for a locale base such as `es`: by code, then by name
/// prefix, then the first entry.
pub fn match_language(available: &[LanguageOption], locale_base: &str) -> Option<String> {
    let base = locale_base.trim().to_lowercase();
    available
        .iter()
        .find(|l| l.code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(&base)))
        .or_else(|| {
            available
                .iter()
                .find(|l| !base.is_empty() && l.value.to_lowercase().starts_with(&base))
        })
        .or_else(|| available.first())
        .map(|l| l.value.clone())
}

/// Language part of the POSIX locale (`es_ES.UTF-8` → `es`).
pub fn locale_base<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| {
            value
                .split(['_', '-', '.', '@'])
                .next()
                .unwrap_or_default()
                .to_lowercase()
        })
        .find(|base| !base.is_empty() && base != "c" && base != "posix")
        .unwrap_or_else(|| FALLBACK_CODE.to_string())
}

pub fn system_locale_base() -> String {
    locale_base(|name| std::env::var(name).ok())
}
