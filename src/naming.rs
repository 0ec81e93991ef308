//! Identifier re-casing for emission
//!
//! Identifiers are stored in source casing. Back-ends strip legacy prefixes
//! (`m_`, `s_`, one leading `_`) and re-case to their own convention; dunder
//! names such as `__init__` pass through untouched.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    /// `user_name`
    Snake,
    /// `userName`
    Camel,
    /// `UserName`
    Pascal,
    /// `USER_NAME`
    ScreamingSnake,
}

pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// Remove member-prefix conventions that carry no meaning in the target
pub fn strip_legacy_prefix(name: &str) -> &str {
    if is_dunder(name) {
        return name;
    }
    let stripped = ["m_", "s_"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .or_else(|| name.strip_prefix('_'))
        .unwrap_or(name);
    if stripped.is_empty() || stripped.starts_with(|c: char| c.is_ascii_digit()) {
        name
    } else {
        stripped
    }
}

/// Split an identifier into lowercase words.
///
/// Boundaries are separators, lower-to-upper transitions and the end of an
/// acronym (`HTTPServer` splits into `http` and `server`). Digits stay
/// attached to the word before them.
pub fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(ch.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Re-case an identifier without touching its prefix
pub fn recase(name: &str, case: Case) -> String {
    if is_dunder(name) {
        return name.to_string();
    }
    let parts = words(name);
    if parts.is_empty() {
        return name.to_string();
    }

    match case {
        Case::Snake => parts.join("_"),
        Case::ScreamingSnake => parts.join("_").to_uppercase(),
        Case::Pascal => parts.iter().map(|w| capitalize(w)).collect(),
        Case::Camel => {
            let mut out = parts[0].clone();
            for word in &parts[1..] {
                out.push_str(&capitalize(word));
            }
            out
        }
    }
}

/// Strip legacy prefixes, then re-case
pub fn convert(name: &str, case: Case) -> String {
    recase(strip_legacy_prefix(name), case)
}

/// Make `name` a legal Rust identifier, using a raw identifier for keywords
pub fn rust_ident(name: &str) -> String {
    if syn::parse_str::<syn::Ident>(name).is_ok() {
        return name.to_string();
    }
    let raw = format!("r#{}", name);
    if syn::parse_str::<syn::Ident>(&raw).is_ok() {
        raw
    } else {
        // self, super, crate and Self cannot be raw
        format!("{}_", name)
    }
}

/// Append `_` to reserved words of a keyword-list target
pub fn escape_reserved(name: &str, reserved: &[&str]) -> String {
    if reserved.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_on_case_and_acronyms() {
        assert_eq!(words("userName"), vec!["user", "name"]);
        assert_eq!(words("HTTPServer"), vec!["http", "server"]);
        assert_eq!(words("parse_json_v2"), vec!["parse", "json", "v2"]);
        assert_eq!(words("toInt32"), vec!["to", "int32"]);
    }

    #[test]
    fn test_legacy_prefixes() {
        assert_eq!(strip_legacy_prefix("m_count"), "count");
        assert_eq!(strip_legacy_prefix("s_instance"), "instance");
        assert_eq!(strip_legacy_prefix("_hidden"), "hidden");
        assert_eq!(strip_legacy_prefix("__init__"), "__init__");
        assert_eq!(strip_legacy_prefix("_"), "_");
    }

    #[test]
    fn test_convert_between_conventions() {
        assert_eq!(convert("m_firstName", Case::Snake), "first_name");
        assert_eq!(convert("first_name", Case::Camel), "firstName");
        assert_eq!(convert("user_account", Case::Pascal), "UserAccount");
        assert_eq!(convert("maxSize", Case::ScreamingSnake), "MAX_SIZE");
        assert_eq!(convert("__str__", Case::Camel), "__str__");
    }

    #[test]
    fn test_rust_keywords_are_escaped() {
        assert_eq!(rust_ident("count"), "count");
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("self"), "self_");
    }
}
