//! INI-style configuration parsing.
//!
//! Accepted dialect:
//!
//! - `[Section]` headers (case-sensitive names)
//! - `key = value` or `key: value` entries (keys are case-insensitive)
//! - full-line comments starting with `#` or `;`
//! - indented continuation lines appended to the previous value
//! - a `[DEFAULT]` section providing fallback values for every section

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{ConfigError, Section, DEFAULT_SECTION};

/// Compiled line patterns
struct IniPatterns {
    /// Match: "[Section]"
    section: Regex,
    /// Match: "key = value" or "key: value"
    option: Regex,
}

impl IniPatterns {
    fn new() -> Self {
        Self {
            section: Regex::new(r"^\[([^\[\]]+)\]\s*$").expect("Invalid section regex"),
            option: Regex::new(r"^([^=:\s][^=:]*?)\s*[=:]\s*(.*?)\s*$")
                .expect("Invalid option regex"),
        }
    }
}

static PATTERNS: LazyLock<IniPatterns> = LazyLock::new(IniPatterns::new);

/// Result of parsing an INI document
#[derive(Debug, Default)]
pub struct ParsedIni {
    pub sections: BTreeMap<String, Section>,
    pub defaults: Section,
}

/// Parse an INI document into sections and defaults
///
/// # Errors
/// Returns `ConfigError::Syntax` for duplicate sections, duplicate keys,
/// entries outside of any section and lines that are neither a header, an
/// entry, a comment nor a continuation.
pub fn parse(text: &str) -> Result<ParsedIni, ConfigError> {
    let mut parsed = ParsedIni::default();
    // Section currently being filled, and the last key written to it
    let mut current: Option<String> = None;
    let mut last_key: Option<String> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw_line.trim();

        if trimmed.is_empty() {
            last_key = None;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = raw_line.starts_with(|c: char| c.is_whitespace());
        if indented {
            if let (Some(section), Some(key)) = (&current, &last_key) {
                let entries = section_mut(&mut parsed, section);
                if let Some(value) = entries.get_mut(key) {
                    value.push('\n');
                    value.push_str(trimmed);
                }
                continue;
            }
        }

        if let Some(caps) = PATTERNS.section.captures(trimmed) {
            let name = caps[1].trim().to_string();
            if name != DEFAULT_SECTION && parsed.sections.contains_key(&name) {
                return Err(syntax(line_no, format!("duplicate section [{}]", name)));
            }
            if name != DEFAULT_SECTION {
                parsed.sections.insert(name.clone(), Section::new());
            }
            current = Some(name);
            last_key = None;
            continue;
        }

        if let Some(caps) = PATTERNS.option.captures(trimmed) {
            let Some(section) = &current else {
                return Err(syntax(line_no, "entry appears before any [section] header"));
            };
            let key = caps[1].trim().to_lowercase();
            let value = caps[2].to_string();
            let entries = section_mut(&mut parsed, section);
            if entries.contains_key(&key) {
                return Err(syntax(
                    line_no,
                    format!("duplicate key '{}' in section [{}]", key, section),
                ));
            }
            entries.insert(key.clone(), value);
            last_key = Some(key);
            continue;
        }

        return Err(syntax(line_no, format!("unrecognized line '{}'", trimmed)));
    }

    Ok(parsed)
}

fn section_mut<'a>(parsed: &'a mut ParsedIni, section: &str) -> &'a mut Section {
    if section == DEFAULT_SECTION {
        &mut parsed.defaults
    } else {
        parsed.sections.entry(section.to_string()).or_default()
    }
}

fn syntax(line: usize, reason: impl Into<String>) -> ConfigError {
    ConfigError::Syntax {
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_keys() {
        let text = r#"
# Cluster configuration
[CPU]
clock = 1.0GHz
memSize: 1073741824
startAddr = [0:0x00000000]

; network settings
[Network]
bandwidth = 10GB/s
"#;
        let parsed = parse(text).unwrap();
        let cpu = &parsed.sections["CPU"];
        assert_eq!(cpu["clock"], "1.0GHz");
        assert_eq!(cpu["memsize"], "1073741824");
        assert_eq!(cpu["startaddr"], "[0:0x00000000]");
        assert_eq!(parsed.sections["Network"]["bandwidth"], "10GB/s");
    }

    #[test]
    fn test_value_keeps_embedded_separators() {
        let parsed = parse("[CPU]\nmemCost = [0:1:10]\n").unwrap();
        assert_eq!(parsed.sections["CPU"]["memcost"], "[0:1:10]");
    }

    #[test]
    fn test_empty_value() {
        let parsed = parse("[CPU]\nprogram =\n").unwrap();
        assert_eq!(parsed.sections["CPU"]["program"], "");
    }

    #[test]
    fn test_continuation_lines() {
        let parsed = parse("[FatTree]\nshape = 2,2:\n  4\n").unwrap();
        assert_eq!(parsed.sections["FatTree"]["shape"], "2,2:\n4");
    }

    #[test]
    fn test_default_section() {
        let parsed = parse("[DEFAULT]\nverbose = 2\n[CPU]\nclock = 1GHz\n").unwrap();
        assert_eq!(parsed.defaults["verbose"], "2");
        assert!(!parsed.sections.contains_key(DEFAULT_SECTION));
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let err = parse("[CPU]\nclock = 1GHz\n[CPU]\nclock = 2GHz\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = parse("[CPU]\nclock = 1GHz\nClock = 2GHz\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_entry_before_section_rejected() {
        let err = parse("clock = 1GHz\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_garbage_line_rejected() {
        let err = parse("[CPU]\nthis is not an entry\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 2, .. }));
    }
}
