//! Markdown heading extraction

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// `## Title`, `### Title`, `#### Title` with optional closing hashes
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}(#{2,4})\s+(.*?)\s*#*\s*$").expect("valid heading regex"));

/// Leading ordinal such as `1.`, `2)` or `3 -`
static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s*[.)\-:]?\s*").expect("valid ordinal regex"));

/// One expected heading and the trimmed text under it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// Result of matching a document against an ordered heading list.
///
/// Every expected heading appears in `sections`, in the order requested.
/// Headings not found in the text map to an empty body and are listed in
/// `missing`; `complete` is false whenever `missing` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionExtraction {
    pub sections: Vec<Section>,
    pub missing: Vec<String>,
    pub complete: bool,
}

impl SectionExtraction {
    /// Body for a heading, empty if it was missing
    pub fn get(&self, heading: &str) -> &str {
        self.sections
            .iter()
            .find(|s| s.heading == heading)
            .map(|s| s.body.as_str())
            .unwrap_or("")
    }
}

/// Split `text` into the bodies of the `expected` headings.
///
/// A heading matches when its text, stripped of a leading ordinal and
/// emphasis markers, starts with the expected heading (case-insensitive).
/// This keeps `### 데이터 스키마 (주요 컬럼 및 설명)` matching `데이터 스키마`.
/// A section ends at the next heading of the same or higher level, or at
/// any heading that matches another expected entry. The first occurrence of
/// a heading wins. Expected entries that normalize to the same title are
/// collapsed into the first one.
pub fn extract_sections(text: &str, expected: &[&str]) -> SectionExtraction {
    let mut wanted: Vec<String> = Vec::with_capacity(expected.len());
    let mut unique: Vec<&str> = Vec::with_capacity(expected.len());
    for heading in expected {
        let key = normalize(heading);
        if !wanted.contains(&key) {
            wanted.push(key);
            unique.push(*heading);
        }
    }
    let expected = unique;
    let mut bodies: Vec<Option<Vec<&str>>> = vec![None; expected.len()];

    // (index into expected, heading level) of the section being collected
    let mut current: Option<(usize, usize)> = None;

    for line in text.lines() {
        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len();
            let title = normalize(&caps[2]);
            let matched = wanted
                .iter()
                .position(|w| !w.is_empty() && title.starts_with(w.as_str()));

            match matched {
                Some(idx) => {
                    if bodies[idx].is_none() {
                        bodies[idx] = Some(Vec::new());
                        current = Some((idx, level));
                    } else {
                        current = None;
                    }
                    continue;
                }
                None => {
                    if matches!(current, Some((_, open_level)) if level <= open_level) {
                        current = None;
                        continue;
                    }
                }
            }
        }

        if let Some((idx, _)) = current {
            if let Some(lines) = bodies[idx].as_mut() {
                lines.push(line);
            }
        }
    }

    let mut sections = Vec::with_capacity(expected.len());
    let mut missing = Vec::new();

    for (heading, body) in expected.iter().zip(bodies) {
        let body = match body {
            Some(lines) => trim_body(&lines.join("\n")),
            None => {
                missing.push(heading.to_string());
                String::new()
            }
        };
        sections.push(Section {
            heading: heading.to_string(),
            body,
        });
    }

    if !missing.is_empty() {
        warn!("Missing expected headings: {}", missing.join(", "));
    }

    SectionExtraction {
        complete: missing.is_empty(),
        sections,
        missing,
    }
}

fn normalize(heading: &str) -> String {
    let stripped = heading.trim().trim_matches(|c| c == '*' || c == '_').trim();
    ORDINAL.replace(stripped, "").trim().to_lowercase()
}

/// Trim surrounding blank lines and a trailing `---` rule
fn trim_body(body: &str) -> String {
    let trimmed = body.trim();
    trimmed
        .strip_suffix("---")
        .map(str::trim_end)
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADINGS: [&str; 4] = ["문제 배경", "해결하고자 하는 문제", "AI 모델의 역할", "기대 효과"];

    #[test]
    fn test_extracts_numbered_headings_in_order() {
        let text = "intro line\n\n### 1. 문제 배경\n배경 설명\n\n### 2. 해결하고자 하는 문제\n핵심 문제\n### 3. AI 모델의 역할\n입력 -> 출력\n### 4. 기대 효과\n20% 단축\n";
        let result = extract_sections(text, &HEADINGS);

        assert!(result.complete);
        assert!(result.missing.is_empty());
        assert_eq!(result.get("문제 배경"), "배경 설명");
        assert_eq!(result.get("해결하고자 하는 문제"), "핵심 문제");
        assert_eq!(result.get("AI 모델의 역할"), "입력 -> 출력");
        assert_eq!(result.get("기대 효과"), "20% 단축");
    }

    #[test]
    fn test_repeated_expected_heading_is_found_once() {
        let text = "### 문제 배경\nA\n### 기대 효과\nB";
        let result = extract_sections(text, &["문제 배경", "기대 효과", "1. 문제 배경"]);

        assert!(result.complete);
        assert!(result.missing.is_empty());
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.get("문제 배경"), "A");
        assert_eq!(result.get("기대 효과"), "B");
    }

    #[test]
    fn test_missing_heading_maps_to_empty_and_flags_incomplete() {
        let text = "### 문제 배경\nA\n### 기대 효과\nB";
        let result = extract_sections(text, &HEADINGS);

        assert!(!result.complete);
        assert_eq!(result.missing, vec!["해결하고자 하는 문제", "AI 모델의 역할"]);
        assert_eq!(result.get("해결하고자 하는 문제"), "");
        assert_eq!(result.sections.len(), 4);
    }

    #[test]
    fn test_heading_suffix_and_case_are_tolerated() {
        let text = "## Data Schema (main columns)\n| a | b |\n#### **data source**\nwarehouse";
        let result = extract_sections(text, &["Data source", "data schema"]);

        assert!(result.complete);
        assert_eq!(result.get("data schema"), "| a | b |");
        assert_eq!(result.get("Data source"), "warehouse");
    }

    #[test]
    fn test_deeper_unknown_heading_stays_in_body() {
        let text = "### 모델 유형\n분류\n#### 참고\n세부\n### 다른 섹션\n무시";
        let result = extract_sections(text, &["모델 유형"]);

        assert_eq!(result.get("모델 유형"), "분류\n#### 참고\n세부");
    }

    #[test]
    fn test_trailing_rule_is_trimmed() {
        let text = "### 문제 배경\n내용\n\n---\n";
        let result = extract_sections(text, &["문제 배경"]);
        assert_eq!(result.get("문제 배경"), "내용");
    }

    #[test]
    fn test_garbage_input_never_panics() {
        for text in ["", "###", "### \n###\n", "#####  x", "\u{0}\u{1}### ###"] {
            let result = extract_sections(text, &HEADINGS);
            assert!(!result.complete);
            assert_eq!(result.sections.len(), HEADINGS.len());
        }
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "### 문제 배경\nA\n### 기대 효과\nB";
        assert_eq!(extract_sections(text, &HEADINGS), extract_sections(text, &HEADINGS));
    }
}
