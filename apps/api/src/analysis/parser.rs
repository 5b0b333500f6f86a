//! Response Parser — turns free-form model output into the four report sections.
//!
//! # Section scan
//! Markers are searched in section order, each one only after the previous marker found.
//! A section body runs from its marker to the next marker that was actually found, so a
//! missing marker leaves its own section empty without swallowing its neighbours.
//! Duplicate markers: the first occurrence wins.
//!
//! # Reference split
//! Within a section, everything after the references header is a citation list, one
//! entry per line, with bullets, numbering and `#출처N:` / `referenceN:` labels removed.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::prompts::REFERENCES_HEADER;
use crate::models::analysis::{AnalysisResult, Section, SectionContent};

/// Markdown decoration allowed between the start of a line and a section marker.
const HEADING_DECORATION: &[char] = &['#', '*', ' ', '\t'];
/// Same for the references header, which the model usually wraps in brackets.
const REFERENCES_DECORATION: &[char] = &['#', '*', ' ', '\t', '['];
/// Leftovers after the references header on its own line.
const HEADER_TAIL: &[char] = &[']', '*', ':', '：', ' ', '\t', '\r'];

static REFERENCE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:[-*•·]\s*|\d+[.)]\s+|\[\d+\]\s*)?(?:#?(?:출처|reference)\s*\d+\s*[:：]?|#?(?:출처|reference)\s*[:：])?\s*",
    )
    .expect("reference prefix pattern is valid")
});

/// A located marker: where its heading line begins and where its body begins.
#[derive(Debug, Clone, Copy)]
struct MarkerHit {
    section: Section,
    heading_start: usize,
    body_start: usize,
}

/// Splits raw completion text into the four sections. Never fails; missing sections are empty.
pub fn parse_sections(text: &str) -> AnalysisResult {
    let mut hits: Vec<MarkerHit> = Vec::with_capacity(Section::ALL.len());
    let mut cursor = 0;

    for section in Section::ALL {
        let marker = section.title();
        let Some(offset) = find_ignore_ascii_case(&text[cursor..], marker) else {
            continue;
        };
        let pos = cursor + offset;
        let heading_start = decorated_line_start(text, pos, HEADING_DECORATION).max(cursor);
        let body_start = skip_marker_tail(text, pos + marker.len());
        hits.push(MarkerHit {
            section,
            heading_start,
            body_start,
        });
        cursor = body_start;
    }

    let mut result = AnalysisResult::default();
    for (i, hit) in hits.iter().enumerate() {
        let end = hits
            .get(i + 1)
            .map(|next| next.heading_start)
            .unwrap_or(text.len())
            .max(hit.body_start);
        result.set(hit.section, text[hit.body_start..end].trim());
    }
    result
}

/// Splits one section into display body and reference list.
/// Without a references header the whole input is the body.
pub fn parse_section_with_references(section: &str) -> SectionContent {
    let bracketed = format!("[{REFERENCES_HEADER}]");
    let located = section
        .find(&bracketed)
        .map(|pos| (pos, bracketed.len()))
        .or_else(|| section.find(REFERENCES_HEADER).map(|pos| (pos, REFERENCES_HEADER.len())));

    let Some((pos, header_len)) = located else {
        return SectionContent {
            body: section.trim().to_string(),
            references: Vec::new(),
        };
    };

    let body_end = decorated_line_start(section, pos, REFERENCES_DECORATION);
    let body = section[..body_end].trim().to_string();

    let references = section[pos + header_len..]
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            // The header line itself may carry trailing `]`, `**` or `:`.
            let line = if i == 0 { line.trim_start_matches(HEADER_TAIL) } else { line };
            clean_reference_line(line)
        })
        .collect();

    SectionContent { body, references }
}

/// Parses every section of a result into body + references, in section order.
pub fn section_contents(result: &AnalysisResult) -> Vec<(Section, SectionContent)> {
    result
        .iter()
        .map(|(section, raw)| (section, parse_section_with_references(raw)))
        .collect()
}

fn clean_reference_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let cleaned = REFERENCE_PREFIX.replace(line, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Byte offset of the first match of `needle`, comparing ASCII letters case-insensitively.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    let bytes = haystack.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| bytes.len() - i >= needle.len() && bytes[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// If only `decoration` characters sit between the start of the line and `pos`,
/// returns the line start; otherwise `pos`.
fn decorated_line_start(text: &str, pos: usize, decoration: &[char]) -> usize {
    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if text[line_start..pos].chars().all(|c| decoration.contains(&c)) {
        line_start
    } else {
        pos
    }
}

/// Skips a closing `**` and an optional `:` after a marker.
fn skip_marker_tail(text: &str, mut pos: usize) -> usize {
    let rest = &text[pos..];
    if rest.starts_with("**") {
        pos += 2;
    }
    let trimmed = text[pos..].trim_start_matches([' ', '\t']);
    pos = text.len() - trimmed.len();
    if let Some(c) = trimmed.chars().next().filter(|c| *c == ':' || *c == '：') {
        pos += c.len_utf8();
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = "\
# 시장 현황
국내 시장은 성장 중입니다.

## UI/UX 패턴 분석
하단 탭바 패턴이 일반적입니다.

## 장단점 비교
**장점**: 빠름

## 인사이트 도출
온보딩을 단순화하세요.
";

    #[test]
    fn test_parse_sections_all_markers() {
        let result = parse_sections(FULL_RESPONSE);
        assert_eq!(result.get(Section::Market), "국내 시장은 성장 중입니다.");
        assert_eq!(result.get(Section::Patterns), "하단 탭바 패턴이 일반적입니다.");
        assert_eq!(result.get(Section::Tradeoffs), "**장점**: 빠름");
        assert_eq!(result.get(Section::Insights), "온보딩을 단순화하세요.");
    }

    #[test]
    fn test_parse_sections_reproduces_text_between_bare_markers() {
        let bodies = ["alpha one", "beta\ntwo", "gamma three", "delta four"];
        let mut text = String::new();
        for (section, body) in Section::ALL.iter().zip(bodies) {
            text.push_str(section.title());
            text.push('\n');
            text.push_str(body);
            text.push_str("\n\n");
        }
        let result = parse_sections(&text);
        for (section, body) in Section::ALL.iter().zip(bodies) {
            assert_eq!(result.get(*section), body);
        }
    }

    #[test]
    fn test_parse_sections_missing_marker_leaves_only_that_section_empty() {
        let text = "시장 현황\nmarket\nUI/UX 패턴 분석\npatterns\n인사이트 도출\ninsights";
        let result = parse_sections(text);
        assert_eq!(result.get(Section::Market), "market");
        assert_eq!(result.get(Section::Patterns), "patterns");
        assert_eq!(result.get(Section::Tradeoffs), "");
        assert_eq!(result.get(Section::Insights), "insights");
    }

    #[test]
    fn test_parse_sections_no_markers_is_all_empty() {
        let result = parse_sections("just some prose without headings");
        assert!(result.is_empty());
        assert_eq!(result.iter().count(), 4);
    }

    #[test]
    fn test_parse_sections_marker_is_ascii_case_insensitive_with_colon() {
        let text = "시장 현황: m\n**ui/ux 패턴 분석**: p\n장단점 비교：t\n인사이트 도출 i";
        let result = parse_sections(text);
        assert_eq!(result.get(Section::Market), "m");
        assert_eq!(result.get(Section::Patterns), "p");
        assert_eq!(result.get(Section::Tradeoffs), "t");
        assert_eq!(result.get(Section::Insights), "i");
    }

    #[test]
    fn test_parse_sections_duplicate_marker_takes_first() {
        let text = "시장 현황\nfirst\n시장 현황\nsecond\nUI/UX 패턴 분석\np";
        let result = parse_sections(text);
        assert_eq!(result.get(Section::Market), "first\n시장 현황\nsecond");
        assert_eq!(result.get(Section::Patterns), "p");
    }

    #[test]
    fn test_parse_sections_out_of_order_marker_is_skipped() {
        let text = "UI/UX 패턴 분석\np\n시장 현황\nm";
        let result = parse_sections(text);
        assert_eq!(result.get(Section::Market), "m");
        assert_eq!(result.get(Section::Patterns), "");
    }

    #[test]
    fn test_references_split_round_trip() {
        let body = "본문 첫 줄\n본문 둘째 줄 #출처1";
        let refs = ["Nielsen Norman Group, https://www.nngroup.com", "WCAG 2.1", "Material Design Guidelines"];
        let raw = format!(
            "{body}\n\n[{REFERENCES_HEADER}]\n{}",
            refs.iter()
                .enumerate()
                .map(|(i, r)| format!("#출처{}: {r}", i + 1))
                .collect::<Vec<_>>()
                .join("\n")
        );
        let content = parse_section_with_references(&raw);
        assert_eq!(content.body, body);
        assert_eq!(content.references, refs);
    }

    #[test]
    fn test_references_strip_bullets_numbers_and_english_labels() {
        let raw = "body\n**[참고 문헌 및 출처]**\n- reference1: NN/g\n2. Toss UX 리포트\n* Reference 3: 정부24\n\n• 출처4：KWCAG";
        let content = parse_section_with_references(raw);
        assert_eq!(content.body, "body");
        assert_eq!(content.references, ["NN/g", "Toss UX 리포트", "정부24", "KWCAG"]);
    }

    #[test]
    fn test_references_header_without_brackets_and_inline_first_entry() {
        let raw = "body text\n### 참고 문헌 및 출처: #출처1: WCAG 2.1\n#출처2: Apple HIG";
        let content = parse_section_with_references(raw);
        assert_eq!(content.body, "body text");
        assert_eq!(content.references, ["WCAG 2.1", "Apple HIG"]);
    }

    #[test]
    fn test_references_absent_header_keeps_whole_body() {
        let content = parse_section_with_references("  only body  ");
        assert_eq!(content.body, "only body");
        assert!(content.references.is_empty());
    }

    #[test]
    fn test_reference_numbers_in_content_survive() {
        let content = parse_section_with_references("b\n[참고 문헌 및 출처]\nWCAG 2.1 guidelines");
        assert_eq!(content.references, ["WCAG 2.1 guidelines"]);
    }

    #[test]
    fn test_section_contents_covers_every_section() {
        let result = parse_sections(FULL_RESPONSE);
        let contents = section_contents(&result);
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0].0, Section::Market);
    }
}
