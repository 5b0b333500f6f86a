//! Report pagination: positions every line of the report on A4 pages.
//!
//! Pure and deterministic. `y_mm` is measured from the top edge; the PDF writer flips it.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::analysis::parser::parse_section_with_references;
use crate::analysis::prompts::REFERENCES_HEADER;
use crate::models::analysis::{AnalysisResult, Section};
use crate::report::font_metrics::HELVETICA;

pub const A4_W: f32 = 210.0;
pub const A4_H: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const MAX_WIDTH: f32 = A4_W - MARGIN * 2.0;
pub const LINE_HEIGHT: f32 = 5.5;

const TITLE_FONT: f32 = 18.0;
const SUBTITLE_FONT: f32 = 11.0;
const SECTION_FONT: f32 = 12.0;
const BODY_FONT: f32 = 10.0;
const REF_FONT: f32 = 8.0;

/// Page-break thresholds: break when `y` is past `A4_H - threshold`.
const BREAK_BEFORE_SECTION: f32 = 40.0;
const BREAK_BEFORE_BODY_LINE: f32 = 30.0;
const BREAK_BEFORE_REF_LABEL: f32 = 25.0;
const BREAK_BEFORE_REF: f32 = 15.0;

const REF_INDENT: f32 = 3.0;

pub const REPORT_TITLE: &str = "kt ds UX Insight Agent 분석 결과";

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").expect("italic pattern is valid"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[-*]\s+").expect("bullet pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStyle {
    Title,
    Subtitle,
    SectionHeading,
    Body,
    ReferenceLabel,
    Reference,
}

impl RunStyle {
    pub fn font_size_pt(self) -> f32 {
        match self {
            RunStyle::Title => TITLE_FONT,
            RunStyle::Subtitle => SUBTITLE_FONT,
            RunStyle::SectionHeading => SECTION_FONT,
            RunStyle::Body => BODY_FONT,
            RunStyle::ReferenceLabel | RunStyle::Reference => REF_FONT,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, RunStyle::Title | RunStyle::SectionHeading)
    }

    pub fn is_muted(self) -> bool {
        matches!(self, RunStyle::ReferenceLabel | RunStyle::Reference)
    }
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportLayout {
    pub pages: Vec<Vec<TextRun>>,
}

impl ReportLayout {
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.pages.iter().flatten()
    }
}

/// Write head over the pages being filled.
struct PageCursor {
    pages: Vec<Vec<TextRun>>,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: MARGIN,
        }
    }

    fn break_if_past(&mut self, threshold: f32) {
        if self.y > A4_H - threshold {
            self.pages.push(Vec::new());
            self.y = MARGIN;
        }
    }

    fn emit(&mut self, text: impl Into<String>, x_mm: f32, style: RunStyle) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        let run = TextRun {
            text,
            x_mm,
            y_mm: self.y,
            style,
        };
        if let Some(page) = self.pages.last_mut() {
            page.push(run);
        }
    }

    fn advance(&mut self, lines: f32) {
        self.y += LINE_HEIGHT * lines;
    }
}

/// Lays out the full report: title block, then every section in fixed order.
pub fn layout_report(result: &AnalysisResult, topic: &str, date: NaiveDate) -> ReportLayout {
    let mut cursor = PageCursor::new();

    cursor.emit(REPORT_TITLE, MARGIN, RunStyle::Title);
    cursor.advance(2.0);
    cursor.emit(format!("리서치 주제: {topic}"), MARGIN, RunStyle::Subtitle);
    cursor.advance(1.0);
    cursor.emit(format!("날짜: {}", format_korean_date(date)), MARGIN, RunStyle::Subtitle);
    cursor.advance(1.5);
    // Gap left by the rule under the title block.
    cursor.advance(1.5);

    for section in Section::ALL {
        layout_section(&mut cursor, section, result.get(section));
    }

    ReportLayout {
        pages: cursor.pages,
    }
}

fn layout_section(cursor: &mut PageCursor, section: Section, raw: &str) {
    let content = parse_section_with_references(raw);

    cursor.break_if_past(BREAK_BEFORE_SECTION);
    cursor.emit(section.title(), MARGIN, RunStyle::SectionHeading);
    cursor.advance(1.2);

    for line in HELVETICA.wrap(&strip_markdown(&content.body), MAX_WIDTH, BODY_FONT) {
        cursor.break_if_past(BREAK_BEFORE_BODY_LINE);
        cursor.emit(line, MARGIN, RunStyle::Body);
        cursor.advance(1.0);
    }
    cursor.advance(0.5);

    if !content.references.is_empty() {
        cursor.break_if_past(BREAK_BEFORE_REF_LABEL);
        cursor.emit(REFERENCES_HEADER, MARGIN, RunStyle::ReferenceLabel);
        cursor.advance(0.8);

        for (i, reference) in content.references.iter().enumerate() {
            cursor.break_if_past(BREAK_BEFORE_REF);
            let entry = format!("#출처{} {reference}", i + 1);
            for line in HELVETICA.wrap(&entry, MAX_WIDTH - 10.0, REF_FONT) {
                cursor.emit(line, MARGIN + REF_INDENT, RunStyle::Reference);
                cursor.advance(0.8);
            }
        }
        cursor.advance(1.0);
    }

    cursor.advance(0.5);
}

/// Removes bold/italic markers and turns leading `-`/`*` bullets into `•`.
pub fn strip_markdown(text: &str) -> String {
    let text = BULLET.replace_all(text, "• ");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    text.trim().to_string()
}

/// `2026년 10월 16일`
pub fn format_korean_date(date: NaiveDate) -> String {
    date.format("%Y년 %-m월 %-d일").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn result_with(body: &str) -> AnalysisResult {
        let mut result = AnalysisResult::default();
        for section in Section::ALL {
            result.set(section, body);
        }
        result
    }

    #[test]
    fn test_strip_markdown() {
        assert_eq!(strip_markdown("**굵게** 그리고 *기울임*"), "굵게 그리고 기울임");
        assert_eq!(strip_markdown("- 하나\n* 둘\n  - 셋"), "• 하나\n• 둘\n  - 셋");
        assert_eq!(strip_markdown("* **장점**: 빠름"), "• 장점: 빠름");
    }

    #[test]
    fn test_korean_date() {
        assert_eq!(format_korean_date(date()), "2026년 10월 16일");
        assert_eq!(
            format_korean_date(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            "2026년 1월 5일"
        );
    }

    #[test]
    fn test_title_block_and_section_order() {
        let layout = layout_report(&result_with("짧은 본문"), "ERP 대시보드", date());
        assert_eq!(layout.pages.len(), 1);

        let runs: Vec<&TextRun> = layout.runs().collect();
        assert_eq!(runs[0].text, REPORT_TITLE);
        assert_eq!(runs[1].text, "리서치 주제: ERP 대시보드");
        assert_eq!(runs[2].text, "날짜: 2026년 10월 16일");

        let headings: Vec<&str> = runs
            .iter()
            .filter(|r| r.style == RunStyle::SectionHeading)
            .map(|r| r.text.as_str())
            .collect();
        let expected: Vec<&str> = Section::ALL.iter().map(|s| s.title()).collect();
        assert_eq!(headings, expected);
    }

    #[test]
    fn test_references_are_labelled_and_indented() {
        let body = "본문\n[참고 문헌 및 출처]\n#출처1: Nielsen Norman Group\n#출처2: WCAG 2.1";
        let layout = layout_report(&result_with(body), "t", date());
        let refs: Vec<&TextRun> = layout.runs().filter(|r| r.style == RunStyle::Reference).collect();
        assert_eq!(refs.len(), 8);
        assert_eq!(refs[0].text, "#출처1 Nielsen Norman Group");
        assert_eq!(refs[1].text, "#출처2 WCAG 2.1");
        assert!(refs.iter().all(|r| (r.x_mm - (MARGIN + REF_INDENT)).abs() < 1e-4));
        let labels = layout.runs().filter(|r| r.style == RunStyle::ReferenceLabel).count();
        assert_eq!(labels, 4);
    }

    #[test]
    fn test_long_body_paginates_within_bounds() {
        let body = (0..120)
            .map(|i| format!("- 항목 {i}: 모바일 한 손 조작성과 터치 타겟 크기를 고려한 분석 문장입니다."))
            .collect::<Vec<_>>()
            .join("\n");
        let layout = layout_report(&result_with(&body), "긴 보고서", date());

        assert!(layout.pages.len() > 4, "expected many pages, got {}", layout.pages.len());
        for page in &layout.pages {
            assert!(!page.is_empty());
            for run in page {
                assert!(run.y_mm >= MARGIN && run.y_mm <= A4_H - 15.0 + LINE_HEIGHT, "y out of bounds: {}", run.y_mm);
            }
        }
        for page in layout.pages.iter().skip(1) {
            assert!((page[0].y_mm - MARGIN).abs() < 1e-4);
        }
    }

    #[test]
    fn test_body_lines_fit_text_width() {
        let body = "가나다라마바사 ".repeat(100);
        let layout = layout_report(&result_with(&body), "t", date());
        for run in layout.runs().filter(|r| r.style == RunStyle::Body) {
            assert!(HELVETICA.measure_mm(&run.text, BODY_FONT) <= MAX_WIDTH + 1e-3);
        }
    }

    #[test]
    fn test_empty_result_still_has_all_headings() {
        let layout = layout_report(&AnalysisResult::default(), "t", date());
        let headings = layout.runs().filter(|r| r.style == RunStyle::SectionHeading).count();
        assert_eq!(headings, 4);
        assert_eq!(layout.runs().filter(|r| r.style == RunStyle::Body).count(), 0);
    }
}
