use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::models::research::{lenient_category, Category};

/// The four fixed report sections, in display order.
///
/// The title doubles as the literal marker the model is asked to emit as a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Market,
    Patterns,
    Tradeoffs,
    Insights,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Market,
        Section::Patterns,
        Section::Tradeoffs,
        Section::Insights,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Market => "시장 현황",
            Section::Patterns => "UI/UX 패턴 분석",
            Section::Tradeoffs => "장단점 비교",
            Section::Insights => "인사이트 도출",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Section::Market => 0,
            Section::Patterns => 1,
            Section::Tradeoffs => 2,
            Section::Insights => 3,
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.title() == title)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Section bodies of one analysis. Every section is always present, possibly empty.
///
/// Serialized as a JSON object keyed by section title, in section order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    bodies: [String; 4],
}

impl AnalysisResult {
    pub fn get(&self, section: Section) -> &str {
        &self.bodies[section.index()]
    }

    pub fn set(&mut self, section: Section, body: impl Into<String>) {
        self.bodies[section.index()] = body.into();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> {
        Section::ALL.into_iter().map(|s| (s, self.get(s)))
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.iter().all(|b| b.is_empty())
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Section::ALL.len()))?;
        for (section, body) in self.iter() {
            map.serialize_entry(section.title(), body)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnalysisResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, String>::deserialize(deserializer)?;
        let mut result = AnalysisResult::default();
        for (title, body) in raw {
            // Keys outside the four sections are dropped.
            if let Some(section) = Section::from_title(&title) {
                result.set(section, body);
            }
        }
        Ok(result)
    }
}

/// A section body split from its trailing reference block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    pub body: String,
    pub references: Vec<String>,
}

/// One past analysis as persisted in the history slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub result: AnalysisResult,
    #[serde(
        rename = "researchType",
        default,
        deserialize_with = "lenient_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
}

impl HistoryItem {
    pub fn new(
        topic: impl Into<String>,
        result: AnalysisResult,
        category: Option<Category>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_history_id(created_at),
            topic: topic.into(),
            created_at,
            result,
            category,
        }
    }
}

/// Creation time in epoch millis plus a random suffix.
fn new_history_id(created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", created_at.timestamp_millis(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_serializes_all_sections_in_order() {
        let mut result = AnalysisResult::default();
        result.set(Section::Tradeoffs, "pros");
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"시장 현황":"","UI/UX 패턴 분석":"","장단점 비교":"pros","인사이트 도출":""}"#
        );
    }

    #[test]
    fn test_analysis_result_missing_keys_deserialize_empty() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"시장 현황":"market","unknown":"x"}"#).unwrap();
        assert_eq!(result.get(Section::Market), "market");
        assert_eq!(result.get(Section::Insights), "");
        assert_eq!(result.iter().count(), 4);
    }

    #[test]
    fn test_history_item_uses_front_end_field_names() {
        let created_at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05.678Z")
            .unwrap()
            .with_timezone(&Utc);
        let item = HistoryItem::new(
            "ERP 대시보드",
            AnalysisResult::default(),
            Some(Category::Admin),
            created_at,
        );
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["researchType"], "업무용/Admin");
        assert_eq!(value["topic"], "ERP 대시보드");
        assert!(value["createdAt"].as_str().unwrap().starts_with("2026-01-02T03:04:05"));
        assert!(item.id.starts_with(&created_at.timestamp_millis().to_string()));
    }

    #[test]
    fn test_history_item_legacy_research_type_is_dropped() {
        let json = r#"{
            "id": "1-abc",
            "topic": "t",
            "createdAt": "2026-01-02T03:04:05.000Z",
            "result": {},
            "researchType": "B2C"
        }"#;
        let item: HistoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.category, None);
    }

    #[test]
    fn test_history_ids_are_unique() {
        let now = Utc::now();
        let a = HistoryItem::new("t", AnalysisResult::default(), None, now);
        let b = HistoryItem::new("t", AnalysisResult::default(), None, now);
        assert_ne!(a.id, b.id);
    }
}
