use serde::{Deserialize, Deserializer, Serialize};

/// Audience category that shapes the emphasis of an analysis.
///
/// Serialized as the exact Korean labels the front-end sends in `researchType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "대국민/B2C")]
    Consumer,
    #[serde(rename = "업무용/Admin")]
    Admin,
    #[serde(rename = "인프라/DX")]
    Infra,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Consumer, Category::Admin, Category::Infra];

    pub fn label(self) -> &'static str {
        match self {
            Category::Consumer => "대국민/B2C",
            Category::Admin => "업무용/Admin",
            Category::Infra => "인프라/DX",
        }
    }

    /// Exact label match. Anything else (legacy values, typos) is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

/// Device focus for an analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    #[default]
    #[serde(rename = "모바일")]
    Mobile,
    #[serde(rename = "웹")]
    Web,
}

impl Device {
    pub const ALL: [Device; 2] = [Device::Mobile, Device::Web];

    pub fn label(self) -> &'static str {
        match self {
            Device::Mobile => "모바일",
            Device::Web => "웹",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.label() == label)
    }
}

/// Validated input of one analysis request. `topic` is always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInput {
    pub category: Option<Category>,
    pub sub_service: Option<String>,
    pub device: Device,
    pub topic: String,
}

/// Validated input of one chat turn. `message` is always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInput {
    pub message: String,
    pub category: Option<Category>,
    pub sub_service: Option<String>,
    pub device: Option<Device>,
}

/// Deserializes an optional category, mapping unknown labels to `None`
/// so a single legacy record cannot invalidate a whole history list.
pub fn lenient_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(Category::from_label))
}
