use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fields pulled out of one web page. Every field is optional because the
/// model is asked to answer `null` for anything the page does not state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TownhouseRecord {
    #[serde(
        default,
        alias = "Complex name",
        deserialize_with = "deserialize_field"
    )]
    pub complex_name: Option<String>,
    #[serde(
        default,
        alias = "Strata corporation number",
        alias = "strata_corporation_number",
        deserialize_with = "deserialize_field"
    )]
    pub strata_number: Option<String>,
    #[serde(
        default,
        alias = "Number of units or suites",
        alias = "number_of_units",
        deserialize_with = "deserialize_field"
    )]
    pub unit_count: Option<String>,
    #[serde(
        default,
        alias = "Number of levels",
        alias = "number_of_levels",
        deserialize_with = "deserialize_field"
    )]
    pub level_count: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl TownhouseRecord {
    /// True when none of the four extracted fields carries a value.
    pub fn is_empty(&self) -> bool {
        self.complex_name.is_none()
            && self.strata_number.is_none()
            && self.unit_count.is_none()
            && self.level_count.is_none()
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

fn deserialize_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(field_from_value(value))
}

fn field_from_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            match s.to_lowercase().as_str() {
                "" | "null" | "none" | "unknown" | "n/a" => None,
                _ => Some(s.to_string()),
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// What happened to a single search result on its way through the
/// scraper and the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Extracted { record: TownhouseRecord },
    NothingFound,
    ScrapeFailed { error: String },
    ExtractFailed { error: String },
    ParseFailed { error: String, raw: String },
}

impl PageOutcome {
    pub fn record(&self) -> Option<&TownhouseRecord> {
        match self {
            PageOutcome::Extracted { record } => Some(record),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PageOutcome::Extracted { .. } => "extracted",
            PageOutcome::NothingFound => "nothing found",
            PageOutcome::ScrapeFailed { .. } => "scrape failed",
            PageOutcome::ExtractFailed { .. } => "model failed",
            PageOutcome::ParseFailed { .. } => "unreadable model output",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            PageOutcome::ScrapeFailed { error }
            | PageOutcome::ExtractFailed { error }
            | PageOutcome::ParseFailed { error, .. } => error,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PageOutcome, TownhouseRecord};

    #[test]
    fn parses_canonical_keys() {
        let record: TownhouseRecord = serde_json::from_str(
            r#"{
                "complex_name": "Harbour Mews",
                "strata_number": "VR 1234",
                "unit_count": 42,
                "level_count": "3"
            }"#,
        )
        .unwrap();

        assert_eq!(record.complex_name.as_deref(), Some("Harbour Mews"));
        assert_eq!(record.strata_number.as_deref(), Some("VR 1234"));
        assert_eq!(record.unit_count.as_deref(), Some("42"));
        assert_eq!(record.level_count.as_deref(), Some("3"));
        assert!(record.source.is_none());
        assert!(!record.is_empty());
    }

    #[test]
    fn parses_prompt_style_keys() {
        let record: TownhouseRecord = serde_json::from_str(
            r#"{
                "Complex name": "Cedar Row",
                "Strata corporation number": "BCS 77",
                "Number of units or suites": null,
                "Number of levels": 2
            }"#,
        )
        .unwrap();

        assert_eq!(record.complex_name.as_deref(), Some("Cedar Row"));
        assert_eq!(record.strata_number.as_deref(), Some("BCS 77"));
        assert_eq!(record.unit_count, None);
        assert_eq!(record.level_count.as_deref(), Some("2"));
    }

    #[test]
    fn all_null_object_is_empty() {
        let record: TownhouseRecord = serde_json::from_str(
            r#"{"complex_name": null, "strata_number": " ", "unit_count": "unknown", "level_count": null}"#,
        )
        .unwrap();

        assert!(record.is_empty());
        assert_eq!(record, TownhouseRecord::default());
    }

    #[test]
    fn missing_keys_are_absent() {
        let record: TownhouseRecord = serde_json::from_str("{}").unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn source_does_not_count_as_data() {
        let record = TownhouseRecord::default().with_source("https://example.com");
        assert!(record.is_empty());
        assert_eq!(record.source.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn only_extracted_outcomes_carry_records() {
        let record = TownhouseRecord {
            complex_name: Some("A".to_string()),
            ..Default::default()
        };
        assert_eq!(
            PageOutcome::Extracted {
                record: record.clone()
            }
            .record(),
            Some(&record)
        );
        assert_eq!(PageOutcome::NothingFound.record(), None);

        let failed = PageOutcome::ScrapeFailed {
            error: "Error scraping x: timeout".to_string(),
        };
        assert_eq!(failed.record(), None);
        assert_eq!(failed.detail(), "Error scraping x: timeout");
    }
}
