use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder the model (and the fallback object) uses for an undetermined scalar.
pub const UNKNOWN: &str = "Unknown";

// --- Source items ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Post => "post",
            ItemKind::Comment => "comment",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One post or comment in the uniform shape the pipeline reasons about.
///
/// `source_url` is the citation unit: unique per item and stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,
    pub body: String,
    pub community: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    pub kind: ItemKind,
    /// Preview of the item being replied to. Only set for comments.
    pub parent_context: Option<String>,
}

impl NormalizedItem {
    /// Lowercased `title + " " + body`, the text citations are matched against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.body).to_lowercase()
    }
}

// --- Attributes ---

/// The fixed attribute schema the instruction template asks the model for.
///
/// Declaration order is template order; `Ord` follows it, so maps keyed by
/// field iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeField {
    Name,
    AgeRange,
    Location,
    Occupation,
    Interests,
    PersonalityTraits,
    CommunicationStyle,
    GoalsMotivations,
    PainPoints,
    TechnicalProficiency,
    SocialBehavior,
    ContentPreferences,
    ActivityPatterns,
}

impl AttributeField {
    pub const ALL: [AttributeField; 13] = [
        AttributeField::Name,
        AttributeField::AgeRange,
        AttributeField::Location,
        AttributeField::Occupation,
        AttributeField::Interests,
        AttributeField::PersonalityTraits,
        AttributeField::CommunicationStyle,
        AttributeField::GoalsMotivations,
        AttributeField::PainPoints,
        AttributeField::TechnicalProficiency,
        AttributeField::SocialBehavior,
        AttributeField::ContentPreferences,
        AttributeField::ActivityPatterns,
    ];

    /// JSON key used in the prompt and the model response.
    pub fn key(&self) -> &'static str {
        match self {
            AttributeField::Name => "name",
            AttributeField::AgeRange => "age_range",
            AttributeField::Location => "location",
            AttributeField::Occupation => "occupation",
            AttributeField::Interests => "interests",
            AttributeField::PersonalityTraits => "personality_traits",
            AttributeField::CommunicationStyle => "communication_style",
            AttributeField::GoalsMotivations => "goals_motivations",
            AttributeField::PainPoints => "pain_points",
            AttributeField::TechnicalProficiency => "technical_proficiency",
            AttributeField::SocialBehavior => "social_behavior",
            AttributeField::ContentPreferences => "content_preferences",
            AttributeField::ActivityPatterns => "activity_patterns",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether the template asks for a sequence rather than a single string.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            AttributeField::Interests
                | AttributeField::PersonalityTraits
                | AttributeField::GoalsMotivations
                | AttributeField::PainPoints
                | AttributeField::ContentPreferences
        )
    }

    /// Human heading for reports: `age_range` → `Age Range`.
    pub fn title(&self) -> String {
        self.key()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl std::fmt::Display for AttributeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A single attribute value as the model produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// The value a field takes when extraction produced nothing usable.
    pub fn default_for(field: AttributeField) -> Self {
        if field.is_list() {
            AttributeValue::List(Vec::new())
        } else {
            AttributeValue::Text(UNKNOWN.to_string())
        }
    }

    /// Read a JSON value leniently. Numbers and booleans become text, list
    /// elements that are neither strings nor scalars are dropped. `null` and
    /// objects are not attribute values.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::String(s) => Some(AttributeValue::Text(s.clone())),
            Value::Number(n) => Some(AttributeValue::Text(n.to_string())),
            Value::Bool(b) => Some(AttributeValue::Text(b.to_string())),
            Value::Array(items) => Some(AttributeValue::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }
}

/// Attribute values keyed by field, in template order.
///
/// A recovered response may omit fields; the fallback set has all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractedAttributes {
    values: BTreeMap<AttributeField, AttributeValue>,
}

impl ExtractedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field present with its default value.
    pub fn fallback() -> Self {
        Self {
            values: AttributeField::ALL
                .into_iter()
                .map(|field| (field, AttributeValue::default_for(field)))
                .collect(),
        }
    }

    /// Keep the recognised keys of a parsed JSON object. Unknown keys and
    /// unusable values are dropped and logged.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut attributes = Self::new();
        for (key, value) in object {
            let Some(field) = AttributeField::from_key(key) else {
                tracing::debug!(key = key.as_str(), "Ignoring unexpected attribute key");
                continue;
            };
            match AttributeValue::from_json(value) {
                Some(value) => attributes.insert(field, value),
                None => tracing::warn!(field = field.key(), "Dropping unusable attribute value"),
            }
        }
        attributes
    }

    pub fn insert(&mut self, field: AttributeField, value: AttributeValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: AttributeField) -> Option<&AttributeValue> {
        self.values.get(&field)
    }

    pub fn contains(&self, field: AttributeField) -> bool {
        self.values.contains_key(&field)
    }

    /// True when every templated field is present.
    pub fn is_complete(&self) -> bool {
        AttributeField::ALL.iter().all(|field| self.contains(*field))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeField, &AttributeValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(field, value)| {
                    let json = match value {
                        AttributeValue::Text(s) => serde_json::Value::from(s.as_str()),
                        AttributeValue::List(items) => serde_json::Value::from(items.clone()),
                    };
                    (field.key().to_string(), json)
                })
                .collect(),
        )
    }
}

// --- Citations & persona ---

/// Source URLs offered as evidence, per attribute field.
pub type Citations = BTreeMap<AttributeField, Vec<String>>;

/// The final profile for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persona {
    pub display_name: String,
    pub age_range: String,
    pub location: String,
    pub occupation: String,
    pub interests: Vec<String>,
    pub personality_traits: Vec<String>,
    pub communication_style: String,
    pub goals_motivations: Vec<String>,
    pub pain_points: Vec<String>,
    pub technical_proficiency: String,
    pub social_behavior: String,
    pub content_preferences: Vec<String>,
    pub activity_patterns: String,
    pub citations: Citations,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_round_trip_through_from_key() {
        for field in AttributeField::ALL {
            assert_eq!(AttributeField::from_key(field.key()), Some(field));
        }
        assert_eq!(AttributeField::from_key("favourite_colour"), None);
    }

    #[test]
    fn serde_name_matches_key() {
        for field in AttributeField::ALL {
            assert_eq!(serde_json::to_value(field).unwrap(), json!(field.key()));
        }
    }

    #[test]
    fn five_list_fields() {
        let lists: Vec<_> = AttributeField::ALL.iter().filter(|f| f.is_list()).collect();
        assert_eq!(lists.len(), 5);
    }

    #[test]
    fn title_cases_keys() {
        assert_eq!(AttributeField::AgeRange.title(), "Age Range");
        assert_eq!(AttributeField::Name.title(), "Name");
        assert_eq!(AttributeField::GoalsMotivations.title(), "Goals Motivations");
    }

    #[test]
    fn fallback_is_complete_and_uninformative() {
        let fallback = ExtractedAttributes::fallback();
        assert!(fallback.is_complete());
        assert_eq!(
            fallback.get(AttributeField::Location),
            Some(&AttributeValue::Text(UNKNOWN.into()))
        );
        assert_eq!(
            fallback.get(AttributeField::Interests),
            Some(&AttributeValue::List(vec![]))
        );
    }

    #[test]
    fn from_json_object_is_lenient() {
        let object = json!({
            "age_range": 30,
            "interests": ["rust", 7, null, {"x": 1}],
            "location": null,
            "mood": "sunny"
        });
        let attrs = ExtractedAttributes::from_json_object(object.as_object().unwrap());
        assert_eq!(attrs.len(), 2);
        assert_eq!(
            attrs.get(AttributeField::AgeRange),
            Some(&AttributeValue::Text("30".into()))
        );
        assert_eq!(
            attrs.get(AttributeField::Interests),
            Some(&AttributeValue::List(vec!["rust".into(), "7".into()]))
        );
        assert!(!attrs.contains(AttributeField::Location));
    }

    #[test]
    fn to_json_preserves_shape() {
        let mut attrs = ExtractedAttributes::new();
        attrs.insert(AttributeField::Name, AttributeValue::Text("Night Owl".into()));
        attrs.insert(
            AttributeField::Interests,
            AttributeValue::List(vec!["chess".into()]),
        );
        assert_eq!(
            attrs.to_json(),
            json!({"name": "Night Owl", "interests": ["chess"]})
        );
    }

    #[test]
    fn search_text_is_lowercase_title_and_body() {
        let item = NormalizedItem {
            title: "I love Python".into(),
            body: "And RUST".into(),
            community: "learnpython".into(),
            score: 3,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            source_url: "u1".into(),
            kind: ItemKind::Post,
            parent_context: None,
        };
        assert_eq!(item.search_text(), "i love python and rust");
    }
}
