use persona_common::{AttributeField, AttributeValue, Citations, ExtractedAttributes, Persona, UNKNOWN};

/// Display name used when the model did not supply one.
pub fn default_display_name(username: &str) -> String {
    format!("Reddit User: {username}")
}

/// Merge attributes, defaults and citations into the final persona.
///
/// Missing fields take their defaults. Values of the wrong shape are coerced:
/// text into a one-element list, a list into comma-joined text.
pub fn assemble(username: &str, attributes: &ExtractedAttributes, citations: Citations) -> Persona {
    let text = |field: AttributeField| text_field(attributes.get(field));
    let list = |field: AttributeField| list_field(attributes.get(field));

    let display_name = match attributes.get(AttributeField::Name) {
        Some(value) => text_field(Some(value)),
        None => default_display_name(username),
    };

    Persona {
        display_name,
        age_range: text(AttributeField::AgeRange),
        location: text(AttributeField::Location),
        occupation: text(AttributeField::Occupation),
        interests: list(AttributeField::Interests),
        personality_traits: list(AttributeField::PersonalityTraits),
        communication_style: text(AttributeField::CommunicationStyle),
        goals_motivations: list(AttributeField::GoalsMotivations),
        pain_points: list(AttributeField::PainPoints),
        technical_proficiency: text(AttributeField::TechnicalProficiency),
        social_behavior: text(AttributeField::SocialBehavior),
        content_preferences: list(AttributeField::ContentPreferences),
        activity_patterns: text(AttributeField::ActivityPatterns),
        citations,
    }
}

fn text_field(value: Option<&AttributeValue>) -> String {
    match value {
        Some(AttributeValue::Text(s)) if !s.trim().is_empty() => s.clone(),
        Some(AttributeValue::List(items)) => {
            let joined = items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if joined.is_empty() {
                UNKNOWN.to_string()
            } else {
                joined
            }
        }
        _ => UNKNOWN.to_string(),
    }
}

fn list_field(value: Option<&AttributeValue>) -> Vec<String> {
    match value {
        Some(AttributeValue::List(items)) => items.clone(),
        Some(AttributeValue::Text(s)) if !s.trim().is_empty() && s.trim() != UNKNOWN => {
            vec![s.clone()]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_attributes_assemble_to_unknowns() {
        // The fallback carries name "Unknown", which is a present value.
        let persona = assemble("spez", &ExtractedAttributes::fallback(), Citations::new());
        assert_eq!(persona.display_name, "Unknown");
        assert_eq!(persona.location, "Unknown");
        assert!(persona.interests.is_empty());
    }

    #[test]
    fn absent_name_defaults_to_username() {
        let persona = assemble("spez", &ExtractedAttributes::new(), Citations::new());
        assert_eq!(persona.display_name, "Reddit User: spez");
        assert_eq!(persona.activity_patterns, "Unknown");
        assert!(persona.pain_points.is_empty());
    }

    #[test]
    fn shapes_are_coerced() {
        let mut attributes = ExtractedAttributes::new();
        attributes.insert(AttributeField::Interests, AttributeValue::Text("Woodworking".into()));
        attributes.insert(AttributeField::PainPoints, AttributeValue::Text("Unknown".into()));
        attributes.insert(
            AttributeField::Location,
            AttributeValue::List(vec!["Leeds".into(), "UK".into()]),
        );
        attributes.insert(AttributeField::Occupation, AttributeValue::List(vec![]));

        let persona = assemble("spez", &attributes, Citations::new());
        assert_eq!(persona.interests, vec!["Woodworking"]);
        assert!(persona.pain_points.is_empty());
        assert_eq!(persona.location, "Leeds, UK");
        assert_eq!(persona.occupation, "Unknown");
    }

    #[test]
    fn citations_pass_through() {
        let mut citations = Citations::new();
        citations.insert(AttributeField::Interests, vec!["u1".into()]);
        let persona = assemble("spez", &ExtractedAttributes::new(), citations.clone());
        assert_eq!(persona.citations, citations);
    }
}
