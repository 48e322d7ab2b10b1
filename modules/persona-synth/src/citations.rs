use persona_common::{AttributeValue, Citations, ExtractedAttributes, NormalizedItem, UNKNOWN};

/// Citations kept for a scalar attribute.
pub const SCALAR_CITATION_LIMIT: usize = 3;
/// Citations kept per element of a list attribute, before dedup.
pub const LIST_ELEMENT_CITATION_LIMIT: usize = 2;

/// Link every present attribute to the items that plausibly support it.
///
/// Every field in `attributes` gets a key, possibly with an empty list.
/// Output depends only on the inputs and their order.
pub fn link_citations(items: &[NormalizedItem], attributes: &ExtractedAttributes) -> Citations {
    // Lowercased once per item rather than once per (item, value) pair.
    let haystacks: Vec<(String, &str)> = items
        .iter()
        .map(|item| (item.search_text(), item.source_url.as_str()))
        .collect();

    let mut citations = Citations::new();
    for (field, value) in attributes.iter() {
        let urls = match value {
            AttributeValue::List(elements) => elements
                .iter()
                .filter(|element| !element.trim().is_empty())
                .flat_map(|element| {
                    relevant_items(&haystacks, element)
                        .into_iter()
                        .take(LIST_ELEMENT_CITATION_LIMIT)
                })
                .collect(),
            AttributeValue::Text(text) if is_informative(text) => relevant_items(&haystacks, text)
                .into_iter()
                .take(SCALAR_CITATION_LIMIT)
                .collect(),
            AttributeValue::Text(_) => Vec::new(),
        };
        citations.insert(field, dedup(urls));
    }
    citations
}

fn is_informative(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text != UNKNOWN
}

/// URLs of items whose search text contains the value, or any of its
/// whitespace-separated tokens, as a substring.
fn relevant_items(haystacks: &[(String, &str)], value: &str) -> Vec<String> {
    let needle = value.to_lowercase();
    let tokens: Vec<&str> = needle.split_whitespace().collect();

    haystacks
        .iter()
        .filter(|(text, _)| text.contains(&needle) || tokens.iter().any(|t| text.contains(t)))
        .map(|(_, url)| url.to_string())
        .collect()
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::post_item;
    use persona_common::AttributeField;

    fn attrs(pairs: Vec<(AttributeField, AttributeValue)>) -> ExtractedAttributes {
        let mut attributes = ExtractedAttributes::new();
        for (field, value) in pairs {
            attributes.insert(field, value);
        }
        attributes
    }

    fn list(values: &[&str]) -> AttributeValue {
        AttributeValue::List(values.iter().map(|v| v.to_string()).collect())
    }

    fn text(value: &str) -> AttributeValue {
        AttributeValue::Text(value.to_string())
    }

    #[test]
    fn list_element_matches_item() {
        let items = vec![post_item("u1", "I love Python and Rust", "")];
        let citations = link_citations(&items, &attrs(vec![(AttributeField::Interests, list(&["Python"]))]));
        assert_eq!(citations[&AttributeField::Interests], vec!["u1".to_string()]);
    }

    #[test]
    fn no_shared_tokens_gives_empty_list() {
        let items = vec![post_item("u1", "Weekend hiking trip", "Mountains were great")];
        let citations = link_citations(
            &items,
            &attrs(vec![
                (AttributeField::Interests, list(&["Chess"])),
                (AttributeField::Occupation, text("Accountant")),
            ]),
        );
        assert!(citations[&AttributeField::Interests].is_empty());
        assert!(citations[&AttributeField::Occupation].is_empty());
    }

    #[test]
    fn unknown_and_blank_values_get_empty_lists() {
        let items = vec![post_item("u1", "unknown territory", "")];
        let citations = link_citations(
            &items,
            &attrs(vec![
                (AttributeField::Location, text("Unknown")),
                (AttributeField::AgeRange, text("  ")),
                (AttributeField::PainPoints, list(&["", " "])),
            ]),
        );
        assert_eq!(citations.len(), 3);
        assert!(citations.values().all(Vec::is_empty));
    }

    #[test]
    fn only_present_fields_are_keyed() {
        let citations = link_citations(&[], &attrs(vec![(AttributeField::Name, text("x"))]));
        assert_eq!(citations.keys().copied().collect::<Vec<_>>(), vec![AttributeField::Name]);
    }

    #[test]
    fn scalar_capped_at_three() {
        let items: Vec<_> = (0..6).map(|i| post_item(&format!("u{i}"), "rust every day", "")).collect();
        let citations = link_citations(&items, &attrs(vec![(AttributeField::Occupation, text("Rust developer"))]));
        assert_eq!(citations[&AttributeField::Occupation], vec!["u0", "u1", "u2"]);
    }

    #[test]
    fn list_elements_capped_at_two_then_deduplicated() {
        let items = vec![
            post_item("u1", "chess and go", ""),
            post_item("u2", "chess openings", ""),
            post_item("u3", "chess puzzles", ""),
            post_item("u4", "go proverbs", ""),
        ];
        let citations = link_citations(&items, &attrs(vec![(AttributeField::Interests, list(&["chess", "go"]))]));
        // chess → u1,u2; go → u1,u4 (u1 again is dropped).
        assert_eq!(citations[&AttributeField::Interests], vec!["u1", "u2", "u4"]);
    }

    #[test]
    fn token_match_is_case_insensitive_substring() {
        let items = vec![post_item("u1", "", "Started a new job in DATA engineering")];
        let citations = link_citations(&items, &attrs(vec![(AttributeField::Occupation, text("Data Scientist"))]));
        assert_eq!(citations[&AttributeField::Occupation], vec!["u1"]);
    }

    #[test]
    fn deterministic() {
        let items: Vec<_> = (0..10)
            .map(|i| post_item(&format!("u{i}"), &format!("topic {}", i % 3), "python rust go"))
            .collect();
        let attributes = attrs(vec![
            (AttributeField::Interests, list(&["topic 1", "rust"])),
            (AttributeField::Occupation, text("go developer")),
        ]);
        let first = link_citations(&items, &attributes);
        for _ in 0..5 {
            assert_eq!(link_citations(&items, &attributes), first);
        }
    }
}
