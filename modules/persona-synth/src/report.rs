//! Plain-text persona report.

use std::fmt::Write;

use persona_common::{Citations, Persona};

const FOOTER: &str = "Generated by Reddit Persona Generator v2.0";

/// Render a persona. `generated_on` is printed verbatim.
pub fn format_persona(persona: &Persona, username: &str, generated_on: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# USER PERSONA: {}", persona.display_name);
    let _ = writeln!(out, "Generated for: u/{username}");
    let _ = writeln!(out, "Generated on: {generated_on}");

    section(&mut out, "DEMOGRAPHIC INFORMATION", &format!(
        "- **Age Range:** {}\n- **Location:** {}\n- **Occupation:** {}",
        persona.age_range, persona.location, persona.occupation
    ));
    section(&mut out, "INTERESTS & HOBBIES", &bullets(&persona.interests));
    section(&mut out, "PERSONALITY TRAITS", &bullets(&persona.personality_traits));
    section(&mut out, "COMMUNICATION STYLE", &persona.communication_style);
    section(&mut out, "GOALS & MOTIVATIONS", &bullets(&persona.goals_motivations));
    section(&mut out, "PAIN POINTS & CHALLENGES", &bullets(&persona.pain_points));
    section(&mut out, "TECHNICAL PROFICIENCY", &persona.technical_proficiency);
    section(&mut out, "SOCIAL BEHAVIOR", &persona.social_behavior);
    section(&mut out, "CONTENT PREFERENCES", &bullets(&persona.content_preferences));
    section(&mut out, "ACTIVITY PATTERNS", &persona.activity_patterns);
    section(&mut out, "CITATIONS", &citations(&persona.citations));

    let _ = write!(out, "\n---\n{FOOTER}\n");
    out
}

fn section(out: &mut String, heading: &str, body: &str) {
    let _ = write!(out, "\n## {heading}\n{body}\n");
}

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "- Not specified".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn citations(citations: &Citations) -> String {
    let mut out = String::new();
    for (field, urls) in citations.iter().filter(|(_, urls)| !urls.is_empty()) {
        let _ = writeln!(out, "**{}:**", field.title());
        for url in urls {
            let _ = writeln!(out, "  - {url}");
        }
        out.push('\n');
    }

    if out.is_empty() {
        "No citations available".to_string()
    } else {
        out.trim_end().to_string()
    }
}
