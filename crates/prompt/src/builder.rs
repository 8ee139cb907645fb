//! Prompt builder: renders the persona and assembles the prompt parts.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PersonaDefinition};
use handlebars::Handlebars;
use yaseen_core::{AppError, AppResult};

/// Build the prompt for one question.
///
/// This function:
/// 1. Renders the persona template with its behavior and the recognized
///    source collections
/// 2. Joins the passage texts, in retrieval order, into one context block
/// 3. Keeps the user's question verbatim
///
/// # Arguments
/// * `persona` - Persona definition loaded from YAML
/// * `passages` - Retrieved passage texts, most similar first
/// * `query` - The user's question
/// * `collections` - Source collection names the citation grammar accepts
pub fn build_prompt(
    persona: &PersonaDefinition,
    passages: &[String],
    query: &str,
    collections: &[&str],
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt from persona: {}", persona.id);

    let system = render_persona(persona, collections)?;

    let joined = passages.join("\n");
    let context = match &persona.context_header {
        Some(header) if !joined.is_empty() => format!("{}\n{}", header, joined),
        _ => joined,
    };

    Ok(BuiltPrompt {
        system,
        context,
        user: query.to_string(),
        metadata: BuiltPromptMetadata {
            source_persona_id: persona.id.clone(),
            passage_count: passages.len(),
        },
    })
}

/// Render the persona template.
pub fn render_persona(persona: &PersonaDefinition, collections: &[&str]) -> AppResult<String> {
    let data = serde_json::json!({
        "tone": persona.behavior.tone,
        "style": persona.behavior.style,
        "collections": collections,
    });

    render_template(&persona.template, &data)
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("persona", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("persona", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PersonaBehavior;

    fn create_test_persona(header: Option<&str>) -> PersonaDefinition {
        PersonaDefinition {
            id: "persona.test".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PersonaBehavior {
                tone: "respectful".to_string(),
                style: "concise".to_string(),
            },
            template: "Be {{tone}}.{{#each collections}} [[{{this}}]]{{/each}}".to_string(),
            context_header: header.map(str::to_string),
        }
    }

    #[test]
    fn test_render_persona_lists_collections() {
        let persona = create_test_persona(None);
        let rendered = render_persona(&persona, &["Bukhari", "Muslim"]).unwrap();
        assert_eq!(rendered, "Be respectful. [[Bukhari]] [[Muslim]]");
    }

    #[test]
    fn test_no_html_escaping() {
        let persona = PersonaDefinition {
            template: "{{tone}}".to_string(),
            behavior: PersonaBehavior {
                tone: "<calm> & \"kind\"".to_string(),
                style: "x".to_string(),
            },
            ..create_test_persona(None)
        };
        assert_eq!(render_persona(&persona, &[]).unwrap(), "<calm> & \"kind\"");
    }

    #[test]
    fn test_build_prompt_joins_passages_in_order() {
        let persona = create_test_persona(None);
        let passages = vec!["first passage".to_string(), "second passage".to_string()];

        let built = build_prompt(&persona, &passages, "Who is Allah?", &["Bukhari"]).unwrap();

        assert_eq!(built.context, "first passage\nsecond passage");
        assert_eq!(built.user, "Who is Allah?");
        assert_eq!(built.metadata.passage_count, 2);
        assert_eq!(built.metadata.source_persona_id, "persona.test");
    }

    #[test]
    fn test_build_prompt_with_header() {
        let persona = create_test_persona(Some("Reference passages:"));
        let passages = vec!["a".to_string()];
        let built = build_prompt(&persona, &passages, "q?", &[]).unwrap();
        assert_eq!(built.context, "Reference passages:\na");

        let built = build_prompt(&persona, &[], "q?", &[]).unwrap();
        assert!(built.context.is_empty());
    }

    #[test]
    fn test_builtin_persona_renders() {
        let persona = crate::loader::default_persona().unwrap();
        let rendered = render_persona(&persona, &["Bukhari", "Muslim"]).unwrap();
        assert!(rendered.contains("[[Q 2:255]]"));
        assert!(rendered.contains("[[Bukhari book:number]]"));
        assert!(rendered.contains("[[Muslim book:number]]"));
        assert!(rendered.contains("respectful"));
    }
}
