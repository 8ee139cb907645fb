//! Persona loader for YAML persona definitions.

use crate::types::PersonaDefinition;
use std::path::Path;
use yaseen_core::{AppError, AppResult};

/// The persona compiled into the binary.
const BUILTIN_SCHOLAR_PERSONA: &str = include_str!("../personas/scholar.yml");

/// Load the built-in scholar persona.
pub fn default_persona() -> AppResult<PersonaDefinition> {
    parse_persona(BUILTIN_SCHOLAR_PERSONA, "built-in scholar persona")
}

/// Load a persona definition from a YAML file.
///
/// # Example
/// ```no_run
/// use yaseen_prompt::load_persona;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let persona = load_persona(Path::new("personas/scholar.yml"))?;
/// println!("Loaded persona: {}", persona.title);
/// # Ok(())
/// # }
/// ```
pub fn load_persona(path: &Path) -> AppResult<PersonaDefinition> {
    tracing::debug!("Loading persona from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Persona file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read persona file {:?}: {}", path, e))
    })?;

    let definition = parse_persona(&contents, &format!("{:?}", path))?;

    tracing::info!("Loaded persona: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load the persona at `path` if given, the built-in one otherwise.
pub fn resolve_persona(path: Option<&Path>) -> AppResult<PersonaDefinition> {
    match path {
        Some(path) => load_persona(path),
        None => default_persona(),
    }
}

fn parse_persona(contents: &str, origin: &str) -> AppResult<PersonaDefinition> {
    let definition: PersonaDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse persona YAML {}: {}", origin, e))
    })?;

    validate_persona(&definition)?;

    Ok(definition)
}

/// Validate a persona definition.
fn validate_persona(def: &PersonaDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Persona ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Persona title cannot be empty".to_string()));
    }

    if def.api_version.is_empty() {
        return Err(AppError::Prompt(
            "Persona apiVersion cannot be empty".to_string(),
        ));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Persona template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
