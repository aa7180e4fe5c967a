//! Prompt loader for YAML prompt definitions and the active prompt set.

use crate::builder::{PromptSet, DEFAULT_FALLBACK, DEFAULT_GROUNDED};
use crate::types::{PromptDefinition, PromptKind};
use relief_core::{AppConfig, AppError, AppResult};
use std::path::Path;

/// Load a prompt definition by ID from a prompt directory.
///
/// This function reads `<prompts_dir>/<id>.yml`.
///
/// # Example
/// ```no_run
/// use relief_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".relief/prompts"), "grounded")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    // Validate required fields
    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all prompt IDs in a prompt directory.
pub fn list_prompts(prompts_dir: &Path) -> AppResult<Vec<String>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();

    Ok(prompt_ids)
}

/// Resolve the active prompt set from configuration.
///
/// For each template the first source found wins:
/// 1. inline template in `prompts.grounded` / `prompts.fallback`
/// 2. `grounded.yml` / `fallback.yml` in `prompts.dir`
/// 3. the built-in disaster-management template
///
/// The answer cue comes from the grounded definition file if it sets one,
/// otherwise from `prompts.answerCue`.
pub fn load_prompt_set(config: &AppConfig) -> AppResult<PromptSet> {
    let settings = &config.prompts;
    let prompts_dir = config.prompts_dir();

    let mut answer_cue = settings.answer_cue.clone();

    let grounded = match (&settings.grounded, &prompts_dir) {
        (Some(inline), _) => inline.clone(),
        (None, Some(dir)) if dir.join("grounded.yml").exists() => {
            let def = load_definition_of_kind(dir, PromptKind::Grounded)?;
            if let Some(cue) = def.answer_cue {
                answer_cue = cue;
            }
            def.template
        }
        _ => DEFAULT_GROUNDED.to_string(),
    };

    let fallback = match (&settings.fallback, &prompts_dir) {
        (Some(inline), _) => inline.clone(),
        (None, Some(dir)) if dir.join("fallback.yml").exists() => {
            load_definition_of_kind(dir, PromptKind::Fallback)?.template
        }
        _ => DEFAULT_FALLBACK.to_string(),
    };

    PromptSet::new(grounded, fallback, answer_cue)
}

fn load_definition_of_kind(dir: &Path, kind: PromptKind) -> AppResult<PromptDefinition> {
    let def = load_prompt(dir, kind.as_str())?;
    if def.kind != kind {
        return Err(AppError::Prompt(format!(
            "Prompt {} declares kind {}, expected {}",
            def.id, def.kind, kind
        )));
    }
    Ok(def)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.api_version.is_empty() {
        return Err(AppError::Prompt(
            "Prompt apiVersion cannot be empty".to_string(),
        ));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, kind: &str, template: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();

        let content = format!(
            "id: {}\ntitle: \"Test Prompt\"\napiVersion: \"1.0\"\ncreatedBy: test\nkind: {}\ntemplate: {:?}\n",
            id, kind, template
        );

        let file_path = dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn config_for(workspace: &Path) -> AppConfig {
        AppConfig {
            workspace: workspace.to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "grounded", "grounded", "{{context}} {{question}} Answer:");

        let prompt = load_prompt(temp_dir.path(), "grounded").unwrap();
        assert_eq!(prompt.id, "grounded");
        assert_eq!(prompt.title, "Test Prompt");
        assert_eq!(prompt.kind, PromptKind::Grounded);
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("invalid.yml"), "invalid: yaml: content:").unwrap();

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "grounded", "grounded", "{{context}} {{question}} Answer:");
        write_prompt(temp_dir.path(), "fallback", "fallback", "{{question}}");

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec!["fallback".to_string(), "grounded".to_string()]);
    }

    #[test]
    fn test_prompt_set_defaults_without_sources() {
        let temp_dir = TempDir::new().unwrap();
        let set = load_prompt_set(&config_for(temp_dir.path())).unwrap();

        assert_eq!(set.grounded_template(), DEFAULT_GROUNDED);
        assert_eq!(set.fallback_template(), DEFAULT_FALLBACK);
        assert_eq!(set.answer_cue(), "Answer:");
    }

    #[test]
    fn test_prompt_set_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("prompts");
        write_prompt(
            &dir,
            "grounded",
            "grounded",
            "Answer the question using the context.\n\nContext:\n{{context}}\n\nQuestion: {{question}}\nAnswer:",
        );

        let mut config = config_for(temp_dir.path());
        config.prompts.dir = Some(PathBuf::from("prompts"));

        let set = load_prompt_set(&config).unwrap();
        assert!(set
            .grounded_template()
            .starts_with("Answer the question using the context."));
        // No fallback.yml in the directory
        assert_eq!(set.fallback_template(), DEFAULT_FALLBACK);
    }

    #[test]
    fn test_prompt_set_inline_wins() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_for(temp_dir.path());
        config.prompts.fallback =
            Some("Answer the question as best as you can.\n\nQuestion: {{question}}\nAnswer:".to_string());

        let set = load_prompt_set(&config).unwrap();
        let built = set.render_fallback("Hi").unwrap();
        assert_eq!(
            built.text,
            "Answer the question as best as you can.\n\nQuestion: Hi\nAnswer:"
        );
    }

    #[test]
    fn test_prompt_set_rejects_wrong_kind() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("prompts");
        write_prompt(&dir, "fallback", "grounded", "{{question}}");

        let mut config = config_for(temp_dir.path());
        config.prompts.dir = Some(PathBuf::from("prompts"));

        assert!(matches!(load_prompt_set(&config), Err(AppError::Prompt(_))));
    }
}
