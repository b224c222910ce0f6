//! Provider command implementation.

use crate::error::Result;
use crate::output::Formatter;
use radstruct_llm::{ProviderKind, ProviderSettings};

/// Execute the provider command.
pub async fn execute_provider(settings: &ProviderSettings, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_pairs(&describe(settings))?);
    Ok(())
}

/// Resolved provider, model, endpoint and readiness, without secrets.
pub fn describe(settings: &ProviderSettings) -> Vec<(&'static str, String)> {
    let kind = settings.resolve_kind();
    let endpoint = match kind {
        ProviderKind::Anthropic => settings.anthropic_base_url.clone(),
        ProviderKind::OpenAi => settings.openai_base_url.clone(),
        ProviderKind::Ollama => settings.ollama_base_url.clone(),
    };
    let credential = match kind.credential_variable() {
        Some(variable) if settings.credential(kind).is_some() => format!("{} set", variable),
        Some(variable) => format!("{} missing", variable),
        None => "not required".to_string(),
    };
    let status = match settings.validate() {
        Ok(()) => "ready".to_string(),
        Err(e) => e.to_string(),
    };

    vec![
        ("provider", kind.to_string()),
        ("model", settings.model_name.clone()),
        ("endpoint", endpoint),
        ("credential", credential),
        ("timeout", format!("{}s", settings.request_timeout_secs)),
        ("status", status),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(pairs: &'a [(&'static str, String)], key: &str) -> &'a str {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_defaults_to_ollama_without_keys() {
        let pairs = describe(&ProviderSettings::default());
        assert_eq!(value(&pairs, "provider"), "ollama");
        assert_eq!(value(&pairs, "credential"), "not required");
        assert_eq!(value(&pairs, "status"), "ready");
    }

    #[test]
    fn test_never_prints_the_key() {
        let settings = ProviderSettings {
            anthropic_api_key: Some("sk-ant-secret".to_string()),
            ..Default::default()
        };
        let pairs = describe(&settings);
        assert_eq!(value(&pairs, "provider"), "anthropic");
        assert_eq!(value(&pairs, "credential"), "ANTHROPIC_API_KEY set");
        assert!(pairs.iter().all(|(_, v)| !v.contains("secret")));
    }

    #[test]
    fn test_reports_missing_credential() {
        let settings = ProviderSettings {
            provider: Some(ProviderKind::OpenAi),
            ..Default::default()
        };
        let pairs = describe(&settings);
        assert_eq!(value(&pairs, "credential"), "OPENAI_API_KEY missing");
        assert!(value(&pairs, "status").contains("requires OPENAI_API_KEY"));
    }
}
