use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a settings field path to the environment variable that supplies it.
/// Serde reports bare field names for fields inside the provider enum, so
/// the common ones are qualified here.
pub fn to_env_var(field: &str) -> String {
    let path = match field {
        "type" | "provider" => "provider.type",
        "api_key" => "provider.api_key",
        "models" => "provider.models",
        other => other,
    };
    format!("HERON_{}", path.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("type"), "HERON_PROVIDER__TYPE");
        assert_eq!(to_env_var("api_key"), "HERON_PROVIDER__API_KEY");
        assert_eq!(to_env_var("server.port"), "HERON_SERVER__PORT");
    }
}
