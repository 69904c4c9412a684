// src/credentials.rs
//! Bearer token sources

use anyhow::Result;
use log::debug;

/// Something that can hand out the bearer token for API calls.
pub trait CredentialProvider {
    fn bearer_token(&self) -> Result<String>;
}

/// Reads the token from an environment variable.
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn bearer_token(&self) -> Result<String> {
        debug!("Reading API token from ${}", self.var);
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => anyhow::bail!(
                "{var} environment variable is not set.\nSet it with: export {var}=your_token_here",
                var = self.var
            ),
        }
    }
}

/// A fixed token, for tests and embedding.
pub struct StaticCredentials(String);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_token_carries_hint() {
        let provider = EnvCredentials::new("GH_WORKFLOW_TEST_TOKEN_UNSET");
        let err = provider.bearer_token().unwrap_err().to_string();
        assert!(err.contains("GH_WORKFLOW_TEST_TOKEN_UNSET environment variable is not set"));
        assert!(err.contains("export GH_WORKFLOW_TEST_TOKEN_UNSET=your_token_here"));
    }

    #[test]
    fn test_env_token_is_trimmed() {
        std::env::set_var("GH_WORKFLOW_TEST_TOKEN_SET", "  abc123\n");
        let provider = EnvCredentials::new("GH_WORKFLOW_TEST_TOKEN_SET");
        assert_eq!(provider.bearer_token().unwrap(), "abc123");
    }

    #[test]
    fn test_static_token() {
        assert_eq!(StaticCredentials::new("t0k").bearer_token().unwrap(), "t0k");
    }
}
