use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use esauth_core::{Context, Error, ProvideCredential, Result};
use ini::Ini;
use log::debug;

/// ProfileCredentialProvider loads AWS credentials from shared configuration files.
///
/// This provider loads credentials from:
/// - `~/.aws/credentials` (or the path specified by `AWS_SHARED_CREDENTIALS_FILE`)
/// - `~/.aws/config` (or the path specified by `AWS_CONFIG_FILE`)
///
/// The credentials file wins when both carry keys for the profile.
///
/// The profile to use is determined by:
/// 1. The `AWS_PROFILE` environment variable
/// 2. The profile specified via `with_profile()`
/// 3. Default to "default"
#[derive(Debug)]
pub struct ProfileCredentialProvider {
    profile: String,
    config_file: Option<String>,
    credentials_file: Option<String>,
}

impl Default for ProfileCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self {
            profile: "default".to_string(),
            config_file: None,
            credentials_file: None,
        }
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the path to the config file.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the path to the credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    async fn load_file(
        ctx: &Context,
        configured: Option<&String>,
        env_key: &str,
        fallback: &str,
    ) -> Result<Option<Ini>> {
        let path = configured
            .cloned()
            .or_else(|| ctx.env_var(env_key))
            .unwrap_or_else(|| fallback.to_string());

        let Some(expanded_path) = ctx.expand_home_dir(&path) else {
            debug!("failed to expand homedir for path: {path}");
            return Ok(None);
        };

        let content = match ctx.file_read_as_string(&expanded_path).await {
            Ok(content) => content,
            Err(err) => {
                debug!("failed to read profile file {expanded_path}: {err:?}");
                return Ok(None);
            }
        };

        let conf = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse profile file {expanded_path}"))
                .with_source(e)
        })?;
        Ok(Some(conf))
    }

    fn credential_from_section(conf: &Ini, section: &str) -> Option<Credential> {
        let Some(props) = conf.section(Some(section)) else {
            debug!("section {section} not found in profile file");
            return None;
        };

        match (
            props.get("aws_access_key_id"),
            props.get("aws_secret_access_key"),
        ) {
            (Some(ak), Some(sk)) => Some(Credential {
                access_key_id: ak.to_string(),
                secret_access_key: sk.to_string(),
                session_token: props.get("aws_session_token").map(|s| s.to_string()),
                expires_in: None,
            }),
            _ => None,
        }
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let profile = ctx
            .env_var(AWS_PROFILE)
            .unwrap_or_else(|| self.profile.clone());

        if let Some(conf) = Self::load_file(
            ctx,
            self.credentials_file.as_ref(),
            AWS_SHARED_CREDENTIALS_FILE,
            "~/.aws/credentials",
        )
        .await?
        {
            if let Some(cred) = Self::credential_from_section(&conf, &profile) {
                return Ok(Some(cred));
            }
        }

        let Some(conf) = Self::load_file(
            ctx,
            self.config_file.as_ref(),
            AWS_CONFIG_FILE,
            "~/.aws/config",
        )
        .await?
        else {
            return Ok(None);
        };

        // Named profiles live under `[profile <name>]` in the config file.
        let section = match profile.as_str() {
            "default" => "default".to_string(),
            x => format!("profile {x}"),
        };
        Ok(Self::credential_from_section(&conf, &section))
    }
}
