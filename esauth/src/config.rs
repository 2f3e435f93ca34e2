use esauth_aws_v4::{AWS_DEFAULT_REGION, AWS_REGION};
use esauth_core::Context;

/// The service name Amazon Elasticsearch / OpenSearch Service signs for.
pub const DEFAULT_SERVICE: &str = "es";

/// Config for the signing connector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Region the signature is bound to.
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`]
    /// - env value: [`AWS_DEFAULT_REGION`]
    pub region: Option<String>,
    /// Service name the signature is bound to, `es` by default.
    pub service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            service: DEFAULT_SERVICE.to_string(),
        }
    }
}

impl Config {
    /// Create a config for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Default::default()
        }
    }

    /// Set the service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Fill fields that are still unset from the environment.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.region.is_none() {
            self.region = ctx
                .env_var(AWS_REGION)
                .filter(|v| !v.is_empty())
                .or_else(|| ctx.env_var(AWS_DEFAULT_REGION).filter(|v| !v.is_empty()));
        }

        self
    }
}
