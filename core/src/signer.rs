use crate::{
    Context, Error, ProvideCredential, Result, SignRequest, SigningCredential, SigningPayload,
};
use std::sync::Arc;

/// Signer pairs a credential provider with a request signer.
///
/// Signer never caches credentials: every call to [`Signer::credential`] goes to the
/// provider. Providers that want caching implement it themselves.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            builder: Arc::new(builder),
        }
    }

    /// Replace the context.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Replace the credential provider.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = K>,
    ) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// The context credential providers run in.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Fetch a fresh credential from the provider.
    ///
    /// Fails if the provider errors, has nothing to offer, or returns an invalid credential.
    pub async fn credential(&self) -> Result<K> {
        let Some(cred) = self.provider.provide_credential(&self.ctx).await? else {
            return Err(Error::credential_invalid(
                "no valid credential found from provider",
            ));
        };

        if !cred.is_valid() {
            return Err(Error::credential_expired(
                "credential from provider is expired or incomplete",
            ));
        }

        Ok(cred)
    }

    /// Sign the request in place with the given credential.
    pub async fn sign(
        &self,
        req: &mut http::request::Parts,
        payload: SigningPayload<'_>,
        cred: &K,
    ) -> Result<()> {
        self.builder
            .sign_request(&self.ctx, req, Some(cred), payload)
            .await
    }
}
