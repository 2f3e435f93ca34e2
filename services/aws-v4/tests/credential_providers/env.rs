use super::create_test_context_with_env;
use esauth_aws_v4::EnvCredentialProvider;
use esauth_core::ProvideCredential;
use log::info;
use std::collections::HashMap;
use std::env;

#[tokio::test]
async fn test_env_credential_provider() {
    if env::var("ESAUTH_AWS_V4_TEST_ENV").unwrap_or_default() != "on" {
        info!("ESAUTH_AWS_V4_TEST_ENV not set, skipping");
        return;
    }

    let mut envs = HashMap::from_iter([
        (
            "AWS_ACCESS_KEY_ID".to_string(),
            env::var("AWS_ACCESS_KEY_ID").expect("AWS_ACCESS_KEY_ID must be set"),
        ),
        (
            "AWS_SECRET_ACCESS_KEY".to_string(),
            env::var("AWS_SECRET_ACCESS_KEY").expect("AWS_SECRET_ACCESS_KEY must be set"),
        ),
    ]);
    if let Ok(token) = env::var("AWS_SESSION_TOKEN") {
        envs.insert("AWS_SESSION_TOKEN".to_string(), token);
    }

    let ctx = create_test_context_with_env(envs);
    let cred = EnvCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .expect("EnvCredentialProvider should not fail")
        .expect("should load credentials from AWS_* env vars");

    assert!(!cred.access_key_id.is_empty());
    assert!(!cred.secret_access_key.is_empty());
}
