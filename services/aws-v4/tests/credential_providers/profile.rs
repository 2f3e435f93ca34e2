use super::create_test_context_with_env;
use esauth_aws_v4::ProfileCredentialProvider;
use esauth_core::ProvideCredential;
use log::info;
use std::collections::HashMap;
use std::env;

#[tokio::test]
async fn test_profile_credential_provider() {
    if env::var("ESAUTH_AWS_V4_TEST_PROFILE").unwrap_or_default() != "on" {
        info!("ESAUTH_AWS_V4_TEST_PROFILE not set, skipping");
        return;
    }

    let mut envs = HashMap::new();
    for key in ["AWS_PROFILE", "AWS_CONFIG_FILE", "AWS_SHARED_CREDENTIALS_FILE"] {
        if let Ok(v) = env::var(key) {
            envs.insert(key.to_string(), v);
        }
    }

    let ctx = create_test_context_with_env(envs);
    let cred = ProfileCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .expect("ProfileCredentialProvider should not fail")
        .expect("should load credentials from AWS profile files");

    assert!(!cred.access_key_id.is_empty());
    assert!(!cred.secret_access_key.is_empty());
}
