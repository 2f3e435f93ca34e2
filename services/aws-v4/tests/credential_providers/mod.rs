mod env;
mod profile;

use esauth_core::{Context, OsEnv, StaticEnv};
use esauth_file_read_tokio::TokioFileRead;
use std::collections::HashMap;

pub fn create_test_context() -> Context {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    Context::new().with_file_read(TokioFileRead).with_env(OsEnv)
}

pub fn create_test_context_with_env(envs: HashMap<String, String>) -> Context {
    let home_dir = std::env::var("HOME").ok().map(std::path::PathBuf::from);

    create_test_context().with_env(StaticEnv { home_dir, envs })
}
