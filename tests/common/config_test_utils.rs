use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvRestore {
    xdg_config_home: Option<std::ffi::OsString>,
    endpoint: Option<std::ffi::OsString>,
    timeout_secs: Option<std::ffi::OsString>,
    output_dir: Option<std::ffi::OsString>,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        if let Some(value) = self.xdg_config_home.take() {
            std::env::set_var("XDG_CONFIG_HOME", value);
        } else {
            std::env::remove_var("XDG_CONFIG_HOME");
        }

        if let Some(value) = self.endpoint.take() {
            std::env::set_var("IPCHECK_ENDPOINT", value);
        } else {
            std::env::remove_var("IPCHECK_ENDPOINT");
        }

        if let Some(value) = self.timeout_secs.take() {
            std::env::set_var("IPCHECK_TIMEOUT_SECS", value);
        } else {
            std::env::remove_var("IPCHECK_TIMEOUT_SECS");
        }

        if let Some(value) = self.output_dir.take() {
            std::env::set_var("IPCHECK_OUTPUT_DIR", value);
        } else {
            std::env::remove_var("IPCHECK_OUTPUT_DIR");
        }
    }
}

fn write_config(temp_dir: &TempDir, contents: &str) {
    let app_config_dir = temp_dir.path().join("ipcheck");
    std::fs::create_dir_all(&app_config_dir).expect("create config dir");
    std::fs::write(app_config_dir.join("config.toml"), contents).expect("write config");
}

/// Runs `f` with an isolated config file and a clean `IPCHECK_*` environment.
pub fn with_config_env<T>(config_toml: &str, f: impl FnOnce() -> T) -> T {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().expect("temp dir");

    write_config(&temp_dir, config_toml);

    let restore = EnvRestore {
        xdg_config_home: std::env::var_os("XDG_CONFIG_HOME"),
        endpoint: std::env::var_os("IPCHECK_ENDPOINT"),
        timeout_secs: std::env::var_os("IPCHECK_TIMEOUT_SECS"),
        output_dir: std::env::var_os("IPCHECK_OUTPUT_DIR"),
    };

    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    std::env::remove_var("IPCHECK_ENDPOINT");
    std::env::remove_var("IPCHECK_TIMEOUT_SECS");
    std::env::remove_var("IPCHECK_OUTPUT_DIR");

    let result = f();
    drop(restore);
    result
}
