// Logger setup shared by the binary and the tests
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialise `env_logger` at `info`; `RUST_LOG` still wins.
pub fn init_log() {
  init_log_with(false);
}

/// Quiet mode lowers the default level to `warn`.
pub fn init_log_with(quiet: bool) {
  INIT.call_once(|| {
    let default_level = if quiet { "warn" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
      .format_timestamp(None)
      .format_target(false)
      .is_test(cfg!(test))
      .try_init();
  });
}
