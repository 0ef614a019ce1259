use std::sync::Once;

static INIT: Once = Once::new();

/// Route `log` output through env_logger once per test binary.
/// `RUST_LOG=chain_hashtable=debug` shows rehash and clear events.
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Warn)
            .parse_default_env()
            .is_test(true)
            .try_init();
    });
}
