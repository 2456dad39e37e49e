/// Constructs a logger for tests that writes to the captured test output.
pub fn test_logger() {
    // Ignore double initialisations since tests run in parallel.
    let _ = env_logger::builder().is_test(true).try_init();
}
