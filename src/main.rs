fn main() -> anyhow::Result<()> {
    // Hold the guard so buffered log lines flush on exit.
    let _log_guard = restgate::logging::init_logging()?;
    restgate::cli::run()
}
