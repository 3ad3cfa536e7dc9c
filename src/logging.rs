use std::path::PathBuf;

use anyhow::Context;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

use crate::config;

/// Start file + stderr logging. Keep the returned handle alive until exit.
pub fn init_logging() -> anyhow::Result<LoggerHandle> {
    let log_dir = host_log_dir()?;

    // File logs at DEBUG so loader progress is kept for bug reports.
    // stderr only gets WARN+; the front end surfaces stderr to the user.
    let handle = Logger::try_with_str("debug")?
        .log_to_file(FileSpec::default().directory(log_dir).basename(config::logging::LOG_FILE_NAME))
        .rotate(
            Criterion::Size(config::logging::LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config::logging::LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .format(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    log::info!("{}", "=".repeat(60));
    log::info!("{} host starting", config::PLUGIN_NAME);
    log::info!("Version: {}", config::HOST_VERSION);
    log::info!("Platform: {}", std::env::consts::OS);
    log::info!("{}", "=".repeat(60));

    Ok(handle)
}

fn host_log_dir() -> anyhow::Result<PathBuf> {
    let home = home_dir().context("cannot determine home directory for logs")?;
    let dir = home.join(config::logging::LOG_DIR_REL);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed creating log dir {}", dir.display()))?;
    Ok(dir)
}

fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
}
