#[cfg(feature = "console-subscriber")]
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

use anyhow::Result;
#[cfg(feature = "console-subscriber")]
use tempfile::{NamedTempFile, TempPath};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var holding extra filter directives, in `RUST_LOG` syntax.
pub const LOG_ENV: &str = "FCITX_IM_LOG";

/// Keeps resources of the log subscriber alive.
pub struct LogGuard {
    #[cfg(feature = "console-subscriber")]
    console_socket: TempPath,
}

impl LogGuard {
    fn new() -> Result<Self> {
        Ok(Self {
            #[cfg(feature = "console-subscriber")]
            console_socket: NamedTempFile::with_prefix("fcitx-im-console-")?.into_temp_path(),
        })
    }
}

#[cfg(feature = "console-subscriber")]
impl Display for LogGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "tokio-console socket: {:?}", self.console_socket)
    }
}

/// Filter built from [`LOG_ENV`] and `directives`, `directives` win on conflicts.
///
/// Warnings are on by default: failed calls to the daemon are only reported through them.
pub fn env_filter(directives: &[String]) -> Result<EnvFilter> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    for directive in directives {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

/// Installs the global subscriber, writing to stderr so it stays apart from command output.
pub fn init_log(directives: &[String], log_timestamp: bool) -> Result<LogGuard> {
    let log_guard = LogGuard::new()?;
    let subscriber = tracing_subscriber::registry().with(env_filter(directives)?);
    #[cfg(feature = "console-subscriber")]
    let subscriber = {
        let socket = log_guard.console_socket.to_path_buf();
        // The console layer binds the socket itself.
        std::fs::remove_file(&socket)?;
        subscriber.with(
            console_subscriber::ConsoleLayer::builder()
                .with_default_env()
                .server_addr(socket)
                .spawn(),
        )
    };

    let layer = fmt::layer().with_writer(io::stderr).with_target(false);
    if log_timestamp {
        subscriber.with(layer).try_init()?;
    } else {
        subscriber.with(layer.without_time()).try_init()?;
    }
    #[cfg(feature = "console-subscriber")]
    tracing::debug!("{}", log_guard);
    Ok(log_guard)
}
