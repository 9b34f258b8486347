use serde::{Deserialize, Serialize};
use std::env;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable format (default for development)
    #[default]
    Pretty,
    /// Compact text format
    Compact,
    /// JSON format for log aggregation systems
    Json,
}

impl LogFormat {
    /// Parse log format from environment variable
    pub fn from_env() -> Self {
        Self::parse(&env::var("LOG_FORMAT").unwrap_or_default())
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            _ => Self::default(),
        }
    }
}

/// Configuration for structured logging
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log output format (pretty/compact/json)
    pub format: LogFormat,
    /// Service name (e.g., "ocr-service", "plate-replay")
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Node ID for multi-instance deployments
    pub node_id: Option<String>,
    /// Environment (dev/staging/production)
    pub environment: String,
    /// Enable span events (enter/exit/close)
    pub enable_span_events: bool,
    /// Log to file in addition to stdout
    pub log_to_file: bool,
    /// Log file directory
    pub log_dir: Option<String>,
    /// Write console output to stderr instead of stdout
    pub to_stderr: bool,
}

impl LogConfig {
    /// Create a new log configuration from environment defaults
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            format: LogFormat::from_env(),
            service_name: service_name.into(),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            node_id: env::var("NODE_ID").ok(),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            enable_span_events: env_flag("LOG_SPAN_EVENTS"),
            log_to_file: env_flag("LOG_TO_FILE"),
            log_dir: env::var("LOG_DIR").ok(),
            to_stderr: false,
        }
    }

    /// Set the log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Set the node ID
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Set the environment
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Enable span events (enter/exit/close)
    pub fn with_span_events(mut self, enable: bool) -> Self {
        self.enable_span_events = enable;
        self
    }

    /// Send console output to stderr, keeping stdout for program output
    pub fn with_stderr(mut self) -> Self {
        self.to_stderr = true;
        self
    }

    /// Enable logging to file
    pub fn with_file_logging(mut self, log_dir: impl Into<String>) -> Self {
        self.log_to_file = true;
        self.log_dir = Some(log_dir.into());
        self
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false)
}

fn span_events(enable: bool) -> FmtSpan {
    if enable {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in ["hyper=warn", "reqwest=warn", "tower_http=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Initialize structured logging with the given configuration.
///
/// Returns the file writer guard when file logging is enabled; keep it alive
/// for the lifetime of the process or buffered lines are lost. Calling this
/// twice is harmless: the second subscriber is not installed.
pub fn init_structured_logging(config: LogConfig) -> Option<WorkerGuard> {
    let (file_layer, guard) = match (config.log_to_file, config.log_dir.as_deref()) {
        (true, Some(log_dir)) => {
            let file_name = format!("{}.log", config.service_name);
            let file_appender = tracing_appender::rolling::daily(log_dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_span_events(span_events(config.enable_span_events))
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    let console = || {
        if config.to_stderr {
            BoxMakeWriter::new(io::stderr)
        } else {
            BoxMakeWriter::new(io::stdout)
        }
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events(config.enable_span_events))
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(console()),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_span_events(span_events(config.enable_span_events))
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(console()),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(span_events(config.enable_span_events))
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(true)
                    .with_writer(console()),
            )
            .try_init(),
    };

    if let Err(e) = installed {
        tracing::debug!(error = %e, "global subscriber already installed");
        return guard;
    }

    tracing::info!(
        service.name = %config.service_name,
        service.version = %config.service_version,
        node.id = config.node_id.as_deref().unwrap_or("-"),
        environment = %config.environment,
        format = ?config.format,
        "structured logging initialized"
    );

    guard
}

/// Initialize logging with service name
pub fn init_with_service(service_name: impl Into<String>) -> Option<WorkerGuard> {
    init_structured_logging(LogConfig::new(service_name))
}
