use std::fmt;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::{FmtSpan, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter, Layer};

use super::app_config::AppConfig;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, field::Empty, instrument, span};
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber described by the `logging` config table.
///
/// `produces_output` tells whether the command prints its result on stdout,
/// in which case auto-switching terminal outputs move to stderr.
pub fn setup(config: &AppConfig, produces_output: bool) -> Result<LoggingGuard> {
    let cfg: LoggingConfig = match config.get("logging") {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("using default logging, cannot read config: {}", err);
            LoggingConfig::default()
        }
    };
    LoggingGuard::install(&cfg, produces_output)
}

/// Flushes the non-blocking writers on drop, must be held in main
pub struct LoggingGuard {
    _worker_guards: Vec<WorkerGuard>,
}

impl LoggingGuard {
    fn install(cfg: &LoggingConfig, produces_output: bool) -> Result<Self> {
        let mut worker_guards = vec![];
        let layers: Vec<BoxedLayer> = cfg
            .outputs
            .iter()
            .filter(|output| output.enabled)
            .map(|output| {
                let (writer, guard) = output.target.to_writer(produces_output);
                worker_guards.push(guard);
                output.to_layer(&cfg.filter, writer)
            })
            .collect();

        Registry::default().with(layers).try_init()?;

        Ok(Self {
            _worker_guards: worker_guards,
        })
    }
}

struct ISOTimeFormat;

impl FormatTime for ISOTimeFormat {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Config to Layer ======

impl LoggingOutput {
    fn to_layer(&self, global_filter: &FilterConfig, writer: NonBlocking) -> BoxedLayer {
        let span_events = self
            .span_events
            .iter()
            .fold(FmtSpan::NONE, |f, e| f | (*e).into());

        FmtLayer::default()
            .with_ansi(self.target.supports_color())
            .with_target(false)
            .with_span_events(span_events)
            .with_timer(ISOTimeFormat)
            .with_writer(writer)
            .with_filter(self.filter.with_default(global_filter).to_env_filter())
            .boxed()
    }
}

impl FilterConfig {
    pub fn to_env_filter(&self) -> EnvFilter {
        let filter = match &self.from_env {
            Some(env) => EnvFilter::from_env(env),
            None => EnvFilter::default(),
        };

        match &self.directives {
            Some(dirs) => dirs
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(d) => Some(d),
                    Err(err) => {
                        eprintln!("ignoring `{}`: {}", s, err);
                        None
                    }
                })
                .fold(filter, |f, dir| f.add_directive(dir)),
            None => filter,
        }
    }

    /// Fill unset fields from `default`
    pub fn with_default(&self, default: &FilterConfig) -> FilterConfig {
        Self {
            directives: self
                .directives
                .clone()
                .or_else(|| default.directives.clone()),
            from_env: self
                .from_env
                .clone()
                .or_else(|| default.from_env.clone()),
        }
    }

    pub fn empty() -> Self {
        Self {
            directives: None,
            from_env: None,
        }
    }
}

impl LoggingTarget {
    pub fn supports_color(&self) -> bool {
        match self {
            LoggingTarget::Term(_) => true,
            LoggingTarget::File(_) => false,
        }
    }

    pub fn to_writer(&self, produces_output: bool) -> (NonBlocking, WorkerGuard) {
        let builder = NonBlockingBuilder::default().lossy(false);
        match self {
            LoggingTarget::Term(term) => match term.name {
                TermTarget::Stdout if !(term.auto_switch && produces_output) => builder.finish(std::io::stdout()),
                _ => builder.finish(std::io::stderr()),
            },
            LoggingTarget::File(file) => builder.finish(RollingFileAppender::new(
                Rotation::NEVER,
                &file.directory,
                &file.name,
            )),
        }
    }
}

impl From<SpanEvent> for FmtSpan {
    fn from(e: SpanEvent) -> Self {
        match e {
            SpanEvent::New => FmtSpan::NEW,
            SpanEvent::Enter => FmtSpan::ENTER,
            SpanEvent::Exit => FmtSpan::EXIT,
            SpanEvent::Close => FmtSpan::CLOSE,
            SpanEvent::Active => FmtSpan::ACTIVE,
            SpanEvent::Full => FmtSpan::FULL,
        }
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    filter: FilterConfig,
    #[serde(default)]
    outputs: Vec<LoggingOutput>,
}

#[derive(Debug, PartialEq, serde::Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    directives: Option<String>,
    #[serde(default, deserialize_with = "deserialize_filter_from_env")]
    from_env: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct LoggingOutput {
    enabled: bool,
    #[serde(default)]
    span_events: Vec<SpanEvent>,
    #[serde(default = "FilterConfig::empty")]
    filter: FilterConfig,
    target: LoggingTarget,
}

#[derive(Copy, Clone, Debug, serde::Deserialize)]
enum SpanEvent {
    New,
    Enter,
    Exit,
    Close,
    Active,
    Full,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
enum LoggingTarget {
    Term(TermOutput),
    File(FileOutput),
}

#[derive(Debug, serde::Deserialize)]
struct TermOutput {
    name: TermTarget,
    /// go to stderr when the command prints its result on stdout
    #[serde(default)]
    auto_switch: bool,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum TermTarget {
    Stdout,
    Stderr,
}

#[derive(Debug, serde::Deserialize)]
struct FileOutput {
    directory: PathBuf,
    name: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            directives: Some("info".into()),
            from_env: Some("RUST_LOG".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: Default::default(),
            outputs: vec![LoggingOutput {
                enabled: true,
                span_events: vec![],
                filter: FilterConfig::empty(),
                target: LoggingTarget::Term(TermOutput {
                    name: TermTarget::Stderr,
                    auto_switch: false,
                }),
            }],
        }
    }
}

// ====== serde helpers ======

/// Deserialize `false` to `None`, `true` to `Some("RUST_LOG")`, and string to `Some(xxx)`
fn deserialize_filter_from_env<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct VisitFromEnv;

    impl<'de> serde::de::Visitor<'de> for VisitFromEnv {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("bool or string")
        }

        fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(if value { Some("RUST_LOG".into()) } else { None })
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            // environment overrides arrive as strings
            Ok(match value {
                "true" => Some("RUST_LOG".into()),
                "false" => None,
                _ => Some(value.to_owned()),
            })
        }
    }

    deserializer.deserialize_any(VisitFromEnv)
}
