//! Configuration types for mediafetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use utoipa::ToSchema;

/// How to name output files when a custom filename hint is supplied
///
/// Two concurrent jobs with the same hint would otherwise write to the same
/// template. `AlwaysSuffix` makes collisions structurally impossible at the
/// cost of the exact requested name; `BestEffort` preserves the requested
/// name and accepts the (small) collision window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Append the job id to hinted filenames (default)
    #[default]
    AlwaysSuffix,
    /// Use the hinted filename as-is; same-hint concurrent jobs may collide
    BestEffort,
}

/// Fetch behavior configuration (output directory, tool invocation, buffering)
///
/// Groups settings related to how jobs are executed and where their files
/// land. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Output directory every served file must live under (default: "./downloads")
    ///
    /// Created at startup if absent; never deleted by this library.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Explicit public base URL for download links (e.g., "https://dl.example.com")
    ///
    /// When unset, the base is inferred per-request from forwarded-protocol
    /// and host headers; if neither yields a host, no link is produced even
    /// for successful jobs.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Filename collision handling for hinted output names
    #[serde(default)]
    pub collision_policy: CollisionPolicy,

    /// Path to the download tool binary (auto-detected from PATH if None)
    #[serde(default)]
    pub tool_path: Option<PathBuf>,

    /// Capacity of the per-job output line channel (default: 256)
    ///
    /// The pipe reader task awaits channel capacity instead of dropping
    /// lines, so a slow SSE consumer backpressures through this channel to
    /// the OS pipe rather than queueing unbounded memory.
    #[serde(default = "default_line_buffer_capacity")]
    pub line_buffer_capacity: usize,

    /// Kill the tool process when the client disconnects mid-stream (default: false)
    ///
    /// When false, an abandoned job runs to completion with no observers,
    /// matching the traditional behavior at the cost of a leaked process for
    /// the remainder of the run.
    #[serde(default)]
    pub kill_on_disconnect: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            public_base_url: None,
            collision_policy: CollisionPolicy::default(),
            tool_path: None,
            line_buffer_capacity: default_line_buffer_capacity(),
            kill_on_disconnect: false,
        }
    }
}

/// HTTP Basic Auth credentials for the API
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BasicAuthConfig {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8090)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional HTTP Basic Auth credentials; all routes are open when unset
    #[serde(default)]
    pub basic_auth: Option<BasicAuthConfig>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            basic_auth: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`MediaFetcher`](crate::MediaFetcher)
///
/// Fields are organized into logical sub-configs:
/// - [`fetch`](FetchConfig) — output directory, tool invocation, buffering
/// - [`api`](ApiConfig) — bind address, auth, CORS, Swagger UI
///
/// Sub-config fields are flattened for serialization, so the JSON/TOML
/// format has no nesting.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Fetch behavior settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// REST API settings
    #[serde(flatten)]
    pub api: ApiConfig,
}

impl Config {
    /// Output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.fetch.output_dir
    }

    /// Load configuration from the process environment
    ///
    /// Recognized variables:
    /// - `OUTPUT_DIR` — output directory (default "./downloads")
    /// - `PUBLIC_BASE_URL` — explicit base for download links
    /// - `PORT` — listening port on 127.0.0.1 (default 8090)
    /// - `BASIC_AUTH_USER` / `BASIC_AUTH_PASS` — enable basic auth when both set
    /// - `YTDLP_PATH` — explicit tool binary path
    ///
    /// Validation happens here, once, at startup; configuration is not
    /// revisited per request.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(dir) = std::env::var("OUTPUT_DIR")
            && !dir.is_empty()
        {
            config.fetch.output_dir = PathBuf::from(dir);
        }

        if let Ok(base) = std::env::var("PUBLIC_BASE_URL")
            && !base.is_empty()
        {
            config.fetch.public_base_url = Some(base.trim_end_matches('/').to_string());
        }

        if let Ok(path) = std::env::var("YTDLP_PATH")
            && !path.is_empty()
        {
            config.fetch.tool_path = Some(PathBuf::from(path));
        }

        if let Ok(port) = std::env::var("PORT")
            && !port.is_empty()
        {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::config(format!("invalid port: {port}"), "PORT"))?;
            config.api.bind_address = SocketAddr::from(([127, 0, 0, 1], port));
        }

        match (
            std::env::var("BASIC_AUTH_USER").ok().filter(|v| !v.is_empty()),
            std::env::var("BASIC_AUTH_PASS").ok().filter(|v| !v.is_empty()),
        ) {
            (Some(username), Some(password)) => {
                config.api.basic_auth = Some(BasicAuthConfig { username, password });
            }
            (None, None) => {}
            _ => {
                return Err(Error::config(
                    "BASIC_AUTH_USER and BASIC_AUTH_PASS must be set together",
                    "BASIC_AUTH_USER",
                ));
            }
        }

        Ok(config)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_line_buffer_capacity() -> usize {
    256
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8090))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
