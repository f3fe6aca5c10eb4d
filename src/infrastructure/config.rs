use crate::application::resolver::ResolverMode;
use crate::domain::forecast::DEFAULT_TIME_OFFSETS;
use crate::domain::gesture::DEFAULT_DRAG_THRESHOLD;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub overlay: OverlaySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlaySettings {
    pub mode: ResolverMode,
    pub time_offsets: Vec<u32>,
    pub drag_threshold: f64,
    pub reset_offset_on_select: bool,
}

/// Load `config/overlay.toml` (optional) with `OVERLAY__SECTION__KEY`
/// environment overrides on top of the built-in defaults.
pub fn load_overlay_config() -> anyhow::Result<OverlayConfig> {
    let builder = defaults()?
        .add_source(config::File::with_name("config/overlay").required(false))
        .add_source(
            config::Environment::with_prefix("OVERLAY")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("overlay.time_offsets")
                .try_parsing(true),
        );

    Ok(builder.build()?.try_deserialize()?)
}

fn defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let offsets: Vec<i64> = DEFAULT_TIME_OFFSETS.iter().map(|&h| i64::from(h)).collect();

    Ok(config::Config::builder()
        .set_default("server.listen_addr", "0.0.0.0:8080")?
        .set_default("api.base_url", DEFAULT_API_BASE_URL)?
        .set_default("api.timeout_ms", 5_000_i64)?
        .set_default("overlay.mode", "remote")?
        .set_default("overlay.time_offsets", offsets)?
        .set_default("overlay.drag_threshold", DEFAULT_DRAG_THRESHOLD)?
        .set_default("overlay.reset_offset_on_select", true)?)
}
