use crate::error::Result;
use crate::theme::{Palette, ThemeMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub rank_spacing: f32,
    pub node_spacing: f32,
    pub margin: f32,
    /// Clearance kept between edge turns/segments and every node rect.
    pub obstacle_padding: f32,
    /// Minimum length of the last horizontal run into a target.
    pub min_approach: f32,
    pub probe_step: f32,
    pub max_probe_steps: usize,
    /// Vertical spacing between fanned-out incoming edges; 0 disables fanning.
    pub fan_spacing: f32,
    pub merge_hints: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 220.0,
            node_height: 56.0,
            rank_spacing: 80.0,
            node_spacing: 32.0,
            margin: 16.0,
            obstacle_padding: 8.0,
            min_approach: 20.0,
            probe_step: 12.0,
            max_probe_steps: 16,
            fan_spacing: 0.0,
            merge_hints: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub layout: LayoutConfig,
    pub theme_mode: ThemeMode,
    pub light: Palette,
    pub dark: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            theme_mode: ThemeMode::Light,
            light: Palette::light(),
            dark: Palette::dark(),
        }
    }
}

impl Config {
    pub fn palette(&self, mode: ThemeMode) -> &Palette {
        match mode {
            ThemeMode::Light => &self.light,
            ThemeMode::Dark => &self.dark,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfig>,
    theme: Option<ThemeMode>,
    palettes: Option<PalettesFile>,
}

#[derive(Debug, Default, Deserialize)]
struct PalettesFile {
    light: Option<PaletteFile>,
    dark: Option<PaletteFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaletteFile {
    blocked: Option<String>,
    unblocked: Option<String>,
    failed: Option<String>,
    stroke_width: Option<f32>,
    dash_array: Option<String>,
}

impl PaletteFile {
    fn apply(self, palette: &mut Palette) {
        if let Some(v) = self.blocked {
            palette.blocked = v;
        }
        if let Some(v) = self.unblocked {
            palette.unblocked = v;
        }
        if let Some(v) = self.failed {
            palette.failed = v;
        }
        if let Some(v) = self.stroke_width {
            palette.stroke_width = v;
        }
        if let Some(v) = self.dash_array {
            palette.dash_array = v;
        }
    }
}

/// Parses a JSON5 config document over the defaults. Missing keys keep their
/// default value.
pub fn parse_config(contents: &str) -> Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(mode) = parsed.theme {
        config.theme_mode = mode;
    }
    if let Some(palettes) = parsed.palettes {
        if let Some(light) = palettes.light {
            light.apply(&mut config.light);
        }
        if let Some(dark) = palettes.dark {
            dark.apply(&mut config.dark);
        }
    }
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
