use std::path::PathBuf;

use anyhow::Result;

use crate::error::ViewerError;
use crate::input::Key;

pub const CAMERA_SPEED: f32 = 0.1;
/// Degrees of yaw/pitch per pixel of pointer travel.
pub const LOOK_SENSITIVITY: f32 = 0.1;
pub const FIELD_OF_VIEW_DEG: f32 = 45.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;
pub const CLEAR_COLOR: [f64; 3] = [0.7, 0.7, 0.7];
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 2048;
pub const MAX_SHADOW_MAP_SIZE: u32 = 8192;
pub const DEFAULT_TICKS: u32 = 60;

const USAGE: &str = "Usage: shadow-viewer [--scene <file.xml>] [--size small|medium|large] \
[--shadow-size <pixels>] [--ride] [--headless] [--ticks <n>] [--hold <keys>]";

/// Window size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl WindowSize {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Small => (800, 600),
            Self::Medium => (1280, 720),
            Self::Large => (1920, 1080),
        }
    }
}

/// Command-line options of the viewer binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    pub scene: Option<PathBuf>,
    pub size: WindowSize,
    pub shadow_size: u32,
    pub start_in_ride: bool,
    pub headless: bool,
    pub ticks: u32,
    /// Keys held down for the whole headless run.
    pub hold: Vec<Key>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            scene: None,
            size: WindowSize::default(),
            shadow_size: DEFAULT_SHADOW_MAP_SIZE,
            start_in_ride: false,
            headless: false,
            ticks: DEFAULT_TICKS,
            hold: Vec::new(),
        }
    }
}

impl ViewerOptions {
    /// Parses arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| usage_error(format!("{flag} expects a value")))
            };
            match arg.as_str() {
                "--scene" => options.scene = Some(PathBuf::from(value("--scene")?)),
                "--size" => {
                    let name = value("--size")?;
                    options.size = WindowSize::from_name(&name)
                        .ok_or_else(|| usage_error(format!("Unknown window size: {name}")))?;
                }
                "--shadow-size" => {
                    let text = value("--shadow-size")?;
                    options.shadow_size = match text.parse::<u32>() {
                        Ok(size) if (1..=MAX_SHADOW_MAP_SIZE).contains(&size) => size,
                        _ => {
                            return Err(usage_error(format!(
                                "--shadow-size must be between 1 and {MAX_SHADOW_MAP_SIZE}, got {text}"
                            )))
                        }
                    };
                }
                "--ticks" => {
                    let text = value("--ticks")?;
                    options.ticks = text
                        .parse::<u32>()
                        .map_err(|_| usage_error(format!("--ticks expects a number, got {text}")))?;
                }
                "--hold" => {
                    options.hold = parse_hold(&value("--hold")?)?;
                }
                "--ride" => options.start_in_ride = true,
                "--headless" => options.headless = true,
                other => return Err(usage_error(format!("Unknown argument: {other}"))),
            }
        }
        Ok(options)
    }
}

/// Comma-separated tokens. A token is either a key name (`Escape`) or a run
/// of single-letter keys (`WA`).
fn parse_hold(text: &str) -> Result<Vec<Key>> {
    let mut keys = Vec::new();
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(key) = Key::from_name(token) {
            keys.push(key);
            continue;
        }
        for c in token.chars() {
            let key = Key::from_name(&c.to_string())
                .ok_or_else(|| usage_error(format!("Unknown key in --hold: {c}")))?;
            keys.push(key);
        }
    }
    Ok(keys)
}

fn usage_error(message: String) -> anyhow::Error {
    ViewerError::Options(format!("{message}\n{USAGE}")).into()
}
