//! Chart and export rendering for population histories.
//!
//! Every renderer takes an explicit [`ChartConfig`]; nothing here keeps
//! process-wide settings.

pub mod console;
pub mod csv;
pub mod html;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Blue,
}

pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub line: &'static str,
    pub fill: &'static str,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: "#fff",
                text: "#333",
                line: "rgb(54, 162, 235)",
                fill: "rgba(54, 162, 235, 0.1)",
            },
            Theme::Dark => Palette {
                background: "#222",
                text: "#eee",
                line: "rgb(100, 200, 100)",
                fill: "rgba(100, 200, 100, 0.1)",
            },
            Theme::Blue => Palette {
                background: "#e6f3ff",
                text: "#003366",
                line: "rgb(0, 100, 200)",
                fill: "rgba(0, 100, 200, 0.1)",
            },
        }
    }
}

fn default_width() -> usize {
    60
}

fn default_height() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            theme: Theme::default(),
        }
    }
}

/// File-safe stem for a chart title.
pub fn file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
