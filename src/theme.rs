use crate::ir::DependencyStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Stroke colors per dependency status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub blocked: String,
    pub unblocked: String,
    pub failed: String,
    pub stroke_width: f32,
    pub dash_array: String,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            blocked: "#a1a1aa".to_string(),
            unblocked: "#3b82f6".to_string(),
            failed: "#ef4444".to_string(),
            stroke_width: 1.5,
            dash_array: "5,5".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            blocked: "#52525b".to_string(),
            unblocked: "#60a5fa".to_string(),
            failed: "#f87171".to_string(),
            stroke_width: 1.5,
            dash_array: "5,5".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStroke {
    pub color: String,
    pub width: f32,
    pub dash_array: Option<String>,
}

pub fn edge_stroke(status: DependencyStatus, palette: &Palette) -> EdgeStroke {
    let (color, dashed) = match status {
        DependencyStatus::Unblocked => (&palette.unblocked, false),
        DependencyStatus::Blocked => (&palette.blocked, true),
        DependencyStatus::Failed => (&palette.failed, true),
    };
    EdgeStroke {
        color: color.clone(),
        width: palette.stroke_width,
        dash_array: dashed.then(|| palette.dash_array.clone()),
    }
}
