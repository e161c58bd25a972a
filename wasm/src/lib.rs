use std::cell::RefCell;

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use workflow_graph_layout::{LayoutPipeline, ThemeMode, parse_config, parse_tasks};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowLayoutOptions {
    theme: Option<String>,
    pretty: Option<bool>,
    /// JSON5 config text, same shape as the CLI's `--config` file.
    config: Option<String>,
}

thread_local! {
    static PIPELINE: RefCell<LayoutPipeline> = RefCell::new(LayoutPipeline::default());
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn layout_with_options(tasks_json: &str, options: WorkflowLayoutOptions) -> Result<String, String> {
    let tasks = parse_tasks(tasks_json).map_err(|error| error.to_string())?;
    PIPELINE.with(|cell| {
        let mut pipeline = cell.borrow_mut();
        if let Some(raw) = options.config.as_deref() {
            let config = parse_config(raw).map_err(|error| error.to_string())?;
            if &config != pipeline.config() {
                pipeline.set_config(config);
            }
        }
        let mode = match options.theme.as_deref() {
            Some(token) => ThemeMode::from_token(token)
                .ok_or_else(|| format!("unknown theme '{token}'"))?,
            None => pipeline.config().theme_mode,
        };
        let graph = pipeline.render(&tasks, mode);
        graph
            .to_json(options.pretty.unwrap_or(false))
            .map_err(|error| error.to_string())
    })
}

/// Lays out `tasks_json` and returns the render graph as JSON. Repeated calls
/// reuse the cached layout while the task topology is unchanged.
#[wasm_bindgen]
pub fn layout_workflow(tasks_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<WorkflowLayoutOptions>(&raw).map_err(to_js)?,
        None => WorkflowLayoutOptions::default(),
    };
    layout_with_options(tasks_json, options).map_err(to_js)
}
