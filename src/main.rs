use anyhow::Result;

use crate::config::{SceneConfig, DEFAULT_SCENE_PATH};

mod animation;
mod camera;
mod config;
mod controls;
mod debug_panel;
mod diorama;
mod engine;
mod geometry;
mod lights;
mod loading;
mod model;
mod rendering;
mod scene_graph;
mod skinning;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let scene_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SCENE_PATH.to_string());

    let config = SceneConfig::from_file(&scene_path)?;
    log::info!("Loaded scene manifest {}", scene_path);

    pollster::block_on(window::run(config))?;

    Ok(())
}
