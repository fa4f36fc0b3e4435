//! Batch render driver.
//!
//! Renders every scene in a fixed list and writes one PPM per scene (or one
//! per frame when a turntable is configured). A failure in one scene is
//! reported and the remaining scenes still render; the process exits
//! nonzero if anything failed.

use std::time::Instant;

use anyhow::{Context, Result};
use glint_core::{LoaderOptions, Scene};
use glint_render::{render, write_ppm, Camera, RenderOptions};
use log::LevelFilter;

const SCENE_FILES: &[&str] = &[
    "scenes/scene0.json",
    "scenes/scene1.json",
    "scenes/scene2.json",
    "scenes/scene3.json",
    "scenes/scene4.json",
];

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut failed = false;
    for path in SCENE_FILES {
        if let Err(err) = render_scene_file(path) {
            log::error!("{path}: {err:#}");
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn render_scene_file(path: &str) -> Result<()> {
    let scene = Scene::load(path, &LoaderOptions::default())
        .with_context(|| format!("loading {path}"))?;
    let options = RenderOptions::default();

    match options.orbit {
        Some(orbit) => {
            for frame in 0..orbit.frames {
                let camera = Camera::orbit(
                    frame,
                    orbit.frames,
                    orbit.radius,
                    orbit.height,
                    orbit.center,
                );
                let output = format!("{}_render_{}.ppm", scene.settings.scene_name, frame);
                render_one(&scene, &camera, &options, &output)?;
            }
        }
        None => {
            let camera = Camera::new(scene.camera);
            let output = format!("{}_render.ppm", scene.settings.scene_name);
            render_one(&scene, &camera, &options, &output)?;
        }
    }

    Ok(())
}

fn render_one(
    scene: &Scene,
    camera: &Camera,
    options: &RenderOptions,
    output: &str,
) -> Result<()> {
    let started = Instant::now();
    let image = render(scene, camera, options);
    log::info!(
        "rendered {} in {:.1?}",
        scene.settings.scene_name,
        started.elapsed()
    );

    write_ppm(&image, output).with_context(|| format!("writing {output}"))?;
    log::info!("wrote {output}");
    Ok(())
}
