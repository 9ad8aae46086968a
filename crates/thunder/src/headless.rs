//! Headless rendering: one frame of a scene to an RGBA buffer or an image
//! file, without a window.

use pollster::FutureExt;
use thunder_core::{Camera, CameraController, Options, Scene, SharedController};
use thunder_render::{build_post_effects, Pipeline, WgpuCommandBuffer, COLOR_MAP};

use crate::Result;

/// Renders `scene` as seen from `camera` and returns the presented texture
/// as tightly packed RGBA rows, top row first.
///
/// # Example
/// ```no_run
/// use thunder::*;
///
/// let pixels = render_to_image(&Scene::new(), Camera::default(), &Options::default(), 320, 240).unwrap();
/// assert_eq!(pixels.len(), 320 * 240 * 4);
/// ```
pub fn render_to_image(
    scene: &Scene,
    camera: Camera,
    options: &Options,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let buffer = WgpuCommandBuffer::request_headless().block_on()?;
    let effects = build_post_effects(&buffer, &options.pipeline);

    let mut pipeline = Pipeline::new(buffer, options.pipeline.clone());
    pipeline.resize(width, height);
    for effect in effects {
        pipeline.add_post_effect(effect);
    }
    let controller: SharedController = CameraController::new(camera).shared();
    pipeline.set_controller(Some(controller));

    pipeline.draw(scene, 0);
    let Some(color) = pipeline.pipeline_texture(COLOR_MAP) else {
        return Ok(vec![0; pixel_bytes(width, height)]);
    };
    let presented = pipeline.post_process(color);
    Ok(pipeline.buffer_mut().read_texture(presented)?)
}

/// Size in bytes of an RGBA8 image, at least one pixel.
fn pixel_bytes(width: u32, height: u32) -> usize {
    width.max(1) as usize * height.max(1) as usize * 4
}

/// Renders `scene` and saves it as a PNG or JPEG file.
pub fn render_to_file(
    filename: &str,
    scene: &Scene,
    camera: Camera,
    options: &Options,
    width: u32,
    height: u32,
) -> Result<()> {
    let data = render_to_image(scene, camera, options, width, height)?;
    thunder_render::save_image(filename, &data, width.max(1), height.max(1))?;
    log::info!("saved {filename} ({width}x{height})");
    Ok(())
}
