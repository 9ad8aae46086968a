//! Pipeline integration tests against the recording command buffer.
//!
//! No GPU is needed: the recording backend keeps its textures in host
//! memory and, with coverage enabled, fills the viewport on every draw.

use std::sync::Arc;

use thunder::*;

fn triangle() -> Arc<Mesh> {
    Arc::new(Mesh::with_surface(
        "triangle",
        Surface::new(
            PrimitiveMode::Triangles,
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        ),
    ))
}

fn controller(cursor: Vec2) -> std::rc::Rc<std::cell::RefCell<CameraController>> {
    let mut controller =
        CameraController::new(Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0));
    controller.cursor = cursor;
    controller.shared()
}

fn pipeline(buffer: RecordingCommandBuffer) -> Pipeline<RecordingCommandBuffer> {
    let mut pipeline = Pipeline::new(buffer, PipelineOptions::default().with_shadow_map_size(32));
    pipeline.resize(40, 30);
    pipeline
}

#[test]
fn test_pick_codec_end_to_end() {
    let mut pipeline = pipeline(RecordingCommandBuffer::new());
    let controller = controller(Vec2::ZERO);
    pipeline.set_controller(Some(controller.clone()));

    let select = pipeline.pipeline_texture(SELECT_MAP).unwrap();
    // top-left cursor (3, 4) is framebuffer row 30 - 1 - 4
    pipeline
        .buffer_mut()
        .write_pixel(select, 3, 25, [0x44, 0x33, 0x22, 0x11]);
    let result = pipeline.pick(Vec2::new(3.0, 4.0));
    assert_eq!(result.object, Some(0x1122_3344));
    assert_eq!(controller.borrow().selection(), &[0x1122_3344]);

    pipeline.buffer_mut().write_pixel(select, 3, 25, [0, 0, 0, 0]);
    let result = pipeline.pick(Vec2::new(3.0, 4.0));
    assert!(result.is_empty());
    assert!(controller.borrow().selection().is_empty());
}

#[test]
fn test_out_of_bounds_cursor_is_empty() {
    let mut pipeline = pipeline(RecordingCommandBuffer::new().with_coverage(0.5));
    let controller = controller(Vec2::new(40.0, 10.0));
    pipeline.set_controller(Some(controller.clone()));

    let mut scene = Scene::new();
    scene
        .root
        .add_child(Node::component("tri", MeshRenderer::new(7, triangle())));
    pipeline.draw(&scene, 0);
    assert!(controller.borrow().selection().is_empty());

    controller.borrow_mut().cursor = Vec2::new(39.0, 29.0);
    pipeline.draw(&scene, 1);
    assert_eq!(controller.borrow().selection(), &[7]);
}

#[test]
fn test_frame_order_and_targets() {
    let mut pipeline = pipeline(RecordingCommandBuffer::new());
    pipeline.set_controller(Some(controller(Vec2::new(1.0, 1.0))));

    let mut scene = Scene::new();
    scene.root.add_child(Node::component(
        "caster",
        MeshRenderer::new(1, triangle()),
    ));
    scene.root.add_child(Node::light(
        "sun",
        DirectionalLight::new(Vec3::new(-1.0, -1.0, -1.0)).with_shadows(true),
    ));
    pipeline.draw(&scene, 0);

    let shadow = pipeline.pipeline_texture(SHADOW_MAP);
    let select = pipeline.pipeline_texture(SELECT_MAP);
    let color = pipeline.pipeline_texture(COLOR_MAP);
    let layers: Vec<(Layer, Option<TextureHandle>)> = pipeline
        .buffer()
        .draws()
        .map(|d| (d.layer, d.color_target.or(d.depth_target)))
        .collect();
    assert_eq!(
        layers,
        vec![
            (Layer::SHADOWCAST, shadow),
            (Layer::RAYCAST, select),
            (Layer::DEFAULT, color),
        ]
    );
}

#[test]
fn test_empty_post_chain_returns_source() {
    let mut pipeline = pipeline(RecordingCommandBuffer::new());
    let color = pipeline.pipeline_texture(COLOR_MAP).unwrap();
    assert_eq!(pipeline.post_effect_count(), 0);
    assert_eq!(pipeline.post_process(color), color);
}

#[test]
fn test_resize_twice_matches_once() {
    let mut once = pipeline(RecordingCommandBuffer::new());
    once.resize(120, 80);
    let mut twice = pipeline(RecordingCommandBuffer::new());
    twice.resize(120, 80);
    twice.resize(120, 80);

    for name in [SELECT_MAP, DEPTH_MAP, COLOR_MAP, SHADOW_MAP] {
        let a = once.pipeline_texture(name).unwrap();
        let b = twice.pipeline_texture(name).unwrap();
        assert_eq!(
            once.buffer().texture_size(a),
            twice.buffer().texture_size(b),
            "{name}"
        );
    }
    assert_eq!(once.screen_size(), twice.screen_size());
    assert_eq!(
        once.buffer()
            .texture_size(once.pipeline_texture(SHADOW_MAP).unwrap()),
        Some((32, 32))
    );
}

#[test]
fn test_options_from_json_drive_pipeline() {
    let options = Options::from_json_str(
        r#"{ "pipeline": { "background_color": [0.0, 0.0, 1.0, 1.0], "shadow_map_size": 8 } }"#,
    )
    .unwrap();
    let mut pipeline = Pipeline::new(RecordingCommandBuffer::new(), options.pipeline.clone());
    pipeline.set_controller(Some(controller(Vec2::ZERO)));
    pipeline.draw(&Scene::new(), 0);

    let shadow = pipeline.pipeline_texture(SHADOW_MAP).unwrap();
    assert_eq!(pipeline.buffer().texture_size(shadow), Some((8, 8)));
    let clears_blue = pipeline.buffer().commands().iter().any(|c| {
        matches!(c, Command::Clear { clear_color: true, color, .. } if *color == Vec4::new(0.0, 0.0, 1.0, 1.0))
    });
    assert!(clears_blue);
}
