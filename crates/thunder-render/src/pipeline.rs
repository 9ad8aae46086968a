//! The frame pipeline.
//!
//! A frame runs the shadow pass, the object-id picking pass and the main
//! pass, in that order, against named render targets. Post effects run on
//! request afterwards. Everything goes through a [`CommandBuffer`], so the
//! same pipeline drives the wgpu backend and the recording backend used in
//! tests.

use std::collections::HashMap;

use glam::{Vec2, Vec3, Vec4};
use thunder_core::{
    id_to_color, Camera, CommandBuffer, FrameStats, GlobalValue, Layer, Node, PickResult,
    PipelineOptions, Scene, SharedController, TextureFormat, TextureHandle,
};

use crate::post_effect::PostEffect;
use crate::shadow_map::light_view_projection;

/// Object-id pick target.
pub const SELECT_MAP: &str = "selectMap";
/// Depth target shared by the picking and main passes.
pub const DEPTH_MAP: &str = "depthMap";
/// Directional light shadow map.
pub const SHADOW_MAP: &str = "shadowMap";
/// Main color target.
pub const COLOR_MAP: &str = "colorMap";

const INITIAL_SCREEN_SIZE: u32 = 64;

/// Multi-pass frame renderer generic over its command buffer.
pub struct Pipeline<B: CommandBuffer> {
    buffer: B,
    options: PipelineOptions,
    targets: HashMap<String, TextureHandle>,
    post_effects: Vec<Box<dyn PostEffect<B>>>,
    controller: Option<SharedController>,
    engine_controller: Option<SharedController>,
    screen_size: (u32, u32),
    world_cursor: Vec3,
}

impl<B: CommandBuffer> Pipeline<B> {
    /// Creates the pipeline and its render targets.
    pub fn new(buffer: B, options: PipelineOptions) -> Self {
        let mut pipeline = Self {
            buffer,
            options,
            targets: HashMap::new(),
            post_effects: Vec::new(),
            controller: None,
            engine_controller: None,
            screen_size: (INITIAL_SCREEN_SIZE, INITIAL_SCREEN_SIZE),
            world_cursor: Vec3::ZERO,
        };

        let shadow_size = pipeline.options.shadow_map_size.max(1);
        let size = INITIAL_SCREEN_SIZE;
        pipeline.create_target(SELECT_MAP, TextureFormat::Rgba8, size, size);
        pipeline.create_target(DEPTH_MAP, TextureFormat::Depth32, size, size);
        pipeline.create_target(SHADOW_MAP, TextureFormat::Depth32, shadow_size, shadow_size);
        pipeline.create_target(COLOR_MAP, TextureFormat::Rgba8, size, size);
        pipeline
    }

    fn create_target(&mut self, name: &str, format: TextureFormat, width: u32, height: u32) {
        match self.buffer.create_texture(name, format, width, height) {
            Some(texture) => {
                self.targets.insert(name.to_string(), texture);
            }
            None => log::warn!("could not allocate render target '{name}'"),
        }
    }

    /// Returns the command buffer.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Returns the command buffer mutably.
    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    /// Consumes the pipeline and returns the command buffer.
    pub fn into_buffer(self) -> B {
        self.buffer
    }

    /// Returns the pipeline options.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Looks up a named render target.
    pub fn pipeline_texture(&self, name: &str) -> Option<TextureHandle> {
        self.targets.get(name).copied()
    }

    /// Current screen size in pixels.
    pub fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    /// World position under the cursor from the last successful pick.
    pub fn world_cursor(&self) -> Vec3 {
        self.world_cursor
    }

    /// Counters of the frame in progress.
    pub fn stats(&self) -> FrameStats {
        self.buffer.stats()
    }

    /// Sets the local (editor viewport) controller.
    pub fn set_controller(&mut self, controller: Option<SharedController>) {
        self.controller = controller;
    }

    /// Sets the engine controller used when there is no local one.
    pub fn set_engine_controller(&mut self, controller: Option<SharedController>) {
        self.engine_controller = controller;
    }

    /// Appends a post effect and sizes it to the screen.
    pub fn add_post_effect(&mut self, mut effect: Box<dyn PostEffect<B>>) {
        let (width, height) = self.screen_size;
        effect.resize(&mut self.buffer, width, height);
        self.post_effects.push(effect);
    }

    /// Number of post effects in the chain.
    pub fn post_effect_count(&self) -> usize {
        self.post_effects.len()
    }

    /// The camera for this frame, with its aspect matched to the screen.
    ///
    /// The local controller wins; the engine controller is the fallback.
    pub fn active_camera(&self) -> Option<Camera> {
        let from = |c: &Option<SharedController>| c.as_ref().and_then(|c| c.borrow().active_camera());
        let mut camera = from(&self.controller).or_else(|| from(&self.engine_controller))?;
        let (width, height) = self.screen_size;
        camera.set_ratio(width as f32 / height as f32);
        Some(camera)
    }

    fn active_controller(&self) -> Option<&SharedController> {
        self.controller.as_ref().or(self.engine_controller.as_ref())
    }

    /// Cursor of the active controller in top-left framebuffer pixels.
    pub fn cursor(&self) -> Option<Vec2> {
        self.active_controller()
            .map(|controller| controller.borrow().select_geometry())
    }

    /// Resizes the screen-sized targets and every post effect.
    ///
    /// The shadow map keeps its size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.screen_size = (width, height);
        for name in [SELECT_MAP, DEPTH_MAP, COLOR_MAP] {
            if let Some(texture) = self.pipeline_texture(name) {
                self.buffer.resize_texture(texture, width, height);
            }
        }
        for effect in &mut self.post_effects {
            effect.resize(&mut self.buffer, width, height);
        }
    }

    /// Renders a frame: shadows, picking, lights and the main pass.
    pub fn draw(&mut self, scene: &Scene, frame_index: u64) {
        log::trace!("frame {frame_index}");
        self.buffer.reset_stats();
        self.buffer
            .set_global_value("light.ambient", GlobalValue::Vec4(scene.ambient));

        if let Some(shadow_map) = self.pipeline_texture(SHADOW_MAP) {
            self.buffer.set_render_target(None, Some(shadow_map));
            self.buffer.clear_render_target(false, Vec4::ZERO, true, 1.0);
            self.update_shadows(&scene.root, &scene.root);
        }

        let (width, height) = self.screen_size;
        self.buffer.set_viewport(0, 0, width, height);

        self.analyze_scene(&scene.root);
        self.update_lights(&scene.root);
        self.draw_main(&scene.root);
    }

    /// Renders shadow casters from every shadow-casting light under `node`.
    fn update_shadows(&mut self, root: &Node, node: &Node) {
        if node.is_actor_disabled() {
            return;
        }
        if let Some(light) = node.as_light() {
            if light.casts_shadows {
                let size = self.options.shadow_map_size.max(1);
                let (view, projection) =
                    light_view_projection(light.shadow_center, light.shadow_radius, light.direction);
                self.buffer.set_viewport(0, 0, size, size);
                self.buffer.set_view_projection(view, projection);
                self.buffer
                    .set_global_value("light.matrix", GlobalValue::Mat4(projection * view));
                log::trace!("shadow pass for '{}'", node.name);
                self.draw_components(root, Layer::SHADOWCAST);
            }
            return;
        }
        for child in &node.children {
            self.update_shadows(root, child);
        }
    }

    /// Binds camera matrices and globals for the screen-sized passes.
    fn camera_reset(&mut self, camera: &Camera) {
        let (width, height) = self.screen_size;
        let (view, projection) = camera.matrices();
        self.buffer.set_view_projection(view, projection);
        self.buffer
            .set_global_value("camera.position", GlobalValue::Vec3(camera.position));
        self.buffer
            .set_global_value("camera.view", GlobalValue::Mat4(view));
        self.buffer
            .set_global_value("camera.projection", GlobalValue::Mat4(projection));
        self.buffer.set_global_value(
            "camera.screen",
            GlobalValue::Vec4(Vec4::new(
                width as f32,
                height as f32,
                1.0 / width as f32,
                1.0 / height as f32,
            )),
        );
    }

    /// Draws every drawable under `node` for `layer`.
    ///
    /// Disabled actors hide their subtree. In the picking layer each
    /// drawable's color is set to its encoded object id first.
    pub fn draw_components(&mut self, node: &Node, layer: Layer) {
        if node.is_actor_disabled() {
            return;
        }
        if let Some(drawable) = node.as_drawable() {
            if layer.contains(Layer::RAYCAST) {
                self.buffer.set_color(id_to_color(drawable.object_id()));
            }
            drawable.draw(&mut self.buffer, layer);
        }
        for child in &node.children {
            self.draw_components(child, layer);
        }
    }

    /// Renders object ids into the pick target and picks at the cursor.
    pub fn analyze_scene(&mut self, root: &Node) -> PickResult {
        let (Some(select), Some(depth)) = (
            self.pipeline_texture(SELECT_MAP),
            self.pipeline_texture(DEPTH_MAP),
        ) else {
            return PickResult::empty();
        };
        let Some(camera) = self.active_camera() else {
            log::debug!("no active camera; picking skipped");
            return PickResult::empty();
        };

        let (width, height) = self.screen_size;
        self.buffer.set_render_target(Some(select), Some(depth));
        self.buffer.set_viewport(0, 0, width, height);
        self.buffer.clear_render_target(true, Vec4::ZERO, true, 1.0);
        self.camera_reset(&camera);
        self.draw_components(root, Layer::RAYCAST);

        match self.cursor() {
            Some(cursor) => self.pick(cursor),
            None => PickResult::empty(),
        }
    }

    /// Reads the object id and world position under `cursor`.
    ///
    /// `cursor` is in top-left framebuffer pixels. This blocks until the
    /// pick target is available. The selection is forwarded to the active
    /// controller.
    pub fn pick(&mut self, cursor: Vec2) -> PickResult {
        let result = self.read_pick(cursor);
        if let Some(controller) = self.active_controller() {
            controller
                .borrow_mut()
                .set_selected_objects(&result.selection());
        }
        result
    }

    fn read_pick(&mut self, cursor: Vec2) -> PickResult {
        let (width, height) = self.screen_size;
        let in_bounds = cursor.x >= 0.0
            && cursor.y >= 0.0
            && cursor.x < width as f32
            && cursor.y < height as f32;
        if !in_bounds {
            return PickResult::empty();
        }
        let Some(select) = self.pipeline_texture(SELECT_MAP) else {
            return PickResult::empty();
        };

        let x = cursor.x as u32;
        let y = height - 1 - cursor.y as u32;
        let object = self
            .buffer
            .read_pixel(select, x, y)
            .and_then(thunder_core::decode_id);

        let depth = self
            .pipeline_texture(DEPTH_MAP)
            .and_then(|texture| self.buffer.read_depth(texture, x, y));
        let world_position = depth.and_then(|depth| {
            let camera = self.active_camera()?;
            let (view, projection) = camera.matrices();
            let screen = Vec3::new(
                (cursor.x.floor() + 0.5) / width as f32,
                (cursor.y.floor() + 0.5) / height as f32,
                depth,
            );
            Camera::unproject(screen, view, projection)
        });
        if let Some(world) = world_position {
            self.world_cursor = world;
        }

        PickResult {
            object,
            world_position,
            depth,
        }
    }

    /// Publishes every directional light to the light globals.
    pub fn update_lights(&mut self, node: &Node) {
        if node.is_actor_disabled() {
            return;
        }
        if let Some(light) = node.as_light() {
            let (view, projection) =
                light_view_projection(light.shadow_center, light.shadow_radius, light.direction);
            self.buffer
                .set_global_value("light.direction", GlobalValue::Vec3(light.direction));
            self.buffer
                .set_global_value("light.color", GlobalValue::Vec4(light.color));
            self.buffer
                .set_global_value("light.matrix", GlobalValue::Mat4(projection * view));
        }
        for child in &node.children {
            self.update_lights(child);
        }
    }

    /// Renders opaque then translucent geometry into the color target.
    pub fn draw_main(&mut self, root: &Node) {
        let Some(camera) = self.active_camera() else {
            log::debug!("no active camera; main pass skipped");
            return;
        };
        let Some(color) = self.pipeline_texture(COLOR_MAP) else {
            return;
        };
        let depth = self.pipeline_texture(DEPTH_MAP);

        let (width, height) = self.screen_size;
        self.buffer.set_render_target(Some(color), depth);
        self.buffer.set_viewport(0, 0, width, height);
        self.buffer
            .clear_render_target(true, self.options.background_color, true, 1.0);
        self.camera_reset(&camera);
        self.draw_components(root, Layer::DEFAULT);
        self.draw_components(root, Layer::TRANSLUCENT);
    }

    /// Runs the post effects in order, starting from `source`.
    pub fn post_process(&mut self, source: TextureHandle) -> TextureHandle {
        let Self {
            buffer,
            post_effects,
            ..
        } = self;
        post_effects.iter_mut().fold(source, |texture, effect| {
            log::trace!("post effect '{}'", effect.name());
            effect.draw(texture, buffer)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use thunder_core::{
        CameraController, Controller, DirectionalLight, Mesh, MeshRenderer, PrimitiveMode,
        RecordingCommandBuffer, Surface,
    };

    fn options() -> PipelineOptions {
        PipelineOptions::default().with_shadow_map_size(16)
    }

    fn pipeline() -> Pipeline<RecordingCommandBuffer> {
        Pipeline::new(RecordingCommandBuffer::new(), options())
    }

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

    fn controller() -> Rc<RefCell<CameraController>> {
        CameraController::new(Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0)).shared()
    }

    struct Relabel {
        name: &'static str,
        output: Option<TextureHandle>,
        log: Rc<RefCell<Vec<(&'static str, TextureHandle)>>>,
        resizes: Rc<RefCell<u32>>,
    }

    impl PostEffect<RecordingCommandBuffer> for Relabel {
        fn name(&self) -> &str {
            self.name
        }

        fn draw(&mut self, source: TextureHandle, _buffer: &mut RecordingCommandBuffer) -> TextureHandle {
            self.log.borrow_mut().push((self.name, source));
            self.output.unwrap_or(source)
        }

        fn resize(&mut self, buffer: &mut RecordingCommandBuffer, width: u32, height: u32) {
            *self.resizes.borrow_mut() += 1;
            match self.output {
                Some(output) => buffer.resize_texture(output, width, height),
                None => {
                    self.output = buffer.create_texture(self.name, TextureFormat::Rgba8, width, height);
                }
            }
        }
    }

    #[test]
    fn test_targets_created() {
        let pipeline = pipeline();
        let buffer = pipeline.buffer();
        let select = pipeline.pipeline_texture(SELECT_MAP).unwrap();
        let shadow = pipeline.pipeline_texture(SHADOW_MAP).unwrap();
        assert_eq!(buffer.texture_size(select), Some((64, 64)));
        assert_eq!(buffer.texture_size(shadow), Some((16, 16)));
        assert!(pipeline.pipeline_texture(DEPTH_MAP).is_some());
        assert!(pipeline.pipeline_texture(COLOR_MAP).is_some());
        assert!(pipeline.pipeline_texture("missing").is_none());
    }

    #[test]
    fn test_empty_post_chain_is_identity() {
        let mut pipeline = pipeline();
        let color = pipeline.pipeline_texture(COLOR_MAP).unwrap();
        assert_eq!(pipeline.post_process(color), color);
    }

    #[test]
    fn test_post_chain_runs_in_order() {
        let mut pipeline = pipeline();
        let log = Rc::new(RefCell::new(Vec::new()));
        let resizes = Rc::new(RefCell::new(0));
        for name in ["first", "second"] {
            pipeline.add_post_effect(Box::new(Relabel {
                name,
                output: None,
                log: log.clone(),
                resizes: resizes.clone(),
            }));
        }
        let color = pipeline.pipeline_texture(COLOR_MAP).unwrap();
        let result = pipeline.post_process(color);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], ("first", color));
        assert_eq!(log[1].0, "second");
        assert_ne!(log[1].1, color);
        assert_ne!(result, log[1].1);
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut once = pipeline();
        once.resize(320, 200);
        let mut twice = pipeline();
        twice.resize(320, 200);
        twice.resize(320, 200);

        for name in [SELECT_MAP, DEPTH_MAP, COLOR_MAP, SHADOW_MAP] {
            let a = once.pipeline_texture(name).unwrap();
            let b = twice.pipeline_texture(name).unwrap();
            assert_eq!(once.buffer().texture_size(a), twice.buffer().texture_size(b));
        }
        assert_eq!(once.screen_size(), twice.screen_size());
        let shadow = twice.pipeline_texture(SHADOW_MAP).unwrap();
        assert_eq!(twice.buffer().texture_size(shadow), Some((16, 16)));
    }

    #[test]
    fn test_resize_reaches_post_effects() {
        let mut pipeline = pipeline();
        let resizes = Rc::new(RefCell::new(0));
        pipeline.add_post_effect(Box::new(Relabel {
            name: "fx",
            output: None,
            log: Rc::default(),
            resizes: resizes.clone(),
        }));
        pipeline.resize(100, 50);
        assert_eq!(*resizes.borrow(), 2);
    }

    #[test]
    fn test_pick_decodes_little_endian() {
        let mut pipeline = pipeline();
        let controller = controller();
        pipeline.set_controller(Some(controller.clone()));
        let select = pipeline.pipeline_texture(SELECT_MAP).unwrap();
        // Cursor (10, 20) from the top is row 64 - 1 - 20 from the bottom
        pipeline
            .buffer_mut()
            .write_pixel(select, 10, 43, [0x44, 0x33, 0x22, 0x11]);

        let result = pipeline.pick(Vec2::new(10.0, 20.0));
        assert_eq!(result.object, Some(0x1122_3344));
        assert_eq!(controller.borrow().selection(), &[0x1122_3344]);
    }

    #[test]
    fn test_pick_background_is_empty() {
        let mut pipeline = pipeline();
        let controller = controller();
        pipeline.set_controller(Some(controller.clone()));
        controller.borrow_mut().set_selected_objects(&[9]);

        let result = pipeline.pick(Vec2::new(5.0, 5.0));
        assert!(result.is_empty());
        assert!(controller.borrow().selection().is_empty());
    }

    #[test]
    fn test_pick_out_of_bounds_ignores_buffer() {
        let mut pipeline = pipeline();
        let select = pipeline.pipeline_texture(SELECT_MAP).unwrap();
        for x in 0..64 {
            for y in 0..64 {
                pipeline.buffer_mut().write_pixel(select, x, y, [1, 0, 0, 0]);
            }
        }
        for cursor in [
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, -0.5),
            Vec2::new(64.0, 0.0),
            Vec2::new(0.0, 64.0),
        ] {
            assert!(pipeline.pick(cursor).is_empty());
        }
        assert!(!pipeline.pick(Vec2::new(63.0, 63.0)).is_empty());
    }

    #[test]
    fn test_local_controller_wins() {
        let mut pipeline = pipeline();
        let engine = CameraController::new(Camera::looking_at(Vec3::X * 9.0, Vec3::ZERO, 1.0)).shared();
        pipeline.set_engine_controller(Some(engine));
        assert_eq!(pipeline.active_camera().unwrap().position, Vec3::X * 9.0);

        pipeline.set_controller(Some(controller()));
        assert_eq!(pipeline.active_camera().unwrap().position, Vec3::Z * 5.0);
    }

    #[test]
    fn test_no_camera_skips_passes() {
        let mut pipeline = pipeline();
        let mut scene = Scene::new();
        scene.root.add_child(Node::component("tri", MeshRenderer::new(1, triangle())));
        pipeline.draw(&scene, 0);

        let buffer = pipeline.buffer();
        assert_eq!(buffer.draws().count(), 0);
        assert_eq!(
            buffer.global_value("light.ambient"),
            Some(GlobalValue::Vec4(scene.ambient))
        );
    }

    #[test]
    fn test_disabled_actor_subtree_skipped() {
        let mut pipeline = pipeline();
        let root = Node::container("root")
            .with_child(Node::component("visible", MeshRenderer::new(1, triangle())))
            .with_child(
                Node::actor("hidden", false)
                    .with_child(Node::component("child", MeshRenderer::new(2, triangle()))),
            )
            .with_child(
                Node::actor("shown", true)
                    .with_child(Node::component("child", MeshRenderer::new(3, triangle()))),
            );

        pipeline.draw_components(&root, Layer::RAYCAST);
        let colors: Vec<Vec4> = pipeline.buffer().draws().map(|d| d.color).collect();
        assert_eq!(colors, vec![id_to_color(1), id_to_color(3)]);
    }

    #[test]
    fn test_frame_picks_drawn_object() {
        let mut pipeline = Pipeline::new(RecordingCommandBuffer::new().with_coverage(0.5), options());
        let controller = controller();
        controller.borrow_mut().cursor = Vec2::new(32.0, 32.0);
        pipeline.set_controller(Some(controller.clone()));

        let mut scene = Scene::new();
        scene.root.add_child(Node::component("tri", MeshRenderer::new(0x0102_0304, triangle())));
        pipeline.draw(&scene, 1);

        assert_eq!(controller.borrow().selection(), &[0x0102_0304]);
        // Coverage writes depth 0.5, which unprojects in front of the camera
        let world = pipeline.world_cursor();
        assert!(world.z < 5.0 && world.z > -1000.0);
        // One pick draw plus one opaque draw
        assert_eq!(pipeline.stats().draw_calls, 2);
    }

    #[test]
    fn test_shadow_pass_stops_at_lights() {
        let mut pipeline = pipeline();
        let root = Node::container("root")
            .with_child(Node::component("caster", MeshRenderer::new(1, triangle())))
            .with_child(
                Node::light("sun", DirectionalLight::default())
                    .with_child(Node::light("nested", DirectionalLight::default())),
            );
        let scene = Scene {
            ambient: Vec4::ONE,
            root,
        };
        pipeline.draw(&scene, 0);

        let shadow_draws = pipeline
            .buffer()
            .draws()
            .filter(|d| d.layer == Layer::SHADOWCAST)
            .count();
        assert_eq!(shadow_draws, 1);
        assert!(matches!(
            pipeline.buffer().global_value("light.direction"),
            Some(GlobalValue::Vec3(_))
        ));
    }

    #[test]
    fn test_main_pass_orders_layers() {
        let mut pipeline = pipeline();
        pipeline.set_controller(Some(controller()));
        let glass = thunder_core::Material::new("glass", true).create_instance();
        let root = Node::container("root")
            .with_child(Node::component(
                "glass",
                MeshRenderer::new(1, triangle()).with_material(glass),
            ))
            .with_child(Node::component("solid", MeshRenderer::new(2, triangle())));
        pipeline.draw_main(&root);

        let layers: Vec<Layer> = pipeline.buffer().draws().map(|d| d.layer).collect();
        assert_eq!(layers, vec![Layer::DEFAULT, Layer::TRANSLUCENT]);
        let color = pipeline.pipeline_texture(COLOR_MAP).unwrap();
        assert!(pipeline
            .buffer()
            .draws()
            .all(|d| d.color_target == Some(color)));
    }
}
