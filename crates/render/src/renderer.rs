use electric_kernel::ElectricScene;
use glam::{Mat4, Vec3};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 20.0, 80.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Renderer-agnostic interface.
///
/// A renderer reads the scene as of its last tick plus a view, and produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &ElectricScene, view: &RenderView) -> Self::Output;
}

/// Text renderer for CLI output, logs and tests.
#[derive(Debug, Clone)]
pub struct DebugTextRenderer {
    /// How many instances to list per ring.
    pub instances_per_ring: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self {
            instances_per_ring: 3,
        }
    }
}

impl DebugTextRenderer {
    pub fn new(instances_per_ring: usize) -> Self {
        Self { instances_per_ring }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &ElectricScene, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (time={:.3}s, frames={}) ===",
            scene.time(),
            scene.clock().frames()
        );
        let _ = writeln!(out, "Instances: {}", scene.instance_count());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        );

        let core = scene.core_cube();
        let (axis, angle) = core.rotation.to_axis_angle();
        let _ = writeln!(
            out,
            "Core: size={:.1} spin={:.3}rad about ({:.2}, {:.2}, {:.2})",
            core.scale, angle, axis.x, axis.y, axis.z
        );

        for ring in scene.rings() {
            let _ = writeln!(out, "Ring `{}`: {} instances", ring.name(), ring.len());
            for (i, state) in ring.states().iter().take(self.instances_per_ring).enumerate() {
                let p = state.transform.position;
                let c = state.color;
                let _ = writeln!(
                    out,
                    "  [{i:>3}] pos=({:.2}, {:.2}, {:.2}) scale={:.3} rgb=({:.2}, {:.2}, {:.2})",
                    p.x, p.y, p.z, state.transform.scale, c.r, c.g, c.b
                );
            }
        }

        out
    }
}
