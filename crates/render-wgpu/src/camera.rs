use electric_render::{OrbitPath, RenderView};
use glam::{Mat4, Vec3};

pub const MIN_DISTANCE: f32 = 50.0;
pub const MAX_DISTANCE: f32 = 200.0;

/// Spherical coordinates around the origin set by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ManualOrbit {
    yaw: f32,
    pitch: f32,
    distance: f32,
}

impl ManualOrbit {
    fn from_eye(eye: Vec3) -> Self {
        let distance = eye.length().max(f32::EPSILON);
        Self {
            yaw: eye.z.atan2(eye.x),
            pitch: (eye.y / distance).clamp(-1.0, 1.0).asin(),
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
        }
    }

    fn eye(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        ) * self.distance
    }
}

/// Camera that flies around the origin on its own and hands over to the
/// user on the first drag or scroll. `reset` returns to the automatic path.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub path: OrbitPath,
    pub aspect: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    manual: Option<ManualOrbit>,
    last_time: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            path: OrbitPath::default(),
            aspect: 16.0 / 9.0,
            sensitivity: 0.005,
            zoom_speed: 5.0,
            manual: None,
            last_time: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn is_manual(&self) -> bool {
        self.manual.is_some()
    }

    fn take_control(&mut self) -> &mut ManualOrbit {
        let eye = self.path.eye_at(self.last_time);
        self.manual.get_or_insert_with(|| ManualOrbit::from_eye(eye))
    }

    /// Drag by a pixel delta.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let sensitivity = self.sensitivity;
        let manual = self.take_control();
        manual.yaw += dx * sensitivity;
        manual.pitch = (manual.pitch + dy * sensitivity)
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Positive `delta` moves closer.
    pub fn zoom(&mut self, delta: f32) {
        let speed = self.zoom_speed;
        let manual = self.take_control();
        manual.distance = (manual.distance - delta * speed).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn reset(&mut self) {
        self.manual = None;
    }

    /// View at simulation time `time`.
    pub fn view(&mut self, time: f64) -> RenderView {
        self.last_time = time;
        let mut view = self.path.view_at(time);
        if let Some(manual) = &self.manual {
            view.eye = manual.eye();
        }
        view
    }

    pub fn distance(&self) -> f32 {
        match &self.manual {
            Some(manual) => manual.distance,
            None => self.path.eye_at(self.last_time).length(),
        }
    }

    pub fn view_projection(&mut self, time: f64) -> Mat4 {
        let aspect = self.aspect;
        self.view(time).view_projection(aspect)
    }
}
