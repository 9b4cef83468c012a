use cgmath::*;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

const MIN_DISTANCE_FACTOR: f32 = 1.2;
const MAX_DISTANCE_FACTOR: f32 = 20.0;

pub struct Camera {
    pub eye: cgmath::Point3<f32>,
    pub target: cgmath::Point3<f32>,
    pub up: cgmath::Vector3<f32>,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new<
        V: Into<Point3<f32>>,
        Y: Into<Point3<f32>>,
        U: Into<Vector3<f32>>,
    >(
        eye: V,
        target: Y,
        up: U,
        aspect: f32,
        fovy: f32,
        znear: f32,
        zfar: f32,
    ) -> Self {
        Self {
            eye: eye.into(),
            target: target.into(),
            up: up.into(),
            aspect,
            fovy,
            znear,
            zfar,
        }
    }

    pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
        let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
        let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);

        OPENGL_TO_WGPU_MATRIX * proj * view
    }

    pub fn update_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
    /// Direction towards the light, world space
    pub light_dir: [f32; 3],
    pub ambient: f32,
}

impl CameraUniform {
    pub fn new() -> Self {
        // Compile-time size check to ensure proper GPU buffer alignment
        const _: () = assert!(std::mem::size_of::<CameraUniform>() == 96);
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            camera_pos: [0.0; 3],
            _padding: 0.0,
            light_dir: [0.4, -0.3, 0.85],
            ambient: 0.15,
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix().into();
        self.camera_pos = camera.eye.into();
    }
}

/// Keys handled by [`CameraController::process_keyboard`]
fn is_orbit_key(key: KeyCode) -> bool {
    matches!(
        key,
        KeyCode::KeyW
            | KeyCode::ArrowUp
            | KeyCode::KeyS
            | KeyCode::ArrowDown
            | KeyCode::KeyA
            | KeyCode::ArrowLeft
            | KeyCode::KeyD
            | KeyCode::ArrowRight
            | KeyCode::KeyR
    )
}

/// Orbits the camera around the origin on a sphere of `distance`.
///
/// Yaw turns around the z axis, pitch tilts towards the poles.
pub struct CameraController {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    min_distance: f32,
    max_distance: f32,
    sensitivity: f32,
    mouse_pressed: bool,
    last_mouse_pos: Option<Vector2<f64>>,
    initial_yaw: f32,
    initial_pitch: f32,
    initial_distance: f32,
    reset_requested: bool,
}

impl CameraController {
    /// A controller framing an object of `radius` at the origin
    pub fn new(radius: f32) -> Self {
        let initial_yaw = 30.0;
        let initial_pitch = 20.0;
        let initial_distance = radius * 4.0;

        Self {
            yaw: initial_yaw,
            pitch: initial_pitch,
            distance: initial_distance,
            min_distance: radius * MIN_DISTANCE_FACTOR,
            max_distance: radius * MAX_DISTANCE_FACTOR,
            sensitivity: 0.3,
            mouse_pressed: false,
            last_mouse_pos: None,
            initial_yaw,
            initial_pitch,
            initial_distance,
            reset_requested: false,
        }
    }

    pub fn process_mouse_button(&mut self, state: ElementState) {
        if state == ElementState::Pressed {
            self.mouse_pressed = true;
        } else {
            self.mouse_pressed = false;
            self.last_mouse_pos = None;
        }
    }

    pub fn process_cursor_move(&mut self, pos: winit::dpi::PhysicalPosition<f64>) {
        if !self.mouse_pressed {
            return;
        }
        let current_pos = vec2(pos.x, pos.y);
        if let Some(last_pos) = self.last_mouse_pos {
            let delta = current_pos - last_pos;
            self.yaw -= delta.x as f32 * self.sensitivity;
            self.pitch += delta.y as f32 * self.sensitivity;
        }
        self.last_mouse_pos = Some(current_pos);
    }

    pub fn process_scroll(&mut self, delta: winit::event::MouseScrollDelta) {
        let steps = match delta {
            winit::event::MouseScrollDelta::LineDelta(_x, y) => y,
            // Pixels are small, scale them down to roughly one line each
            winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.02,
        };
        self.zoom(steps);
    }

    /// Move closer for positive `steps`, further away for negative ones
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * 0.9f32.powf(steps)).clamp(self.min_distance, self.max_distance);
    }

    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        if state != ElementState::Pressed {
            return is_orbit_key(key);
        }

        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.pitch += 5.0;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.pitch -= 5.0;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.yaw += 5.0;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.yaw -= 5.0;
                true
            }
            KeyCode::KeyR => {
                self.reset_requested = true;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.yaw = self.initial_yaw;
        self.pitch = self.initial_pitch;
        self.distance = self.initial_distance;
        self.last_mouse_pos = None;
    }

    pub fn update_camera(&mut self, camera: &mut Camera) {
        if self.reset_requested {
            self.reset_requested = false;
            self.reset();
        }

        // Stay clear of the poles so the up vector never degenerates
        self.pitch = self.pitch.clamp(-89.0, 89.0);

        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();
        let offset = Vector3::new(
            yaw_rad.cos() * pitch_rad.cos(),
            yaw_rad.sin() * pitch_rad.cos(),
            pitch_rad.sin(),
        ) * self.distance;

        camera.target = Point3::origin();
        camera.eye = camera.target + offset;
        camera.up = Vector3::unit_z();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(
            (0.0, -4.0, 0.0),
            (0.0, 0.0, 0.0),
            Vector3::unit_z(),
            1.0,
            45.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
        let uniform = CameraUniform::new();
        assert_eq!(bytemuck::bytes_of(&uniform).len(), 96);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = camera();
        let mut controller = CameraController::new(1.0);
        controller.yaw = 123.0;
        controller.pitch = -40.0;
        controller.update_camera(&mut camera);

        let distance = camera.eye.to_vec().magnitude();
        assert!((distance - controller.distance).abs() < 1e-5);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = camera();
        let mut controller = CameraController::new(1.0);
        controller.pitch = 500.0;
        controller.update_camera(&mut camera);
        assert_eq!(controller.pitch, 89.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut controller = CameraController::new(2.0);
        controller.zoom(1000.0);
        assert!((controller.distance - 2.0 * MIN_DISTANCE_FACTOR).abs() < 1e-5);
        controller.zoom(-1000.0);
        assert!((controller.distance - 2.0 * MAX_DISTANCE_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn test_reset_restores_initial_view() {
        let mut camera = camera();
        let mut controller = CameraController::new(1.0);
        controller.yaw = 10.0;
        controller.zoom(3.0);
        assert!(controller.process_keyboard(KeyCode::KeyR, ElementState::Pressed));
        controller.update_camera(&mut camera);
        assert_eq!(controller.yaw, 30.0);
        assert_eq!(controller.distance, 4.0);
    }

    #[test]
    fn test_release_consumes_the_same_keys_as_press() {
        let keys = [
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::KeyR,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
            KeyCode::KeyT,
            KeyCode::Space,
        ];
        for key in keys {
            let mut controller = CameraController::new(1.0);
            let pressed = controller.process_keyboard(key, ElementState::Pressed);
            let released = controller.process_keyboard(key, ElementState::Released);
            assert_eq!(pressed, released, "{key:?}");
        }
    }

    #[test]
    fn test_view_projection_puts_target_in_view() {
        let camera = camera();
        let clip = camera.build_view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
