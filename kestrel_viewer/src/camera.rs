use kestrel_core::glam::{Mat4, Vec3};

// Defaults shared by every new camera.
const YAW: f32 = -90.0;
const PITCH: f32 = 0.0;
const FOV: f32 = 45.0;
const SPEED: f32 = 15.0;
const SENSITIVITY: f32 = 0.2;
const ZOOM_SPEED: f32 = 1.5;

#[derive(Copy, Clone)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-flying camera: yaw/pitch from mouse deltas, WASD translation,
/// scroll-wheel zoom narrowing the FOV.
pub struct Camera {
    pub position: Vec3,
    forward: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,

    yaw: f32,
    pitch: f32,
    pub fov: f32,
}

impl Camera {
    pub fn new(position: Vec3) -> Camera {
        let mut camera = Camera {
            position,
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::ZERO,
            right: Vec3::ZERO,
            world_up: Vec3::Y,
            yaw: YAW,
            pitch: PITCH,
            fov: FOV,
        };
        camera.update_vectors();
        camera
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }

    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * SENSITIVITY;
        self.pitch = (self.pitch + dy * SENSITIVITY).clamp(-89.0, 89.0);
        self.update_vectors();
    }

    pub fn process_scroll(&mut self, dy: f32) {
        self.fov = (self.fov - dy * ZOOM_SPEED).clamp(1.0, 45.0);
    }

    pub fn process_keyboard(&mut self, movement: CameraMovement, delta: f32) {
        let velocity = SPEED * delta;

        match movement {
            CameraMovement::Forward => self.position += self.forward * velocity,
            CameraMovement::Backward => self.position -= self.forward * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());

        self.forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.forward.cross(self.world_up).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }
}
