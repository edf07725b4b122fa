use crate::config::{
    CAMERA_CLOSE_DISTANCE, CAMERA_FAR_DISTANCE, CAMERA_FAR_PLANE, CAMERA_FOV_DEGREES,
    CAMERA_NEAR_PLANE, CAMERA_NORMAL_DISTANCE, DEFAULT_AUTO_ROTATION_SPEED,
    MAX_AUTO_ROTATION_STEP, MAX_VERTICAL_ROTATION, MIN_CAMERA_DISTANCE,
};
use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;

/// Above this `sin(view_angle)` the camera is treated as looking straight down.
const OVERHEAD_THRESHOLD: f32 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomLevel {
    Close,
    Normal,
    Far,
}

impl ZoomLevel {
    pub fn distance(self) -> f32 {
        match self {
            ZoomLevel::Close => CAMERA_CLOSE_DISTANCE,
            ZoomLevel::Normal => CAMERA_NORMAL_DISTANCE,
            ZoomLevel::Far => CAMERA_FAR_DISTANCE,
        }
    }

    /// Maps the host's integer zoom index; anything outside 0..=2 is `None`.
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(ZoomLevel::Close),
            1 => Some(ZoomLevel::Normal),
            2 => Some(ZoomLevel::Far),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ZoomLevel::Close => ZoomLevel::Normal,
            ZoomLevel::Normal => ZoomLevel::Far,
            ZoomLevel::Far => ZoomLevel::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub eye: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

/// Orbit camera looking at the origin plus the turntable rotation of the model.
///
/// Rotation angles are kept in `[0, 2π)` after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Stored for hosts that track it; the orbit always centres on the origin.
    height: f32,
    distance: f32,
    view_angle: f32,
    rotation_x: f32,
    rotation_y: f32,
    rotation_z: f32,
    auto_rotate: bool,
    auto_rotation_speed: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            height: 0.0,
            distance: CAMERA_NORMAL_DISTANCE,
            view_angle: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            auto_rotate: false,
            auto_rotation_speed: DEFAULT_AUTO_ROTATION_SPEED,
        }
    }
}

impl CameraState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_height(&mut self, height: f32) {
        if height.is_finite() {
            self.height = height;
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Distances below 1.0 are raised to 1.0. Non-finite input is ignored.
    pub fn set_distance(&mut self, distance: f32) {
        if distance.is_finite() {
            self.distance = distance.max(MIN_CAMERA_DISTANCE);
        }
    }

    pub fn view_angle(&self) -> f32 {
        self.view_angle
    }

    pub fn set_view_angle(&mut self, angle: f32) {
        if angle.is_finite() {
            self.view_angle = angle;
        }
    }

    /// Tilts the camera, keeping it within the vertical rotation limit.
    pub fn adjust_view_angle(&mut self, delta: f32) {
        if delta.is_finite() {
            self.view_angle =
                (self.view_angle + delta).clamp(-MAX_VERTICAL_ROTATION, MAX_VERTICAL_ROTATION);
        }
    }

    /// (pitch, yaw, roll) in radians.
    pub fn model_rotation(&self) -> (f32, f32, f32) {
        (self.rotation_x, self.rotation_y, self.rotation_z)
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    pub fn auto_rotation_speed(&self) -> f32 {
        self.auto_rotation_speed
    }

    pub fn set_auto_rotation_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.auto_rotation_speed = speed;
        }
    }

    pub fn toggle_auto_rotation(&mut self) {
        self.auto_rotate = !self.auto_rotate;
    }

    /// Applies a drag delta (already scaled to radians).
    ///
    /// The pitch direction flips with the sign of `cos(yaw)` so that dragging up
    /// tilts the visible front upwards. The flip is discontinuous at yaw = π/2 and 3π/2.
    pub fn update_model_rotation(&mut self, delta_x: f32, delta_y: f32) {
        if !delta_x.is_finite() || !delta_y.is_finite() {
            return;
        }

        self.rotation_y -= delta_x;
        let direction = if self.rotation_y.cos() > 0.0 { 1.0 } else { -1.0 };
        self.rotation_x -= delta_y * direction;

        self.rotation_x = wrap_angle(self.rotation_x);
        self.rotation_y = wrap_angle(self.rotation_y);
    }

    pub fn reset_model_rotation(&mut self) {
        self.rotation_x = 0.0;
        self.rotation_y = 0.0;
        self.rotation_z = 0.0;
    }

    /// Advances the turntable yaw. Steps longer than 0.1 s are capped.
    pub fn update_auto_rotation(&mut self, delta_time: f32) {
        if !self.auto_rotate || !delta_time.is_finite() {
            return;
        }
        let capped = delta_time.min(MAX_AUTO_ROTATION_STEP);
        self.rotation_y = wrap_angle(self.rotation_y + self.auto_rotation_speed * capped);
    }

    pub fn basis(&self) -> CameraBasis {
        let (sin_tilt, cos_tilt) = self.view_angle.sin_cos();
        let eye = Vec3::new(0.0, self.distance * sin_tilt, self.distance * cos_tilt);
        let forward = (-eye).normalize_or(Vec3::NEG_Z);

        // Near the poles forward is almost parallel to world Y and the cross product
        // collapses, so the right vector is pinned to world X instead.
        let right = if sin_tilt.abs() > OVERHEAD_THRESHOLD {
            Vec3::X
        } else {
            forward.cross(Vec3::Y).normalize_or(Vec3::X)
        };
        let up = right.cross(forward);

        CameraBasis {
            eye,
            right,
            up,
            forward,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        let CameraBasis {
            eye,
            right,
            up,
            forward,
        } = self.basis();

        Mat4::from_cols(
            Vec4::new(right.x, up.x, -forward.x, 0.0),
            Vec4::new(right.y, up.y, -forward.y, 0.0),
            Vec4::new(right.z, up.z, -forward.z, 0.0),
            Vec4::new(-right.dot(eye), -up.dot(eye), forward.dot(eye), 1.0),
        )
    }

    /// Yaw about world Y, then pitch about the yawed X axis. Roll is not applied.
    pub fn model_rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_y) * Mat4::from_rotation_x(self.rotation_x)
    }

    pub fn center_depth(&self) -> f32 {
        let centre = self.view_matrix() * Vec4::W;
        -centre.z
    }
}

/// Brings an angle into `[0, 2π)` by whole turns so small steps accumulate
/// without modulo rounding.
fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut angle = if angle.abs() > 4.0 * TAU {
        angle.rem_euclid(TAU)
    } else {
        angle
    };
    while angle < 0.0 {
        angle += TAU;
    }
    while angle >= TAU {
        angle -= TAU;
    }
    angle
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            aspect: 1.0,
            near: CAMERA_NEAR_PLANE,
            far: CAMERA_FAR_PLANE,
        }
    }
}

impl Projection {
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }
}
