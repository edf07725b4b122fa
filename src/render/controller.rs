use super::camera::{CameraState, ZoomLevel};
use crate::config::{
    DEFAULT_AUTO_ROTATION_SPEED, ROTATION_SCALE, WHEEL_MAX_DISTANCE, WHEEL_MIN_DISTANCE,
    WHEEL_ZOOM_SENSITIVITY,
};

/// What a pointer drag currently does to the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragAction {
    None,
    Rotate,
    Tilt,
}

/// Turns pointer and wheel input into camera changes and paces auto-rotation.
///
/// Events are applied to the camera immediately; whatever state they leave
/// behind is what the next frame renders.
#[derive(Debug, Clone)]
pub struct InteractionController {
    pub rotation_scale: f32,
    dragging: bool,
    last_x: f32,
    last_y: f32,
    shift_down: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            rotation_scale: ROTATION_SCALE,
            dragging: false,
            last_x: 0.0,
            last_y: 0.0,
            shift_down: false,
        }
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag_action(&self) -> DragAction {
        match (self.dragging, self.shift_down) {
            (false, _) => DragAction::None,
            (true, false) => DragAction::Rotate,
            (true, true) => DragAction::Tilt,
        }
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.dragging = true;
        self.last_x = x;
        self.last_y = y;
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32, shift_held: bool, camera: &mut CameraState) {
        self.shift_down = shift_held;
        if !self.dragging {
            return;
        }

        let dx = (x - self.last_x) * self.rotation_scale;
        let dy = (y - self.last_y) * self.rotation_scale;
        self.last_x = x;
        self.last_y = y;

        match self.drag_action() {
            DragAction::Rotate => camera.update_model_rotation(dx, dy),
            DragAction::Tilt => camera.adjust_view_angle(dy),
            DragAction::None => {}
        }
    }

    pub fn on_pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Continuous zoom. Positive deltas (scrolling down) move the camera away.
    pub fn on_wheel(&mut self, delta: f32, camera: &mut CameraState) {
        if !delta.is_finite() {
            return;
        }
        let factor = (1.0 + delta * WHEEL_ZOOM_SENSITIVITY).max(0.1);
        let distance = (camera.distance() * factor).clamp(WHEEL_MIN_DISTANCE, WHEEL_MAX_DISTANCE);
        camera.set_distance(distance);
    }

    pub fn set_zoom_level(&mut self, level: ZoomLevel, camera: &mut CameraState) {
        camera.set_distance(level.distance());
    }

    pub fn reset_rotation(&mut self, camera: &mut CameraState) {
        camera.reset_model_rotation();
    }

    pub fn set_auto_rotation(&mut self, enabled: bool, speed: Option<f32>, camera: &mut CameraState) {
        camera.set_auto_rotate(enabled);
        camera.set_auto_rotation_speed(speed.unwrap_or(DEFAULT_AUTO_ROTATION_SPEED));
    }

    /// Feeds one frame's delta (seconds, from [`FrameState::begin_frame`]) to auto-rotation.
    ///
    /// [`FrameState::begin_frame`]: super::frame::FrameState::begin_frame
    pub fn advance(&mut self, delta: f32, camera: &mut CameraState) {
        if delta > 0.0 {
            camera.update_auto_rotation(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn move_without_drag_does_nothing() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.on_pointer_move(50.0, 50.0, false, &mut camera);
        assert_eq!(camera.model_rotation(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn drag_rotates_by_scaled_delta() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.on_pointer_down(100.0, 100.0);
        controller.on_pointer_move(50.0, 100.0, false, &mut camera);
        // dx = -50 px -> yaw += 50 * 0.004
        assert_relative_eq!(camera.model_rotation().1, 0.2, epsilon = 1e-6);

        controller.on_pointer_up();
        controller.on_pointer_move(0.0, 0.0, false, &mut camera);
        assert_relative_eq!(camera.model_rotation().1, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn shift_drag_tilts_instead_of_rotating() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.on_pointer_down(0.0, 0.0);
        controller.on_pointer_move(0.0, 100.0, true, &mut camera);
        assert_eq!(controller.drag_action(), DragAction::Tilt);
        assert_eq!(camera.model_rotation(), (0.0, 0.0, 0.0));
        assert_relative_eq!(camera.view_angle(), 0.4, epsilon = 1e-6);

        controller.on_pointer_move(0.0, 10_000.0, true, &mut camera);
        assert_eq!(camera.view_angle(), 1.5);
    }

    #[test]
    fn wheel_zoom_is_continuous_and_clamped() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.on_wheel(100.0, &mut camera);
        assert_relative_eq!(camera.distance(), 28.0 * 1.1, epsilon = 1e-4);

        controller.on_wheel(1e6, &mut camera);
        assert_eq!(camera.distance(), WHEEL_MAX_DISTANCE);
        controller.on_wheel(-1e6, &mut camera);
        assert_eq!(camera.distance(), WHEEL_MIN_DISTANCE);
        controller.on_wheel(f32::NAN, &mut camera);
        assert_eq!(camera.distance(), WHEEL_MIN_DISTANCE);
    }

    #[test]
    fn zoom_presets_jump_exactly() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.set_zoom_level(ZoomLevel::Far, &mut camera);
        assert_eq!(camera.distance(), 55.0);
        controller.set_zoom_level(ZoomLevel::Close, &mut camera);
        assert_eq!(camera.distance(), 22.0);
    }

    #[test]
    fn advance_applies_frame_delta() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.set_auto_rotation(true, Some(1.0), &mut camera);

        controller.advance(0.05, &mut camera);
        assert_relative_eq!(camera.model_rotation().1, 0.05, epsilon = 1e-6);

        controller.advance(-1.0, &mut camera);
        controller.advance(f32::NAN, &mut camera);
        assert_relative_eq!(camera.model_rotation().1, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn default_speed_when_unspecified() {
        let mut controller = InteractionController::new();
        let mut camera = CameraState::new();
        controller.set_auto_rotation(true, None, &mut camera);
        assert!(camera.auto_rotate());
        assert_eq!(camera.auto_rotation_speed(), DEFAULT_AUTO_ROTATION_SPEED);
    }
}
