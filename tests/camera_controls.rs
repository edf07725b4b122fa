use approx::assert_relative_eq;
use glam::{Vec3, Vec4};
use led_shell_webgpu::config::{ROTATION_SCALE, WHEEL_MAX_DISTANCE, WHEEL_MIN_DISTANCE};
use led_shell_webgpu::render::{CameraState, DragAction, InteractionController, ZoomLevel};
use std::f32::consts::{FRAC_PI_2, TAU};

#[test]
fn default_camera_looks_down_negative_z_at_origin() {
    let camera = CameraState::new();
    let basis = camera.basis();
    assert!(basis.eye.abs_diff_eq(Vec3::new(0.0, 0.0, camera.distance()), 1e-5));
    assert!(basis.forward.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    assert_relative_eq!(camera.center_depth(), camera.distance(), epsilon = 1e-4);
}

#[test]
fn view_matrix_maps_eye_to_origin() {
    let mut camera = CameraState::new();
    camera.set_view_angle(0.6);
    camera.set_distance(40.0);
    let eye = camera.basis().eye;
    let mapped = camera.view_matrix() * eye.extend(1.0);
    assert!(mapped.abs_diff_eq(Vec4::W, 1e-4));
}

#[test]
fn overhead_view_keeps_a_finite_basis() {
    let mut camera = CameraState::new();
    camera.set_view_angle(FRAC_PI_2);
    let basis = camera.basis();
    assert!(basis.right.is_finite() && basis.up.is_finite());
    assert!(basis.right.abs_diff_eq(Vec3::X, 1e-6));
    assert!(basis.up.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    assert!(camera.view_matrix().is_finite());
}

#[test]
fn drag_session_rotates_and_wraps() {
    let mut controller = InteractionController::new();
    let mut camera = CameraState::new();

    controller.on_pointer_down(100.0, 100.0);
    controller.on_pointer_move(110.0, 100.0, false, &mut camera);
    assert_eq!(controller.drag_action(), DragAction::Rotate);

    let (pitch, yaw, roll) = camera.model_rotation();
    assert_eq!(pitch, 0.0);
    assert_eq!(roll, 0.0);
    assert_relative_eq!(yaw, TAU - 10.0 * ROTATION_SCALE, epsilon = 1e-5);

    controller.on_pointer_up();
    controller.on_pointer_move(500.0, 500.0, false, &mut camera);
    assert_relative_eq!(camera.model_rotation().1, yaw);
}

#[test]
fn shift_drag_tilts_instead_of_rotating() {
    let mut controller = InteractionController::new();
    let mut camera = CameraState::new();

    controller.on_pointer_down(0.0, 0.0);
    controller.on_pointer_move(0.0, 50.0, true, &mut camera);

    assert_eq!(controller.drag_action(), DragAction::Tilt);
    assert_eq!(camera.model_rotation(), (0.0, 0.0, 0.0));
    assert_relative_eq!(camera.view_angle(), 50.0 * ROTATION_SCALE, epsilon = 1e-6);
}

#[test]
fn wheel_zoom_stays_within_limits() {
    let mut controller = InteractionController::new();
    let mut camera = CameraState::new();

    for _ in 0..50 {
        controller.on_wheel(500.0, &mut camera);
    }
    assert_eq!(camera.distance(), WHEEL_MAX_DISTANCE);

    for _ in 0..50 {
        controller.on_wheel(-500.0, &mut camera);
    }
    assert_eq!(camera.distance(), WHEEL_MIN_DISTANCE);
}

#[test]
fn zoom_presets_and_auto_rotation() {
    let mut controller = InteractionController::new();
    let mut camera = CameraState::new();

    controller.set_zoom_level(ZoomLevel::Far, &mut camera);
    assert_eq!(camera.distance(), ZoomLevel::Far.distance());

    controller.set_auto_rotation(true, Some(1.0), &mut camera);
    controller.advance(0.05, &mut camera);
    assert_relative_eq!(camera.model_rotation().1, 0.05, epsilon = 1e-6);
    // Stalled frames are capped at a tenth of a second.
    controller.advance(5.0, &mut camera);
    assert_relative_eq!(camera.model_rotation().1, 0.15, epsilon = 1e-6);

    controller.reset_rotation(&mut camera);
    assert_eq!(camera.model_rotation(), (0.0, 0.0, 0.0));
}
