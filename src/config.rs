//! View configuration: the numeric defaults table and the runtime view controls.

// LED appearance
pub const DEFAULT_LED_SIZE: f32 = 0.7;
pub const MIN_LED_SIZE_RATIO: f32 = 0.3;
pub const MAX_LED_SIZE_RATIO: f32 = 1.5;
/// Physical diameter of one LED in mm.
pub const PHYSICAL_LED_DIAMETER: f32 = 3.8;
/// Physical edge length of one shell face in mm.
pub const PHYSICAL_FACE_EDGE: f32 = 107.3;
pub const DEFAULT_ATMOSPHERE_INTENSITY: f32 = 1.6;
pub const MIN_ATMOSPHERE_INTENSITY: f32 = 0.0;
pub const MAX_ATMOSPHERE_INTENSITY: f32 = 2.5;
pub const DEFAULT_LED_SPACING: f32 = 5.0;
pub const DEFAULT_BRIGHTNESS: u8 = 240;
pub const DEFAULT_MESH_OPACITY: f32 = 0.3;

// Camera
pub const CAMERA_CLOSE_DISTANCE: f32 = 22.0;
pub const CAMERA_NORMAL_DISTANCE: f32 = 28.0;
pub const CAMERA_FAR_DISTANCE: f32 = 55.0;
pub const CAMERA_FOV_DEGREES: f32 = 50.0;
pub const CAMERA_NEAR_PLANE: f32 = 0.1;
pub const CAMERA_FAR_PLANE: f32 = 100.0;
pub const MIN_CAMERA_DISTANCE: f32 = 1.0;
/// Continuous wheel zoom stays inside this range.
pub const WHEEL_MIN_DISTANCE: f32 = 10.0;
pub const WHEEL_MAX_DISTANCE: f32 = 90.0;
pub const WHEEL_ZOOM_SENSITIVITY: f32 = 0.001;

// Rotation
pub const ROTATION_SCALE: f32 = 0.004;
pub const MAX_VERTICAL_ROTATION: f32 = 1.5;
pub const DEFAULT_AUTO_ROTATION_SPEED: f32 = 0.4;
/// Largest step auto-rotation will take in one frame, in seconds.
pub const MAX_AUTO_ROTATION_STEP: f32 = 0.1;

// Shader effects
pub const COLOR_BRIGHTNESS_BOOST: f32 = 1.0;
pub const MIN_LED_BRIGHTNESS: f32 = 0.05;
pub const MAX_DEPTH_FADE: f32 = 6.0;
pub const MIN_DEPTH_FADE: f32 = 0.4;

// Frame pacing
pub const DEFAULT_MAX_REFRESH_RATE: u8 = 60;
pub const DEFAULT_DITHER: u8 = 1;

/// Runtime view controls. Every setter clamps or ignores bad input instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    led_size: f32,
    atmosphere_intensity: f32,
    led_spacing: f32,
    show_mesh: bool,
    mesh_opacity: f32,
    show_wireframe: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            led_size: DEFAULT_LED_SIZE,
            atmosphere_intensity: DEFAULT_ATMOSPHERE_INTENSITY,
            led_spacing: DEFAULT_LED_SPACING,
            show_mesh: true,
            mesh_opacity: DEFAULT_MESH_OPACITY,
            show_wireframe: false,
        }
    }
}

impl ViewSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn led_size(&self) -> f32 {
        self.led_size
    }

    pub fn set_led_size(&mut self, ratio: f32) {
        if let Some(v) = finite("led size", ratio) {
            self.led_size = v.clamp(MIN_LED_SIZE_RATIO, MAX_LED_SIZE_RATIO);
        }
    }

    pub fn atmosphere_intensity(&self) -> f32 {
        self.atmosphere_intensity
    }

    pub fn set_atmosphere_intensity(&mut self, intensity: f32) {
        if let Some(v) = finite("atmosphere intensity", intensity) {
            self.atmosphere_intensity = v.clamp(MIN_ATMOSPHERE_INTENSITY, MAX_ATMOSPHERE_INTENSITY);
        }
    }

    pub fn led_spacing(&self) -> f32 {
        self.led_spacing
    }

    /// Non-positive spacing is ignored.
    pub fn set_led_spacing(&mut self, spacing: f32) {
        match finite("led spacing", spacing) {
            Some(v) if v > 0.0 => self.led_spacing = v,
            Some(v) => log::warn!("Ignoring non-positive led spacing {v}"),
            None => {}
        }
    }

    pub fn show_mesh(&self) -> bool {
        self.show_mesh
    }

    pub fn set_show_mesh(&mut self, show: bool) {
        self.show_mesh = show;
    }

    pub fn mesh_opacity(&self) -> f32 {
        self.mesh_opacity
    }

    pub fn set_mesh_opacity(&mut self, opacity: f32) {
        if let Some(v) = finite("mesh opacity", opacity) {
            self.mesh_opacity = v.clamp(0.0, 1.0);
        }
    }

    pub fn show_wireframe(&self) -> bool {
        self.show_wireframe
    }

    pub fn set_show_wireframe(&mut self, show: bool) {
        self.show_wireframe = show;
    }

    /// World-space LED sprite diameter for a shell whose faces have the given edge length.
    ///
    /// The physical LED-to-face ratio is preserved, then scaled by the size ratio.
    /// Without a face edge the configured spacing stands in for it.
    pub fn led_world_size(&self, face_edge: Option<f32>) -> f32 {
        let edge = face_edge.filter(|e| *e > 0.0).unwrap_or(self.led_spacing);
        edge * (PHYSICAL_LED_DIAMETER / PHYSICAL_FACE_EDGE) * self.led_size
    }
}

fn finite(name: &str, value: f32) -> Option<f32> {
    if value.is_finite() {
        Some(value)
    } else {
        log::warn!("Ignoring non-finite {name}: {value}");
        None
    }
}
