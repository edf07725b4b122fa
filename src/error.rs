use thiserror::Error;

/// Reasons a model geometry is rejected before it replaces the active one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model has no LEDs")]
    Empty,

    #[error("model declares {declared} LEDs but provides {actual} positions")]
    LedCountMismatch { declared: usize, actual: usize },

    #[error("face {face} has {arity} vertices, at least 3 are required")]
    DegenerateFace { face: usize, arity: usize },

    #[error("face {face} references vertex {index} but only {available} vertices exist")]
    VertexOutOfRange {
        face: usize,
        index: u32,
        available: usize,
    },

    #[error("{what} {index} has a non-finite coordinate")]
    NonFinite { what: &'static str, index: usize },

    #[error("{what} coordinate array has {len} values, not a multiple of 3")]
    RaggedCoordinates { what: &'static str, len: usize },

    #[error("face sizes add up to {expected} indices but {actual} were given")]
    FaceIndexCount { expected: usize, actual: usize },
}

/// GPU resource allocation failures. Never fatal: the dependent pass is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("shader program '{0}' failed to build: {1}")]
    Program(&'static str, String),

    #[error("buffer '{0}' could not be allocated: {1}")]
    Buffer(&'static str, String),

    #[error("render target {width}x{height} could not be allocated: {reason}")]
    Target {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("surface unavailable: {0}")]
    Surface(String),
}

/// Failures acquiring the wgpu device and surface.
#[derive(Debug, Error)]
pub enum GpuInitError {
    #[error("surface error: {0}")]
    Surface(String),

    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("device error: {0}")]
    Device(String),
}

impl From<wgpu::CreateSurfaceError> for GpuInitError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuInitError::Surface(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for GpuInitError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuInitError::Device(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_count_mismatch_display() {
        let err = ModelError::LedCountMismatch {
            declared: 10,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "model declares 10 LEDs but provides 9 positions"
        );
    }

    #[test]
    fn program_error_display() {
        let err = ResourceError::Program("glow", "link failed".to_string());
        assert_eq!(err.to_string(), "shader program 'glow' failed to build: link failed");
    }

    #[test]
    fn adapter_not_found_display() {
        assert_eq!(
            GpuInitError::AdapterNotFound.to_string(),
            "no suitable GPU adapter found"
        );
    }
}
