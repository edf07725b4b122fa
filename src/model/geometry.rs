use crate::error::ModelError;
use glam::Vec3;

/// A runtime model description: LED positions plus the polygonal shell they sit on.
///
/// Faces index into `vertices`. Nothing here is trusted until [`ModelGeometry::validate`]
/// has passed; the pipeline validates once when a model is loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelGeometry {
    pub name: String,
    /// Number of LEDs the model declares.
    pub led_count: usize,
    pub led_positions: Vec<Vec3>,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<u32>>,
}

impl ModelGeometry {
    pub fn builder() -> ModelGeometryBuilder {
        ModelGeometryBuilder::new()
    }

    /// Builds a model from the flat arrays a JS host passes across the boundary:
    /// xyz triples for LEDs and vertices, then each face's arity followed by the
    /// concatenated face indices. The result still has to be validated.
    pub fn from_flat(
        name: impl Into<String>,
        led_coords: &[f32],
        vertex_coords: &[f32],
        face_sizes: &[u32],
        face_indices: &[u32],
    ) -> Result<Self, ModelError> {
        let leds = triples("LED", led_coords)?;
        let vertices = triples("vertex", vertex_coords)?;

        let expected: usize = face_sizes.iter().map(|&n| n as usize).sum();
        if expected != face_indices.len() {
            return Err(ModelError::FaceIndexCount {
                expected,
                actual: face_indices.len(),
            });
        }

        let mut builder = Self::builder().name(name).leds(leds).vertices(vertices);
        let mut rest = face_indices;
        for &size in face_sizes {
            let (face, tail) = rest.split_at(size as usize);
            builder = builder.face(face);
            rest = tail;
        }
        Ok(builder.build())
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.led_count == 0 {
            return Err(ModelError::Empty);
        }
        if self.led_positions.len() != self.led_count {
            return Err(ModelError::LedCountMismatch {
                declared: self.led_count,
                actual: self.led_positions.len(),
            });
        }
        if let Some(index) = self.led_positions.iter().position(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite { what: "LED", index });
        }
        if let Some(index) = self.vertices.iter().position(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite {
                what: "vertex",
                index,
            });
        }

        for (face, indices) in self.faces.iter().enumerate() {
            if indices.len() < 3 {
                return Err(ModelError::DegenerateFace {
                    face,
                    arity: indices.len(),
                });
            }
            if let Some(&index) = indices
                .iter()
                .find(|&&i| i as usize >= self.vertices.len())
            {
                return Err(ModelError::VertexOutOfRange {
                    face,
                    index,
                    available: self.vertices.len(),
                });
            }
        }

        Ok(())
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Mean length of all face edges, `None` when the model has no faces.
    ///
    /// Expects validated geometry.
    pub fn mean_edge_length(&self) -> Option<f32> {
        let mut total = 0.0;
        let mut count = 0usize;

        for face in &self.faces {
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                let (Some(pa), Some(pb)) = (
                    self.vertices.get(a as usize),
                    self.vertices.get(b as usize),
                ) else {
                    continue;
                };
                total += pa.distance(*pb);
                count += 1;
            }
        }

        (count > 0).then(|| total / count as f32)
    }
}

fn triples(what: &'static str, coords: &[f32]) -> Result<Vec<Vec3>, ModelError> {
    if coords.len() % 3 != 0 {
        return Err(ModelError::RaggedCoordinates {
            what,
            len: coords.len(),
        });
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}

pub struct ModelGeometryBuilder {
    name: String,
    declared_leds: Option<usize>,
    led_positions: Vec<Vec3>,
    vertices: Vec<Vec3>,
    faces: Vec<Vec<u32>>,
}

impl ModelGeometryBuilder {
    pub fn new() -> Self {
        Self {
            name: String::from("unnamed"),
            declared_leds: None,
            led_positions: Vec::new(),
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the LED count, which otherwise follows the number of positions added.
    pub fn declared_led_count(mut self, count: usize) -> Self {
        self.declared_leds = Some(count);
        self
    }

    pub fn led(mut self, position: Vec3) -> Self {
        self.led_positions.push(position);
        self
    }

    pub fn leds(mut self, positions: impl IntoIterator<Item = Vec3>) -> Self {
        self.led_positions.extend(positions);
        self
    }

    pub fn vertex(mut self, position: Vec3) -> Self {
        self.vertices.push(position);
        self
    }

    pub fn vertices(mut self, positions: impl IntoIterator<Item = Vec3>) -> Self {
        self.vertices.extend(positions);
        self
    }

    pub fn face(mut self, indices: impl Into<Vec<u32>>) -> Self {
        self.faces.push(indices.into());
        self
    }

    pub fn build(self) -> ModelGeometry {
        ModelGeometry {
            name: self.name,
            led_count: self.declared_leds.unwrap_or(self.led_positions.len()),
            led_positions: self.led_positions,
            vertices: self.vertices,
            faces: self.faces,
        }
    }
}

impl Default for ModelGeometryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ModelGeometryBuilder {
        ModelGeometry::builder()
            .name("square")
            .led(Vec3::ZERO)
            .led(Vec3::X)
            .vertices([
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ])
            .face([0, 1, 2, 3])
    }

    #[test]
    fn valid_model_passes() {
        let model = square().build();
        assert_eq!(model.led_count, 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn declared_count_mismatch_is_rejected() {
        let model = square().declared_led_count(3).build();
        assert_eq!(
            model.validate(),
            Err(ModelError::LedCountMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn face_index_out_of_range_is_rejected() {
        let model = square().face([0, 1, 7]).build();
        assert_eq!(
            model.validate(),
            Err(ModelError::VertexOutOfRange {
                face: 1,
                index: 7,
                available: 4
            })
        );
    }

    #[test]
    fn degenerate_face_is_rejected() {
        let model = square().face([0, 1]).build();
        assert!(matches!(
            model.validate(),
            Err(ModelError::DegenerateFace { face: 1, arity: 2 })
        ));
    }

    #[test]
    fn nan_led_is_rejected() {
        let model = square().led(Vec3::new(f32::NAN, 0.0, 0.0)).build();
        assert!(matches!(
            model.validate(),
            Err(ModelError::NonFinite { what: "LED", index: 2 })
        ));
    }

    #[test]
    fn empty_model_is_rejected() {
        let model = ModelGeometry::builder().build();
        assert_eq!(model.validate(), Err(ModelError::Empty));
    }

    #[test]
    fn from_flat_splits_faces() {
        let model = ModelGeometry::from_flat(
            "flat",
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            &[3, 3],
            &[0, 1, 2, 0, 2, 3],
        )
        .unwrap();
        assert_eq!(model.led_count, 2);
        assert_eq!(model.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn from_flat_rejects_bad_lengths() {
        assert_eq!(
            ModelGeometry::from_flat("bad", &[0.0, 1.0], &[], &[], &[]),
            Err(ModelError::RaggedCoordinates { what: "LED", len: 2 })
        );
        assert_eq!(
            ModelGeometry::from_flat("bad", &[0.0; 3], &[0.0; 9], &[3, 3], &[0, 1, 2]),
            Err(ModelError::FaceIndexCount {
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn mean_edge_of_square() {
        let model = square().build();
        let edge = model.mean_edge_length().unwrap();
        assert!((edge - 2.0).abs() < 1e-6);
    }

    #[test]
    fn no_faces_no_edge_length() {
        let model = ModelGeometry::builder().led(Vec3::ONE).build();
        assert_eq!(model.mean_edge_length(), None);
    }
}
