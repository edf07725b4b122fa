//! Procedural shells for demos and tests.

use super::ModelGeometry;
use glam::Vec3;
use std::f32::consts::PI;

const GOLDEN_RATIO: f32 = 1.618_034;

/// A regular dodecahedron of circumradius `radius` with `leds_per_face` LEDs
/// laid out on each pentagon in a sunflower pattern.
pub fn dodecahedron(radius: f32, leds_per_face: u32) -> ModelGeometry {
    let phi = GOLDEN_RATIO;
    let inv = 1.0 / phi;

    let mut corners = Vec::with_capacity(20);
    for &x in &[-1.0, 1.0] {
        for &y in &[-1.0, 1.0] {
            for &z in &[-1.0, 1.0] {
                corners.push(Vec3::new(x, y, z));
            }
        }
    }
    for &a in &[-1.0, 1.0] {
        for &b in &[-1.0, 1.0] {
            corners.push(Vec3::new(0.0, a * inv, b * phi));
            corners.push(Vec3::new(a * inv, b * phi, 0.0));
            corners.push(Vec3::new(a * phi, 0.0, b * inv));
        }
    }

    let scale = radius / 3.0_f32.sqrt();
    let vertices: Vec<Vec3> = corners.iter().map(|c| *c * scale).collect();

    // Face normals of a dodecahedron point at the vertices of the dual icosahedron.
    let mut normals = Vec::with_capacity(12);
    for &a in &[-1.0, 1.0] {
        for &b in &[-1.0, 1.0] {
            normals.push(Vec3::new(0.0, a * phi, b).normalize());
            normals.push(Vec3::new(a * phi, b, 0.0).normalize());
            normals.push(Vec3::new(b, 0.0, a * phi).normalize());
        }
    }

    let mut builder = ModelGeometry::builder()
        .name("dodecahedron")
        .vertices(vertices.iter().copied());
    let mut led_positions = Vec::with_capacity(12 * leds_per_face as usize);

    for normal in normals {
        let best = vertices
            .iter()
            .map(|v| v.dot(normal))
            .fold(f32::MIN, f32::max);
        let mut face: Vec<u32> = (0..vertices.len() as u32)
            .filter(|&i| vertices[i as usize].dot(normal) > best - 1e-3 * radius.max(1.0))
            .collect();

        let center = face.iter().map(|&i| vertices[i as usize]).sum::<Vec3>() / face.len() as f32;
        let u = (vertices[face[0] as usize] - center).normalize();
        let w = normal.cross(u);
        let angle = |i: u32| {
            let d = vertices[i as usize] - center;
            d.dot(w).atan2(d.dot(u))
        };
        face.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));

        // Inscribed radius of a regular pentagon, pulled in so LEDs stay off the edges.
        let circumradius = (vertices[face[0] as usize] - center).length();
        let spread = circumradius * (PI / 5.0).cos() * 0.85;
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        for k in 0..leds_per_face {
            let r = spread * ((k as f32 + 0.5) / leds_per_face as f32).sqrt();
            let theta = k as f32 * golden_angle;
            led_positions.push(center + u * (r * theta.cos()) + w * (r * theta.sin()));
        }

        builder = builder.face(face);
    }

    builder.leds(led_positions).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dodecahedron_is_valid() {
        let model = dodecahedron(10.0, 20);
        assert!(model.validate().is_ok());
        assert_eq!(model.vertices.len(), 20);
        assert_eq!(model.face_count(), 12);
        assert_eq!(model.led_count, 240);
        assert!(model.faces.iter().all(|f| f.len() == 5));
    }

    #[test]
    fn vertices_lie_on_circumsphere() {
        let model = dodecahedron(10.0, 1);
        for v in &model.vertices {
            assert!((v.length() - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn edges_are_uniform() {
        let model = dodecahedron(10.0, 1);
        let mean = model.mean_edge_length().unwrap();
        for face in &model.faces {
            for i in 0..5 {
                let a = model.vertices[face[i] as usize];
                let b = model.vertices[face[(i + 1) % 5] as usize];
                assert!((a.distance(b) - mean).abs() < 1e-3);
            }
        }
    }
}
