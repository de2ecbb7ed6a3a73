use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh in model space. Every triangle is wound
/// counter-clockwise when seen from outside.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Unit UV sphere centered on the origin, built from latitude stacks and
    /// longitude slices. `slices` is clamped to at least 3 and `stacks` to
    /// at least 2.
    pub fn uv_sphere(slices: u32, stacks: u32) -> Self {
        let slices = slices.max(3);
        let stacks = stacks.max(2);

        let mut mesh = Self::default();
        for stack in 0..=stacks {
            let phi = PI * stack as f32 / stacks as f32;
            let (ring, y) = (phi.sin(), phi.cos());
            for slice in 0..=slices {
                let theta = TAU * slice as f32 / slices as f32;
                let p = Vec3::new(ring * theta.cos(), y, ring * theta.sin());
                mesh.push_vertex(p, p.normalize_or(Vec3::Y));
            }
        }

        let row = slices + 1;
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = stack * row + slice;
                let b = a + row;
                // The quads touching the poles collapse to one triangle.
                if stack != 0 {
                    mesh.push_outward([a, a + 1, b], |centroid| centroid);
                }
                if stack != stacks - 1 {
                    mesh.push_outward([a + 1, b + 1, b], |centroid| centroid);
                }
            }
        }
        mesh
    }

    /// Closed tube of radius 1 running from the origin to `+Y`, with
    /// `slices` sides (at least 3) and flat end caps.
    pub fn tube(slices: u32) -> Self {
        let slices = slices.max(3);
        let rim = |slice: u32| {
            let theta = TAU * slice as f32 / slices as f32;
            Vec3::new(theta.cos(), 0.0, theta.sin())
        };

        let mut mesh = Self::default();
        for y in [0.0, 1.0] {
            for slice in 0..=slices {
                let p = rim(slice);
                mesh.push_vertex(p + Vec3::Y * y, p);
            }
        }
        let row = slices + 1;
        for slice in 0..slices {
            let (a, b) = (slice, slice + row);
            let side = |centroid: Vec3| centroid.with_y(0.0);
            mesh.push_outward([a, a + 1, b], side);
            mesh.push_outward([a + 1, b + 1, b], side);
        }

        for (y, normal) in [(0.0, Vec3::NEG_Y), (1.0, Vec3::Y)] {
            let center = mesh.vertices.len() as u32;
            mesh.push_vertex(Vec3::Y * y, normal);
            for slice in 0..=slices {
                mesh.push_vertex(rim(slice) + Vec3::Y * y, normal);
            }
            for slice in 0..slices {
                let a = center + 1 + slice;
                mesh.push_outward([center, a, a + 1], |_| normal);
            }
        }
        mesh
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
        });
    }

    /// Push a triangle, flipping it if needed so its geometric normal agrees
    /// with `outward(centroid)`.
    fn push_outward(&mut self, [a, b, c]: [u32; 3], outward: impl Fn(Vec3) -> Vec3) {
        let p = |i: u32| Vec3::from_array(self.vertices[i as usize].position);
        let (pa, pb, pc) = (p(a), p(b), p(c));
        let normal = (pb - pa).cross(pc - pa);
        if normal.dot(outward((pa + pb + pc) / 3.0)) >= 0.0 {
            self.indices.extend_from_slice(&[a, b, c]);
        } else {
            self.indices.extend_from_slice(&[a, c, b]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles(mesh: &Mesh) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        mesh.indices
            .chunks_exact(3)
            .map(|t| [0, 1, 2].map(|k| Vec3::from_array(mesh.vertices[t[k] as usize].position)))
    }

    #[test]
    fn vertices_lie_on_unit_sphere() {
        let mesh = Mesh::uv_sphere(20, 20);
        assert_eq!(mesh.vertices.len(), 21 * 21);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert!(p.distance(Vec3::from_array(v.normal)) < 1e-5);
        }
    }

    #[test]
    fn triangle_count_skips_pole_duplicates() {
        let mesh = Mesh::uv_sphere(20, 20);
        // Two triangles per quad, minus one per quad in each pole row.
        assert_eq!(mesh.indices.len(), (20 * 20 * 2 - 2 * 20) * 3);
        assert_eq!(mesh.index_count() as usize, mesh.indices.len());
    }

    #[test]
    fn every_sphere_triangle_faces_outward() {
        let mesh = Mesh::uv_sphere(12, 8);
        for [a, b, c] in triangles(&mesh) {
            let normal = (b - a).cross(c - a);
            assert!(normal.length() > 0.0, "degenerate triangle {a} {b} {c}");
            assert!(normal.dot(a + b + c) > 0.0, "inward triangle {a} {b} {c}");
        }
    }

    #[test]
    fn indices_in_bounds() {
        for mesh in [Mesh::uv_sphere(5, 3), Mesh::tube(5)] {
            let n = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn clamps_tiny_tessellation() {
        let mesh = Mesh::uv_sphere(0, 0);
        assert_eq!(mesh.vertices.len(), 4 * 3);
        assert!(!mesh.indices.is_empty());
        assert_eq!(Mesh::tube(1).index_count(), Mesh::tube(3).index_count());
    }

    #[test]
    fn tube_spans_unit_height_and_radius() {
        let mesh = Mesh::tube(8);
        // Two side rings plus two caps, each ring closing on a seam vertex.
        assert_eq!(mesh.vertices.len(), 2 * 9 + 2 * 10);
        // Two triangles per side quad and one per cap wedge.
        assert_eq!(mesh.indices.len(), (8 * 2 + 8 * 2) * 3);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!(p.y == 0.0 || p.y == 1.0);
            assert!(p.with_y(0.0).length() <= 1.0 + 1e-6);
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn every_tube_triangle_faces_outward() {
        let mesh = Mesh::tube(8);
        for [a, b, c] in triangles(&mesh) {
            let normal = (b - a).cross(c - a);
            assert!(normal.length() > 0.0, "degenerate triangle {a} {b} {c}");
            let centroid = (a + b + c) / 3.0;
            let outward = if a.y == b.y && b.y == c.y {
                Vec3::Y * (centroid.y - 0.5)
            } else {
                centroid.with_y(0.0)
            };
            assert!(normal.dot(outward) > 0.0, "inward triangle {a} {b} {c}");
        }
    }
}
