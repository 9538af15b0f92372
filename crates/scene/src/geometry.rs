use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point. `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the min-to-max diagonal.
    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }

    /// Largest of the three extents.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    /// Zero extent on every axis, or non-finite corners.
    pub fn is_degenerate(&self) -> bool {
        !self.min.is_finite() || !self.max.is_finite() || self.max_extent() <= f32::EPSILON
    }

    /// The box after a uniform scale about the origin.
    pub fn scaled(&self, factor: f32) -> Self {
        Self::from_points([self.min * factor, self.max * factor]).unwrap_or(*self)
    }
}

/// Triangle mesh in model-local space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            positions,
            normals: Vec::new(),
            indices,
        };
        mesh.compute_normals();
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Area-weighted vertex normals from the index list. Vertices not
    /// referenced by any triangle get +Y.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let face = (*pb - *pa).cross(*pc - *pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect();
    }

    /// Axis-aligned box mesh with the given size, centered on the origin.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            4,5,6, 6,7,4, // +Z
            1,0,3, 3,2,1, // -Z
            5,1,2, 2,6,5, // +X
            0,4,7, 7,3,0, // -X
            7,6,2, 2,3,7, // +Y
            0,1,5, 5,4,0, // -Y
        ];
        Self::new(positions, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_from_points() {
        let b = Aabb::from_points([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, -2.0, 0.0),
            Vec3::new(0.0, 4.0, 1.0),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(b.max_extent(), 6.0);
        assert_eq!(b.center(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn aabb_empty_is_none() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn single_point_is_degenerate() {
        let b = Aabb::from_points([Vec3::splat(2.0), Vec3::splat(2.0)]).unwrap();
        assert!(b.is_degenerate());
    }

    #[test]
    fn flat_box_is_not_degenerate() {
        // A plane has zero depth but still a usable largest extent.
        let b = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 1.0));
        assert!(!b.is_degenerate());
    }

    #[test]
    fn scaled_box() {
        let b = Aabb::new(Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 2.0, 4.0)).scaled(0.25);
        assert_eq!(b.size(), Vec3::new(0.5, 1.0, 1.0));
    }

    #[test]
    fn cuboid_bounds_and_normals() {
        let mesh = Mesh::cuboid(Vec3::new(2.0, 4.0, 6.0));
        let b = mesh.bounds().unwrap();
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        // Corner normals point away from the center.
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(p.dot(*n) > 0.0);
        }
    }
}
