use crate::GrowthError;
use crate::points::AttractionPointManager;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use treecrown_common::{CrownConfig, PointDistribution};

/// Spherical crown volume that attraction points are sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrownSphere {
    center: Vec3,
    radius: f32,
}

impl CrownSphere {
    pub fn new(center: Vec3, radius: f32) -> Result<Self, GrowthError> {
        if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return Err(GrowthError::InvalidArgument(format!(
                "crown needs a finite center and positive radius, got {center} / {radius}"
            )));
        }
        Ok(Self { center, radius })
    }

    pub fn from_config(config: &CrownConfig) -> Result<Self, GrowthError> {
        Self::new(config.center, config.radius)
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Lowest point of the sphere, where the trunk enters the crown.
    pub fn bottom(&self) -> Vec3 {
        self.center - Vec3::Y * self.radius
    }

    /// `count` points spread evenly over the surface along a golden-angle
    /// spiral, from top to bottom.
    pub fn surface_points(&self, count: usize) -> Vec<Vec3> {
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        (0..count)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
                let ring = (1.0 - y * y).max(0.0).sqrt();
                let theta = golden_angle * i as f32;
                self.center + Vec3::new(theta.cos() * ring, y, theta.sin() * ring) * self.radius
            })
            .collect()
    }

    /// `count` points uniformly distributed inside the sphere. Same seed,
    /// same points.
    pub fn volume_points(&self, count: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut points = Vec::with_capacity(count);
        while points.len() < count {
            let candidate = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if candidate.length_squared() <= 1.0 {
                points.push(self.center + candidate * self.radius);
            }
        }
        points
    }

    pub fn sample(&self, distribution: PointDistribution, count: usize, seed: u64) -> Vec<Vec3> {
        match distribution {
            PointDistribution::Surface => self.surface_points(count),
            PointDistribution::Volume => self.volume_points(count, seed),
        }
    }

    /// Replace the manager's points with a fresh sample.
    pub fn populate(
        &self,
        manager: &mut AttractionPointManager,
        distribution: PointDistribution,
        count: usize,
        seed: u64,
    ) {
        manager.clear();
        manager.extend_positions(self.sample(distribution, count, seed));
        tracing::info!(
            count,
            ?distribution,
            radius = self.radius,
            "sampled attraction points"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_points_lie_on_sphere() {
        let crown = CrownSphere::new(Vec3::new(1.0, 2.0, 3.0), 2.5).unwrap();
        let points = crown.surface_points(28);
        assert_eq!(points.len(), 28);
        for p in &points {
            assert!((p.distance(crown.center()) - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn surface_points_cover_both_hemispheres() {
        let crown = CrownSphere::new(Vec3::ZERO, 1.0).unwrap();
        let points = crown.surface_points(28);
        let above = points.iter().filter(|p| p.y > 0.0).count();
        assert_eq!(above, 14);
    }

    #[test]
    fn surface_points_are_distinct() {
        let crown = CrownSphere::new(Vec3::ZERO, 1.0).unwrap();
        let points = crown.surface_points(50);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance(*b) > 0.1);
            }
        }
    }

    #[test]
    fn volume_points_lie_inside_and_are_reproducible() {
        let crown = CrownSphere::new(Vec3::new(0.0, 5.0, 0.0), 7.5).unwrap();
        let a = crown.volume_points(600, 9);
        let b = crown.volume_points(600, 9);
        assert_eq!(a, b);
        assert_eq!(a.len(), 600);
        for p in &a {
            assert!(p.distance(crown.center()) <= 7.5 + 1e-4);
        }
        assert_ne!(a, crown.volume_points(600, 10));
    }

    #[test]
    fn zero_count_yields_nothing() {
        let crown = CrownSphere::new(Vec3::ZERO, 1.0).unwrap();
        assert!(crown.surface_points(0).is_empty());
        assert!(crown.volume_points(0, 1).is_empty());
    }

    #[test]
    fn rejects_degenerate_sphere() {
        assert!(CrownSphere::new(Vec3::ZERO, 0.0).is_err());
        assert!(CrownSphere::new(Vec3::ZERO, -1.0).is_err());
        assert!(CrownSphere::new(Vec3::splat(f32::NAN), 1.0).is_err());
    }

    #[test]
    fn populate_replaces_points() {
        let crown = CrownSphere::new(Vec3::ZERO, 1.0).unwrap();
        let mut manager = AttractionPointManager::new(0.6, 0.15).unwrap();
        crown.populate(&mut manager, PointDistribution::Surface, 28, 0);
        assert_eq!(manager.len(), 28);
        crown.populate(&mut manager, PointDistribution::Volume, 10, 3);
        assert_eq!(manager.len(), 10);
    }

    #[test]
    fn bottom_is_below_center() {
        let crown = CrownSphere::new(Vec3::new(0.0, 4.0, 0.0), 1.5).unwrap();
        assert_eq!(crown.bottom(), Vec3::new(0.0, 2.5, 0.0));
    }
}
