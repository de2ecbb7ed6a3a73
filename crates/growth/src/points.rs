use crate::GrowthError;
use glam::{Mat4, Vec3};
use treecrown_common::GrowthSettings;

/// A growth target: a position plus the transform that places its marker mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractionPoint {
    position: Vec3,
    transform: Mat4,
}

impl AttractionPoint {
    /// Point whose marker transform is a plain translation to `position`.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            transform: Mat4::from_translation(position),
        }
    }

    pub fn with_transform(transform: Mat4, position: Vec3) -> Self {
        Self {
            position,
            transform,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }
}

/// Translation column of an affine transform.
fn translation(transform: &Mat4) -> Vec3 {
    transform.w_axis.truncate()
}

/// Ordered set of attraction points with kill and influence thresholds.
///
/// Linear storage: the demo works with tens to hundreds of points and every
/// query is a scan.
#[derive(Debug, Clone)]
pub struct AttractionPointManager {
    points: Vec<AttractionPoint>,
    influence_distance: f32,
    kill_distance: f32,
}

impl AttractionPointManager {
    /// Empty manager. Requires finite `influence_distance > kill_distance >= 0`.
    pub fn new(influence_distance: f32, kill_distance: f32) -> Result<Self, GrowthError> {
        if !influence_distance.is_finite() || !kill_distance.is_finite() {
            return Err(GrowthError::InvalidArgument(
                "influence and kill distances must be finite".into(),
            ));
        }
        if kill_distance < 0.0 {
            return Err(GrowthError::InvalidArgument(format!(
                "kill distance must be >= 0, got {kill_distance}"
            )));
        }
        if influence_distance <= kill_distance {
            return Err(GrowthError::InvalidArgument(format!(
                "influence distance {influence_distance} must exceed kill distance {kill_distance}"
            )));
        }
        Ok(Self {
            points: Vec::new(),
            influence_distance,
            kill_distance,
        })
    }

    pub fn from_settings(settings: &GrowthSettings) -> Result<Self, GrowthError> {
        Self::new(settings.influence_distance, settings.kill_distance)
    }

    pub fn influence_distance(&self) -> f32 {
        self.influence_distance
    }

    pub fn kill_distance(&self) -> f32 {
        self.kill_distance
    }

    /// Append a point. No deduplication.
    pub fn add_point(&mut self, transform: Mat4, position: Vec3) {
        self.points
            .push(AttractionPoint::with_transform(transform, position));
    }

    /// Append points whose transforms translate to their positions.
    pub fn extend_positions(&mut self, positions: impl IntoIterator<Item = Vec3>) {
        self.points
            .extend(positions.into_iter().map(AttractionPoint::new));
    }

    /// Point at `index` in insertion order.
    pub fn point(&self, index: usize) -> Result<&AttractionPoint, GrowthError> {
        self.points.get(index).ok_or(GrowthError::OutOfRange {
            index,
            len: self.points.len(),
        })
    }

    /// Remove and return the point at `index`, keeping the order of the rest.
    pub fn remove_point(&mut self, index: usize) -> Result<AttractionPoint, GrowthError> {
        if index >= self.points.len() {
            return Err(GrowthError::OutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points.remove(index))
    }

    /// Remove every point that any of `tips` has come within kill distance
    /// of. Returns how many were removed.
    pub fn remove_killed(&mut self, tips: &[Vec3]) -> usize {
        let before = self.points.len();
        let kill = self.kill_distance;
        self.points.retain(|p| {
            let target = translation(&p.transform);
            !tips.iter().any(|tip| target.distance(*tip) < kill)
        });
        let removed = before - self.points.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.points.len(), "attraction points consumed");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[AttractionPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttractionPoint> {
        self.points.iter()
    }

    /// Marker transforms in insertion order, for the renderer.
    pub fn transforms(&self) -> impl Iterator<Item = Mat4> + '_ {
        self.points.iter().map(|p| p.transform)
    }

    /// Whether a branch at `branch_position` is strictly closer than the kill
    /// distance to the point placed by `point_transform`.
    pub fn entered_kill_distance(&self, point_transform: &Mat4, branch_position: Vec3) -> bool {
        translation(point_transform).distance(branch_position) < self.kill_distance
    }

    /// Whether a branch at `branch_position` is strictly closer than the
    /// influence distance to the point placed by `point_transform`.
    pub fn entered_influence_distance(
        &self,
        point_transform: &Mat4,
        branch_position: Vec3,
    ) -> bool {
        translation(point_transform).distance(branch_position) < self.influence_distance
    }
}

impl<'a> IntoIterator for &'a AttractionPointManager {
    type Item = &'a AttractionPoint;
    type IntoIter = std::slice::Iter<'a, AttractionPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AttractionPointManager {
        AttractionPointManager::new(2.0, 1.0).unwrap()
    }

    #[test]
    fn points_come_back_in_insertion_order() {
        let mut m = manager();
        let inputs: Vec<(Mat4, Vec3)> = (0..5)
            .map(|i| {
                let p = Vec3::new(i as f32, 2.0 * i as f32, -1.0);
                (Mat4::from_scale_rotation_translation(Vec3::splat(0.1), glam::Quat::IDENTITY, p), p)
            })
            .collect();
        for (t, p) in &inputs {
            m.add_point(*t, *p);
        }
        assert_eq!(m.len(), 5);
        for (i, (t, p)) in inputs.iter().enumerate() {
            let point = m.point(i).unwrap();
            assert_eq!(point.transform(), t);
            assert_eq!(point.position(), *p);
        }
        assert_eq!(
            m.point(5).unwrap_err(),
            GrowthError::OutOfRange { index: 5, len: 5 }
        );
    }

    #[test]
    fn empty_manager_has_no_points() {
        let m = manager();
        assert!(m.is_empty());
        assert!(matches!(m.point(0), Err(GrowthError::OutOfRange { .. })));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut m = manager();
        m.extend_positions([Vec3::ONE, Vec3::ONE]);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn kill_distance_is_strict() {
        let m = manager();
        let t = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
        assert!(!m.entered_kill_distance(&t, Vec3::new(2.0, 0.0, 0.0)));
        assert!(m.entered_kill_distance(&t, Vec3::new(2.0 + 1e-4, 0.0, 0.0)));
        assert!(m.entered_kill_distance(&t, Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn influence_distance_is_strict() {
        let m = manager();
        let t = Mat4::from_translation(Vec3::ZERO);
        assert!(!m.entered_influence_distance(&t, Vec3::new(0.0, 2.0, 0.0)));
        assert!(m.entered_influence_distance(&t, Vec3::new(0.0, 2.0 - 1e-4, 0.0)));
        assert!(!m.entered_kill_distance(&t, Vec3::new(0.0, 1.5, 0.0)));
    }

    #[test]
    fn predicates_use_transform_translation() {
        let m = manager();
        let t = Mat4::from_scale_rotation_translation(
            Vec3::splat(5.0),
            glam::Quat::from_rotation_y(1.0),
            Vec3::new(0.0, 0.0, 10.0),
        );
        assert!(m.entered_kill_distance(&t, Vec3::new(0.0, 0.0, 10.5)));
        assert!(!m.entered_kill_distance(&t, Vec3::ZERO));
    }

    #[test]
    fn queries_do_not_mutate() {
        let mut m = manager();
        m.extend_positions([Vec3::ZERO]);
        let t = *m.point(0).unwrap().transform();
        assert!(m.entered_kill_distance(&t, Vec3::ZERO));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remove_point_keeps_order() {
        let mut m = manager();
        m.extend_positions([Vec3::X, Vec3::Y, Vec3::Z]);
        let removed = m.remove_point(1).unwrap();
        assert_eq!(removed.position(), Vec3::Y);
        assert_eq!(m.point(0).unwrap().position(), Vec3::X);
        assert_eq!(m.point(1).unwrap().position(), Vec3::Z);
        assert!(matches!(
            m.remove_point(2),
            Err(GrowthError::OutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn remove_killed_drops_points_near_any_tip() {
        let mut m = manager();
        m.extend_positions([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 0.0),
        ]);
        let removed = m.remove_killed(&[Vec3::new(0.5, 0.0, 0.0), Vec3::new(20.0, 0.9, 0.0)]);
        assert_eq!(removed, 2);
        assert_eq!(m.len(), 1);
        assert_eq!(m.point(0).unwrap().position(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn thresholds_are_validated() {
        assert!(AttractionPointManager::new(1.0, 1.0).is_err());
        assert!(AttractionPointManager::new(0.5, 1.0).is_err());
        assert!(AttractionPointManager::new(1.0, -0.1).is_err());
        assert!(AttractionPointManager::new(f32::NAN, 0.1).is_err());
        assert!(AttractionPointManager::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn from_settings_uses_configured_distances() {
        let m = AttractionPointManager::from_settings(&GrowthSettings::default()).unwrap();
        assert_eq!(m.influence_distance(), 0.6);
        assert_eq!(m.kill_distance(), 0.15);
    }

    #[test]
    fn transforms_follow_points() {
        let mut m = manager();
        m.extend_positions([Vec3::X, Vec3::Y]);
        let ts: Vec<Mat4> = m.transforms().collect();
        assert_eq!(ts, vec![Mat4::from_translation(Vec3::X), Mat4::from_translation(Vec3::Y)]);
        assert_eq!((&m).into_iter().count(), 2);
    }
}
