use crate::GrowthError;
use crate::crown::CrownSphere;
use crate::points::AttractionPointManager;
use glam::Vec3;
use treecrown_common::GrowthSettings;

/// One straight branch segment. Branches live in an arena and refer to their
/// parent by index; the trunk has no parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub start: Vec3,
    pub end: Vec3,
    pub direction: Vec3,
    pub parent: Option<usize>,
    pub depth: u32,
    children: usize,
}

impl Branch {
    pub fn children(&self) -> usize {
        self.children
    }
}

/// Why growth stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every attraction point was consumed.
    Exhausted,
    /// The trunk never came within influence distance of any point.
    Unreachable,
    /// An iteration added no branches.
    Stalled,
    /// The configured iteration cap was hit.
    IterationLimit,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            FinishReason::Exhausted => "all attraction points consumed",
            FinishReason::Unreachable => "crown out of reach",
            FinishReason::Stalled => "no new branches",
            FinishReason::IterationLimit => "iteration limit reached",
        };
        f.write_str(text)
    }
}

/// Outcome of one growth iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStep {
    Grew {
        new_branches: usize,
        consumed_points: usize,
    },
    Finished(FinishReason),
}

/// Space-colonization grower.
///
/// Each [`TreeGrower::step`] lets every attraction point vote for its
/// closest branch tip within influence distance, sprouts one child per voted
/// branch toward the mean vote direction, then removes the points the new
/// tips reached. The point set is owned by the caller and passed in.
#[derive(Debug, Clone)]
pub struct TreeGrower {
    branches: Vec<Branch>,
    trunk_base: Vec3,
    branch_length: f32,
    branch_radius: f32,
    radius_increase: f32,
    max_children: usize,
    stall_iterations: u32,
    max_iterations: u32,
    iteration: u32,
    finished: Option<FinishReason>,
}

impl TreeGrower {
    /// Grower with a single upward trunk segment starting at `trunk_base`.
    pub fn new(trunk_base: Vec3, settings: &GrowthSettings) -> Result<Self, GrowthError> {
        if !trunk_base.is_finite() {
            return Err(GrowthError::InvalidArgument(format!(
                "trunk base must be finite, got {trunk_base}"
            )));
        }
        if !settings.branch_length.is_finite() || settings.branch_length <= 0.0 {
            return Err(GrowthError::InvalidArgument(format!(
                "branch length must be positive, got {}",
                settings.branch_length
            )));
        }
        if !settings.branch_radius.is_finite()
            || !settings.branch_radius_increase.is_finite()
            || settings.branch_radius <= 0.0
            || settings.branch_radius_increase < 0.0
        {
            return Err(GrowthError::InvalidArgument(format!(
                "branch radius must be positive and its increase non-negative, got {} / {}",
                settings.branch_radius, settings.branch_radius_increase
            )));
        }
        let mut grower = Self {
            branches: Vec::new(),
            trunk_base,
            branch_length: settings.branch_length,
            branch_radius: settings.branch_radius,
            radius_increase: settings.branch_radius_increase,
            max_children: settings.max_children,
            stall_iterations: settings.stall_iterations,
            max_iterations: settings.max_iterations,
            iteration: 0,
            finished: None,
        };
        grower.reset();
        Ok(grower)
    }

    /// Grower whose trunk starts `trunk_offset` below the crown's lowest point.
    pub fn for_crown(crown: &CrownSphere, settings: &GrowthSettings) -> Result<Self, GrowthError> {
        let base = crown.bottom() - Vec3::Y * settings.trunk_offset;
        Self::new(base, settings)
    }

    /// Drop all growth and start again from the trunk.
    pub fn reset(&mut self) {
        self.branches.clear();
        self.branches.push(Branch {
            start: self.trunk_base,
            end: self.trunk_base + Vec3::Y * self.branch_length,
            direction: Vec3::Y,
            parent: None,
            depth: 0,
            children: 0,
        });
        self.iteration = 0;
        self.finished = None;
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Radius of every branch, indexed like [`TreeGrower::branches`].
    ///
    /// Tips get the base radius and each parent is at least its thickest
    /// child plus the configured increase, so the trunk ends up widest.
    pub fn radii(&self) -> Vec<f32> {
        let mut radii = vec![self.branch_radius; self.branches.len()];
        // Children always sit after their parent, so a reverse pass settles
        // every child before its parent is read.
        for (index, branch) in self.branches.iter().enumerate().rev() {
            if let Some(parent) = branch.parent {
                let wanted = radii[index] + self.radius_increase;
                if radii[parent] < wanted {
                    radii[parent] = wanted;
                }
            }
        }
        radii
    }

    /// `(start, end, radius)` of every branch, trunk first.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, f32)> + '_ {
        self.branches
            .iter()
            .zip(self.radii())
            .map(|(b, radius)| (b.start, b.end, radius))
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn finished(&self) -> Option<FinishReason> {
        self.finished
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Run one iteration against `points`, removing the points it reaches.
    pub fn step(&mut self, points: &mut AttractionPointManager) -> GrowthStep {
        if let Some(reason) = self.finished {
            return GrowthStep::Finished(reason);
        }
        if points.is_empty() {
            return self.finish(FinishReason::Exhausted);
        }
        if self.iteration >= self.max_iterations {
            return self.finish(FinishReason::IterationLimit);
        }
        self.iteration += 1;

        let existing = self.branches.len();
        let mut votes = vec![Vec3::ZERO; existing];
        let mut voters = vec![0usize; existing];
        let mut influenced = 0usize;

        for point in points.iter() {
            let target = point.transform().w_axis.truncate();
            let mut closest: Option<(usize, f32)> = None;
            for (index, branch) in self.branches.iter().enumerate() {
                if !points.entered_influence_distance(point.transform(), branch.end) {
                    continue;
                }
                let distance = branch.end.distance(target);
                if closest.is_none_or(|(_, best)| distance < best) {
                    closest = Some((index, distance));
                }
            }
            if let Some((index, _)) = closest {
                votes[index] += (target - self.branches[index].end).normalize_or_zero();
                voters[index] += 1;
                influenced += 1;
            }
        }

        if influenced == 0 {
            if self.iteration < self.stall_iterations {
                // Nothing in reach yet: keep pushing the newest branch upward.
                self.sprout(existing - 1, Vec3::Y);
            } else {
                return self.finish(FinishReason::Unreachable);
            }
        }

        for index in 0..existing {
            if voters[index] == 0 || self.branches[index].children > self.max_children {
                continue;
            }
            let direction = votes[index].normalize_or_zero();
            if direction == Vec3::ZERO {
                continue;
            }
            self.sprout(index, direction);
        }

        let new_branches = self.branches.len() - existing;
        if new_branches == 0 {
            return self.finish(FinishReason::Stalled);
        }

        let tips: Vec<Vec3> = self.branches[existing..].iter().map(|b| b.end).collect();
        let consumed_points = points.remove_killed(&tips);
        tracing::debug!(
            iteration = self.iteration,
            new_branches,
            consumed_points,
            remaining = points.len(),
            "growth step"
        );
        GrowthStep::Grew {
            new_branches,
            consumed_points,
        }
    }

    /// Step until growth finishes.
    pub fn grow(&mut self, points: &mut AttractionPointManager) -> FinishReason {
        loop {
            if let GrowthStep::Finished(reason) = self.step(points) {
                return reason;
            }
        }
    }

    fn sprout(&mut self, parent: usize, direction: Vec3) {
        let start = self.branches[parent].end;
        let depth = self.branches[parent].depth + 1;
        self.branches[parent].children += 1;
        self.branches.push(Branch {
            start,
            end: start + direction * self.branch_length,
            direction,
            parent: Some(parent),
            depth,
            children: 0,
        });
    }

    fn finish(&mut self, reason: FinishReason) -> GrowthStep {
        self.finished = Some(reason);
        tracing::info!(
            iterations = self.iteration,
            branches = self.branches.len(),
            %reason,
            "growth finished"
        );
        GrowthStep::Finished(reason)
    }
}
