use glam::{Affine3A, Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::errors::{BakeError, Result};

/// Local TRS of a joint relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl JointTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint. Parents always precede their children.
    pub parent: Option<usize>,
    /// Bind (rest) pose.
    pub rest: JointTransform,
}

impl Joint {
    #[must_use]
    pub fn new(name: &str, parent: Option<usize>, rest: JointTransform) -> Self {
        Self {
            name: name.to_string(),
            parent,
            rest,
        }
    }
}

/// Joint hierarchy plus the pose state used for CPU skinning.
///
/// Posing mutates `local`, `world` and `joint_matrices`; the joint list and
/// inverse bind matrices never change after construction.
#[derive(Debug, Clone)]
pub struct Skeleton {
    joints: Vec<Joint>,
    // Mesh space -> joint space
    inverse_bind_matrices: Vec<Affine3A>,
    name_lookup: FxHashMap<String, usize>,

    // === Pose state ===
    local: Vec<JointTransform>,
    world: Vec<Affine3A>,
    joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Builds a skeleton from explicit inverse bind matrices.
    pub fn new(joints: Vec<Joint>, inverse_bind_matrices: Vec<Affine3A>) -> Result<Self> {
        if joints.len() != inverse_bind_matrices.len() {
            return Err(BakeError::InvalidRig(format!(
                "{} joints but {} inverse bind matrices",
                joints.len(),
                inverse_bind_matrices.len()
            )));
        }

        let mut name_lookup = FxHashMap::default();
        for (i, joint) in joints.iter().enumerate() {
            if let Some(parent) = joint.parent
                && parent >= i
            {
                return Err(BakeError::InvalidRig(format!(
                    "joint '{}' (#{i}) has parent #{parent}, parents must come first",
                    joint.name
                )));
            }
            if name_lookup.insert(joint.name.clone(), i).is_some() {
                return Err(BakeError::InvalidRig(format!(
                    "duplicate joint name '{}'",
                    joint.name
                )));
            }
        }

        let count = joints.len();
        let mut skeleton = Self {
            local: joints.iter().map(|j| j.rest).collect(),
            joints,
            inverse_bind_matrices,
            name_lookup,
            world: vec![Affine3A::IDENTITY; count],
            joint_matrices: vec![Mat4::IDENTITY; count],
        };
        skeleton.update_world_matrices();
        Ok(skeleton)
    }

    /// Builds a skeleton whose bind pose is its rest pose, deriving the
    /// inverse bind matrices from the rest transforms.
    pub fn from_rest_pose(joints: Vec<Joint>) -> Result<Self> {
        let placeholder = vec![Affine3A::IDENTITY; joints.len()];
        let mut skeleton = Self::new(joints, placeholder)?;
        skeleton.inverse_bind_matrices = skeleton.world.iter().map(Affine3A::inverse).collect();
        skeleton.update_world_matrices();
        Ok(skeleton)
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.name_lookup.get(name).copied()
    }

    /// Current local transform of a joint.
    #[must_use]
    pub fn local(&self, joint: usize) -> Option<&JointTransform> {
        self.local.get(joint)
    }

    pub fn local_mut(&mut self, joint: usize) -> Option<&mut JointTransform> {
        self.local.get_mut(joint)
    }

    /// Current world (rig space) matrix of a joint.
    #[must_use]
    pub fn world(&self, joint: usize) -> Option<&Affine3A> {
        self.world.get(joint)
    }

    /// Skinning matrices computed by the last [`update_world_matrices`](Self::update_world_matrices).
    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Restores every joint's local transform to its rest pose.
    pub fn reset_to_rest(&mut self) {
        for (local, joint) in self.local.iter_mut().zip(&self.joints) {
            *local = joint.rest;
        }
    }

    /// Propagates local transforms down the hierarchy and refreshes the
    /// skinning matrices (`world * inverse_bind`).
    pub fn update_world_matrices(&mut self) {
        for i in 0..self.joints.len() {
            let local = self.local[i].to_affine();
            self.world[i] = match self.joints[i].parent {
                Some(parent) => self.world[parent] * local,
                None => local,
            };
            self.joint_matrices[i] = Mat4::from(self.world[i] * self.inverse_bind_matrices[i]);
        }
    }
}
