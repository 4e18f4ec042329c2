use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::input::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, or zero when the length is zero.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > f32::EPSILON {
            self * len.recip()
        } else {
            Vec3::ZERO
        }
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
            z: lerp(self.z, other.z, t),
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Cubic ease `t * t * (3 - 2t)` with the input clamped to `0..=1`.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Axis-aligned box; containment is inclusive on every face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

/// Camera state expressed as an eye position, a look target and a roll
/// angle in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    pub roll: f32,
}

impl CameraPose {
    pub fn looking_at(position: Vec3, look_at: Vec3) -> Self {
        Self {
            position,
            look_at,
            roll: 0.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.position).normalized()
    }

    /// Forward direction flattened onto the floor plane.
    pub fn planar_forward(&self) -> Vec3 {
        let forward = self.look_at - self.position;
        Vec3::new(forward.x, 0.0, forward.z).normalized()
    }

    /// Interpolates position and look target; roll follows linearly.
    pub fn blend(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(other.position, t),
            look_at: self.look_at.lerp(other.look_at, t),
            roll: lerp(self.roll, other.roll, t),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform3 {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform3 {
    pub const IDENTITY: Transform3 = Transform3 {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
    };

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_clamps_and_eases() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        assert!(smoothstep(0.25) < 0.25);
    }

    #[test]
    fn aabb_containment_is_inclusive() {
        let bounds = Aabb::from_center_size(Vec3::new(0.0, 2.5, 0.0), Vec3::new(2.0, 5.0, 2.0));
        assert!(bounds.contains_point(Vec3::new(1.0, 0.0, -1.0)));
        assert!(!bounds.contains_point(Vec3::new(1.01, 1.0, 0.0)));
    }

    #[test]
    fn planar_forward_ignores_height() {
        let pose = CameraPose::looking_at(Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, 1.0, -3.0));
        let forward = pose.planar_forward();
        assert_eq!(forward.y, 0.0);
        assert!((forward.z + 1.0).abs() < 1e-6);
    }
}
