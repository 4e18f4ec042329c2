use std::collections::HashMap;

use engine::{Aabb, AnchorId, CameraPose, Transform3, Vec3};

use super::types::{InteractableKind, WorldFlags};

pub(crate) const MAIN_DOOR_OPEN_YAW: f32 = -std::f32::consts::FRAC_PI_2;
pub(crate) const BATHROOM_DOOR_OPEN_YAW: f32 = std::f32::consts::FRAC_PI_2;
pub(crate) const CLOSET_DOOR_OPEN_YAW: f32 = -std::f32::consts::FRAC_PI_3;

/// Scene objects positional cues can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Anchor {
    Clock,
    Phone,
    Door,
    BathroomDoor,
    Closet,
    ClosetDoor,
    Window,
    WhisperEyes,
    AmbienceProxy,
}

impl Anchor {
    pub(crate) const ALL: [Anchor; 9] = [
        Self::Clock,
        Self::Phone,
        Self::Door,
        Self::BathroomDoor,
        Self::Closet,
        Self::ClosetDoor,
        Self::Window,
        Self::WhisperEyes,
        Self::AmbienceProxy,
    ];
}

/// Anchors present in the loaded scene. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorldAnchors {
    ids: HashMap<Anchor, AnchorId>,
}

impl WorldAnchors {
    pub(crate) fn standard() -> Self {
        let ids = Anchor::ALL
            .into_iter()
            .zip(1u32..)
            .map(|(anchor, id)| (anchor, AnchorId(id)))
            .collect();
        Self { ids }
    }

    pub(crate) fn get(&self, anchor: Anchor) -> Option<AnchorId> {
        self.ids.get(&anchor).copied()
    }

    #[cfg(test)]
    pub(crate) fn without(mut self, anchor: Anchor) -> Self {
        self.ids.remove(&anchor);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InteractTarget {
    pub(crate) kind: InteractableKind,
    pub(crate) position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Target {
    pub(crate) kind: InteractableKind,
    pub(crate) distance: f32,
}

/// Resolves what the camera is currently pointing at.
pub(crate) trait TargetingProvider {
    fn target(&self, pose: &CameraPose) -> Option<Target>;
}

/// Nearest interactable whose bearing lies inside a narrow cone around the
/// camera's forward vector.
#[derive(Debug, Clone)]
pub(crate) struct ConeTargeting {
    targets: Vec<InteractTarget>,
    min_alignment: f32,
}

impl ConeTargeting {
    pub(crate) fn new(targets: Vec<InteractTarget>, half_angle_radians: f32) -> Self {
        Self {
            targets,
            min_alignment: half_angle_radians.cos(),
        }
    }
}

impl TargetingProvider for ConeTargeting {
    fn target(&self, pose: &CameraPose) -> Option<Target> {
        let forward = pose.forward();
        self.targets
            .iter()
            .filter_map(|target| {
                let offset = target.position - pose.position;
                let distance = offset.length();
                if distance <= f32::EPSILON {
                    return Some(Target {
                        kind: target.kind,
                        distance,
                    });
                }
                let alignment = offset.normalized().dot(forward);
                (alignment >= self.min_alignment).then_some(Target {
                    kind: target.kind,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Static geometry the player walks through: furniture blockers, room
/// volumes and the two door blockers.
#[derive(Debug, Clone)]
pub(crate) struct WorldLayout {
    solids: Vec<Aabb>,
    targets: Vec<InteractTarget>,
}

impl WorldLayout {
    pub(crate) fn standard() -> Self {
        let solids = vec![
            // bed
            Aabb::from_center_size(Vec3::new(-4.5, 2.5, 5.5), Vec3::new(8.0, 5.0, 5.5)),
            // desk
            Aabb::from_center_size(Vec3::new(5.0, 2.5, 3.0), Vec3::new(5.5, 5.0, 4.5)),
        ];
        let targets = vec![
            InteractTarget {
                kind: InteractableKind::Switch,
                position: Vec3::new(2.5, 3.0, -7.42),
            },
            InteractTarget {
                kind: InteractableKind::Door,
                position: Vec3::new(0.0, 2.5, -7.5),
            },
            InteractTarget {
                kind: InteractableKind::BathroomDoor,
                position: Vec3::new(-1.5, 2.5, -22.5),
            },
            InteractTarget {
                kind: InteractableKind::Laptop,
                position: Vec3::new(5.0, 1.55, 3.0),
            },
            InteractTarget {
                kind: InteractableKind::Phone,
                position: Vec3::new(5.85, 1.6, 3.85),
            },
            InteractTarget {
                kind: InteractableKind::ClosetDoor,
                position: Vec3::new(-7.5, 3.0, 0.0),
            },
            InteractTarget {
                kind: InteractableKind::Picture,
                position: Vec3::new(-6.5, 3.5, 7.35),
            },
            InteractTarget {
                kind: InteractableKind::Picture,
                position: Vec3::new(1.35, 3.0, -17.5),
            },
            InteractTarget {
                kind: InteractableKind::Picture,
                position: Vec3::new(-9.85, 3.5, -30.0),
            },
        ];
        Self { solids, targets }
    }

    pub(crate) fn targets(&self) -> &[InteractTarget] {
        &self.targets
    }

    /// True when `pos` is blocked. Anywhere outside the four rooms counts as
    /// blocked.
    pub(crate) fn collides(&self, pos: Vec3, flags: &WorldFlags) -> bool {
        if self.solids.iter().any(|solid| solid.contains_point(pos)) {
            return true;
        }

        let in_bedroom = pos.z > -7.0 && pos.x > -7.0 && pos.x < 7.0 && pos.z < 7.0;
        let in_hallway = pos.z <= -7.0 && pos.z >= -27.5 && pos.x > -9.0 && pos.x < 1.4;
        let in_bathroom = pos.x <= -1.6 && pos.x > -9.0 && pos.z > -26.0 && pos.z < -19.0;
        let in_living = pos.z < -27.5 && pos.x > -9.5 && pos.x < 19.5 && pos.z > -44.5;

        if !flags.main_door_open && pos.z > -8.0 && pos.z < -7.0 && pos.x.abs() < 1.5 {
            return true;
        }
        if !flags.bathroom_door_open
            && pos.z < -19.5
            && pos.z > -22.5
            && pos.x < -1.4
            && pos.x > -1.6
        {
            return true;
        }

        !(in_bedroom || in_hallway || in_living || in_bathroom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FigurePose {
    pub(crate) visible: bool,
    pub(crate) position: Vec3,
    pub(crate) left_arm: Vec3,
    pub(crate) right_arm: Vec3,
    pub(crate) head: Vec3,
}

impl Default for FigurePose {
    fn default() -> Self {
        Self {
            visible: false,
            position: Vec3::ZERO,
            left_arm: Vec3::ZERO,
            right_arm: Vec3::ZERO,
            head: Vec3::ZERO,
        }
    }
}

pub(crate) const HAND_REST_OFFSET: Vec3 = Vec3::new(0.2, 3.5, 2.0);

/// Cosmetic scene state touched by encounters and interactions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SceneProps {
    pub(crate) hand_visible: bool,
    pub(crate) hand_offset: Vec3,
    pub(crate) closet_door: Transform3,
    pub(crate) main_door_yaw: f32,
    pub(crate) bathroom_door_yaw: f32,
    pub(crate) figure: FigurePose,
    pub(crate) eyes_visible: bool,
    pub(crate) eyes_facing: Vec3,
}

impl Default for SceneProps {
    fn default() -> Self {
        Self {
            hand_visible: false,
            hand_offset: HAND_REST_OFFSET,
            closet_door: Transform3::IDENTITY,
            main_door_yaw: 0.0,
            bathroom_door_yaw: 0.0,
            figure: FigurePose::default(),
            eyes_visible: false,
            eyes_facing: Vec3::new(0.0, 4.0, 0.0),
        }
    }
}

impl SceneProps {
    /// Door poses derived from the flags, without any motion in between.
    pub(crate) fn snap_doors(&mut self, flags: &WorldFlags) {
        self.main_door_yaw = if flags.main_door_open {
            MAIN_DOOR_OPEN_YAW
        } else {
            0.0
        };
        self.bathroom_door_yaw = if flags.bathroom_door_open {
            BATHROOM_DOOR_OPEN_YAW
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_every_room_is_blocked() {
        let layout = WorldLayout::standard();
        let flags = WorldFlags::default();
        assert!(!layout.collides(Vec3::new(0.0, 4.0, 0.0), &flags));
        assert!(layout.collides(Vec3::new(8.0, 4.0, 0.0), &flags));
        assert!(layout.collides(Vec3::new(0.0, 4.0, -50.0), &flags));
    }

    #[test]
    fn closed_main_door_blocks_the_doorway() {
        let layout = WorldLayout::standard();
        let mut flags = WorldFlags::default();
        let doorway = Vec3::new(0.0, 4.0, -7.5);
        assert!(layout.collides(doorway, &flags));
        flags.main_door_open = true;
        assert!(!layout.collides(doorway, &flags));
    }

    #[test]
    fn furniture_is_solid() {
        let layout = WorldLayout::standard();
        assert!(layout.collides(Vec3::new(-4.5, 2.0, 5.0), &WorldFlags::default()));
        assert!(!layout.collides(Vec3::new(-4.5, 6.0, 1.0), &WorldFlags::default()));
    }

    #[test]
    fn cone_targeting_picks_nearest_in_view() {
        let layout = WorldLayout::standard();
        let targeting = ConeTargeting::new(layout.targets().to_vec(), 0.15);
        let pose = CameraPose::looking_at(Vec3::new(2.5, 3.0, -5.0), Vec3::new(2.5, 3.0, -7.5));
        let hit = targeting.target(&pose).expect("switch in view");
        assert_eq!(hit.kind, InteractableKind::Switch);
        assert!((hit.distance - 2.42).abs() < 1e-4);

        let away = CameraPose::looking_at(Vec3::new(2.5, 3.0, -5.0), Vec3::new(2.5, 3.0, 0.0));
        assert_ne!(
            targeting.target(&away).map(|hit| hit.kind),
            Some(InteractableKind::Switch)
        );
    }

    #[test]
    fn missing_anchor_is_reported_as_absent() {
        let anchors = WorldAnchors::standard().without(Anchor::Closet);
        assert!(anchors.get(Anchor::Closet).is_none());
        assert!(anchors.get(Anchor::Window).is_some());
    }
}
