//! Static arena geometry: collidable boxes and arena generation

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Edge length of one voxel block
pub const BLOCK_SIZE: f32 = 1.0;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given size centered on `center`
    pub fn from_center(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Unit voxel whose minimum corner sits on integer grid coordinates
    pub fn block(x: i32, y: i32, z: i32) -> Self {
        let min = Vec3::new(x as f32, y as f32, z as f32) * BLOCK_SIZE;
        Self {
            min,
            max: min + Vec3::splat(BLOCK_SIZE),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Touching faces count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Per-axis penetration depth. Only meaningful when the boxes intersect.
    pub fn overlap(&self, other: &Aabb) -> Vec3 {
        self.max.min(other.max) - self.min.max(other.min)
    }
}

/// Immutable set of collidable boxes, queried by the movement simulator
#[derive(Debug, Clone, Default)]
pub struct GeometryIndex {
    boxes: Vec<Aabb>,
}

impl GeometryIndex {
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }

    /// Boxes in resolution order
    pub fn boxes(&self) -> &[Aabb] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Arena shape parameters
#[derive(Debug, Clone, Copy)]
pub struct ArenaConfig {
    /// Floor grid height
    pub floor_y: i32,
    /// Radius of the circular floor in blocks
    pub floor_radius: i32,
    /// Wall height in blocks
    pub wall_height: i32,
    /// Wall ring thickness in blocks
    pub wall_thickness: i32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            floor_y: 0,
            floor_radius: 50,
            wall_height: 5,
            wall_thickness: 2,
        }
    }
}

/// Generated arena: decorative floor tiles plus collidable wall blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaLayout {
    /// Grid height of the floor layer
    pub floor_y: i32,
    /// Floor tiles (rendered, never collided against)
    pub floor: Vec<Aabb>,
    /// Wall blocks (collidable)
    pub blocks: Vec<Aabb>,
}

impl ArenaLayout {
    /// Build the circular floor and the surrounding ring wall
    pub fn generate(config: &ArenaConfig) -> Self {
        let r = config.floor_radius;
        let mut floor = Vec::new();
        for x in -r..=r {
            for z in -r..=r {
                if x * x + z * z <= r * r {
                    floor.push(Aabb::block(x, config.floor_y, z));
                }
            }
        }

        let inner = config.floor_radius as f32;
        let outer = (config.floor_radius + config.wall_thickness) as f32;
        let extent = config.floor_radius + config.wall_thickness + 1;
        let mut blocks = Vec::new();
        for x in -extent..=extent {
            for z in -extent..=extent {
                let dist = ((x * x + z * z) as f32).sqrt();
                if dist >= inner && dist <= outer {
                    for h in 0..config.wall_height {
                        blocks.push(Aabb::block(x, config.floor_y + h + 1, z));
                    }
                }
            }
        }

        Self {
            floor_y: config.floor_y,
            floor,
            blocks,
        }
    }

    /// Collision index over the wall blocks
    pub fn geometry(&self) -> GeometryIndex {
        GeometryIndex::new(self.blocks.clone())
    }
}
