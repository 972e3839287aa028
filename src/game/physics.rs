//! Player movement and block collision

use glam::Vec3;

use super::geometry::{Aabb, GeometryIndex};

/// Player collision box height
pub const PLAYER_HEIGHT: f32 = 1.8;
/// Player collision box width (x and z)
pub const PLAYER_WIDTH: f32 = 0.6;
/// Height of the floor plane the player can never sink below
pub const FLOOR_Y: f32 = 0.5;
/// Center height of a player standing on the floor plane
pub const STANDING_HEIGHT: f32 = FLOOR_Y + PLAYER_HEIGHT / 2.0;

/// Movement constants. Velocities are in world units per frame.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsConfig {
    pub player_height: f32,
    pub player_width: f32,
    /// Horizontal speed while a direction is held
    pub speed: f32,
    /// Vertical velocity set by a jump
    pub jump_impulse: f32,
    /// Added to vertical velocity every frame
    pub gravity: f32,
    pub floor_y: f32,
    /// Horizontal velocity multiplier on frames without input
    pub damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            player_height: PLAYER_HEIGHT,
            player_width: PLAYER_WIDTH,
            speed: 0.25,
            jump_impulse: 0.2,
            gravity: -0.02,
            floor_y: FLOOR_Y,
            damping: 0.9,
        }
    }
}

/// Held movement inputs for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Locally simulated avatar
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Center of the collision box
    pub position: Vec3,
    pub velocity: Vec3,
    /// Facing direction in radians
    pub yaw: f32,
    pub on_ground: bool,
    pub is_walking: bool,
}

impl Body {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            on_ground: false,
            is_walking: false,
        }
    }

    /// Body standing on the floor plane at the given horizontal position
    pub fn standing(x: f32, z: f32) -> Self {
        Self::new(Vec3::new(x, STANDING_HEIGHT, z))
    }
}

/// Unit vector the avatar faces for a given yaw (yaw 0 looks down -z)
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Unit vector to the avatar's right for a given yaw
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Axis a collision was resolved on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAxis {
    X,
    Y,
    Z,
}

/// Stateless movement step runner
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementSimulator {
    pub config: PhysicsConfig,
}

impl MovementSimulator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    /// Collision box of a body centered at `position`
    pub fn player_box(&self, position: Vec3) -> Aabb {
        Aabb::from_center(
            position,
            Vec3::new(
                self.config.player_width,
                self.config.player_height,
                self.config.player_width,
            ),
        )
    }

    /// Advance the body by one frame
    pub fn step(&self, body: &mut Body, input: &MoveInput, geometry: &GeometryIndex) {
        let cfg = &self.config;

        let forward = forward_from_yaw(body.yaw);
        let right = right_from_yaw(body.yaw);
        let mut direction = Vec3::ZERO;
        if input.forward {
            direction += forward;
        }
        if input.back {
            direction -= forward;
        }
        if input.left {
            direction -= right;
        }
        if input.right {
            direction += right;
        }

        // Opposite keys cancel out and count as no input
        body.is_walking = direction.length_squared() > 0.0;
        if body.is_walking {
            let direction = direction.normalize();
            body.velocity.x = direction.x * cfg.speed;
            body.velocity.z = direction.z * cfg.speed;
        } else {
            body.velocity.x *= cfg.damping;
            body.velocity.z *= cfg.damping;
        }

        body.velocity.y += cfg.gravity;

        if input.jump && body.on_ground {
            body.velocity.y = cfg.jump_impulse;
            body.on_ground = false;
        }

        body.position += body.velocity;

        body.on_ground = false;
        self.resolve_collisions(body, geometry);
        self.clamp_to_floor(body);
    }

    /// Push the body out of each overlapping box in turn
    fn resolve_collisions(&self, body: &mut Body, geometry: &GeometryIndex) {
        let mut player = self.player_box(body.position);

        for block in geometry.boxes() {
            if !player.intersects(block) {
                continue;
            }

            let overlap = player.overlap(block);
            match contact_axis(overlap) {
                ContactAxis::Y => {
                    let landing = if body.velocity.y != 0.0 {
                        body.velocity.y < 0.0
                    } else {
                        body.position.y >= block.center().y
                    };
                    if landing {
                        body.position.y += overlap.y;
                        body.on_ground = true;
                    } else {
                        body.position.y -= overlap.y;
                    }
                    body.velocity.y = 0.0;
                }
                ContactAxis::X => {
                    body.position.x -= overlap.x
                        * push_sign(body.velocity.x, body.position.x - block.center().x);
                    body.velocity.x = 0.0;
                }
                ContactAxis::Z => {
                    body.position.z -= overlap.z
                        * push_sign(body.velocity.z, body.position.z - block.center().z);
                    body.velocity.z = 0.0;
                }
            }

            player = self.player_box(body.position);
        }
    }

    fn clamp_to_floor(&self, body: &mut Body) {
        let half_height = self.config.player_height / 2.0;
        if body.position.y - half_height < self.config.floor_y {
            body.position.y = self.config.floor_y + half_height;
            body.velocity.y = 0.0;
            body.on_ground = true;
        }
    }
}

/// Smallest-overlap axis, ties resolved Y, then X, then Z
pub fn contact_axis(overlap: Vec3) -> ContactAxis {
    if overlap.y <= overlap.x && overlap.y <= overlap.z {
        ContactAxis::Y
    } else if overlap.x <= overlap.y && overlap.x <= overlap.z {
        ContactAxis::X
    } else {
        ContactAxis::Z
    }
}

/// +1 pushes toward negative coordinates. Follows travel direction, or the
/// side of the box the player is on when not moving along the axis.
///
/// The at-rest case deliberately differs from the browser client, which
/// always pushes toward +x/+z there and leaves Y untouched at zero vertical
/// velocity. Pushing away from the box center never leaves the body embedded.
fn push_sign(velocity: f32, offset_from_block: f32) -> f32 {
    if velocity > 0.0 {
        1.0
    } else if velocity < 0.0 {
        -1.0
    } else if offset_from_block < 0.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn sim() -> MovementSimulator {
        MovementSimulator::default()
    }

    fn penetration(sim: &MovementSimulator, body: &Body, block: &Aabb) -> f32 {
        let player = sim.player_box(body.position);
        if !player.intersects(block) {
            return 0.0;
        }
        let o = player.overlap(block);
        o.x.min(o.y).min(o.z)
    }

    #[test]
    fn free_fall_applies_gravity_once() {
        let sim = sim();
        let mut body = Body::new(Vec3::new(0.0, 10.0, 0.0));
        sim.step(&mut body, &MoveInput::default(), &GeometryIndex::default());

        assert!((body.position.y - (10.0 + sim.config.gravity)).abs() < 1e-6);
        assert!((body.velocity.y - sim.config.gravity).abs() < 1e-6);
        assert!(!body.on_ground);
    }

    #[test]
    fn floor_clamp_grounds_the_body() {
        let sim = sim();
        let mut body = Body::new(Vec3::new(0.0, STANDING_HEIGHT + 0.01, 0.0));
        sim.step(&mut body, &MoveInput::default(), &GeometryIndex::default());

        assert!((body.position.y - STANDING_HEIGHT).abs() < 1e-6);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.on_ground);
    }

    #[test]
    fn jump_requires_ground_and_clears_it() {
        let sim = sim();
        let geometry = GeometryIndex::default();
        let jump = MoveInput {
            jump: true,
            ..Default::default()
        };

        let mut airborne = Body::new(Vec3::new(0.0, 10.0, 0.0));
        sim.step(&mut airborne, &jump, &geometry);
        assert!(airborne.velocity.y < 0.0);

        let mut body = Body::standing(0.0, 0.0);
        sim.step(&mut body, &MoveInput::default(), &geometry);
        assert!(body.on_ground);

        sim.step(&mut body, &jump, &geometry);
        assert!(!body.on_ground);
        assert!((body.velocity.y - sim.config.jump_impulse).abs() < 1e-6);
        assert!(body.position.y > STANDING_HEIGHT);
    }

    #[test]
    fn input_sets_horizontal_velocity_directly() {
        let sim = sim();
        let geometry = GeometryIndex::default();
        let mut body = Body::standing(0.0, 0.0);
        body.velocity.x = 5.0;

        let input = MoveInput {
            forward: true,
            ..Default::default()
        };
        sim.step(&mut body, &input, &geometry);

        assert!(body.is_walking);
        assert!(body.velocity.x.abs() < 1e-6);
        assert!((body.velocity.z + sim.config.speed).abs() < 1e-6);
        assert!((body.position.z + sim.config.speed).abs() < 1e-6);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let sim = sim();
        let mut body = Body::standing(0.0, 0.0);
        let input = MoveInput {
            forward: true,
            right: true,
            ..Default::default()
        };
        sim.step(&mut body, &input, &GeometryIndex::default());

        let horizontal = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
        assert!((horizontal.length() - sim.config.speed).abs() < 1e-5);
        assert!(body.velocity.x > 0.0 && body.velocity.z < 0.0);
    }

    #[test]
    fn no_input_damps_horizontal_velocity() {
        let sim = sim();
        let mut body = Body::standing(0.0, 0.0);
        body.velocity = Vec3::new(1.0, 0.0, -0.5);
        sim.step(&mut body, &MoveInput::default(), &GeometryIndex::default());

        assert!(!body.is_walking);
        assert!((body.velocity.x - 0.9).abs() < 1e-6);
        assert!((body.velocity.z + 0.45).abs() < 1e-6);
    }

    #[test]
    fn opposite_keys_cancel() {
        let sim = sim();
        let mut body = Body::standing(0.0, 0.0);
        let input = MoveInput {
            forward: true,
            back: true,
            ..Default::default()
        };
        sim.step(&mut body, &input, &GeometryIndex::default());
        assert!(!body.is_walking);
    }

    #[test]
    fn yaw_rotates_movement() {
        let sim = sim();
        let mut body = Body::standing(0.0, 0.0);
        body.yaw = std::f32::consts::FRAC_PI_2;
        let input = MoveInput {
            forward: true,
            ..Default::default()
        };
        sim.step(&mut body, &input, &GeometryIndex::default());

        // Quarter turn left faces -x
        assert!((body.velocity.x + sim.config.speed).abs() < 1e-5);
        assert!(body.velocity.z.abs() < 1e-5);
    }

    #[test]
    fn landing_on_block_sets_on_ground() {
        let sim = sim();
        let block = Aabb::block(0, 3, 0);
        let geometry = GeometryIndex::new(vec![block]);

        // Feet slightly inside the top face, falling
        let mut body = Body::new(Vec3::new(0.5, 4.0 + PLAYER_HEIGHT / 2.0 + 0.01, 0.5));
        body.velocity.y = -0.05;
        sim.step(&mut body, &MoveInput::default(), &geometry);

        assert!(body.on_ground);
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.position.y - (4.0 + PLAYER_HEIGHT / 2.0)).abs() < EPS);
        assert!(penetration(&sim, &body, &block) < EPS);
    }

    #[test]
    fn standing_on_block_stays_grounded() {
        let sim = sim();
        let geometry = GeometryIndex::new(vec![Aabb::block(0, 3, 0)]);
        let mut body = Body::new(Vec3::new(0.5, 4.0 + PLAYER_HEIGHT / 2.0, 0.5));

        for _ in 0..30 {
            sim.step(&mut body, &MoveInput::default(), &geometry);
            assert!(body.on_ground);
        }
        assert!((body.position.y - (4.0 + PLAYER_HEIGHT / 2.0)).abs() < EPS);
    }

    #[test]
    fn head_bump_zeroes_upward_velocity_without_grounding() {
        let sim = sim();
        let block = Aabb::block(0, 5, 0);
        let geometry = GeometryIndex::new(vec![block]);

        // Top of the player just below the block, rising
        let mut body = Body::new(Vec3::new(0.5, 5.0 - PLAYER_HEIGHT / 2.0 - 0.05, 0.5));
        body.velocity.y = 0.2;
        sim.step(&mut body, &MoveInput::default(), &geometry);

        assert!(!body.on_ground);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.position.y + PLAYER_HEIGHT / 2.0 <= 5.0 + EPS);
    }

    #[test]
    fn walking_into_wall_pushes_back_on_x() {
        let sim = sim();
        // Tall wall to the +x side
        let blocks: Vec<Aabb> = (1..4).map(|y| Aabb::block(2, y, 0)).collect();
        let geometry = GeometryIndex::new(blocks.clone());

        let mut body = Body::standing(1.6, 0.5);
        body.yaw = -std::f32::consts::FRAC_PI_2; // facing +x
        let input = MoveInput {
            forward: true,
            ..Default::default()
        };
        for _ in 0..5 {
            sim.step(&mut body, &input, &geometry);
            for block in &blocks {
                assert!(penetration(&sim, &body, block) < EPS);
            }
        }
        assert!(body.position.x + PLAYER_WIDTH / 2.0 <= 2.0 + EPS);
        assert!(body.on_ground);
    }

    #[test]
    fn z_wall_resolves_on_z() {
        let sim = sim();
        let block = Aabb::new(Vec3::new(-5.0, 0.0, -3.0), Vec3::new(5.0, 10.0, -2.0));
        let geometry = GeometryIndex::new(vec![block]);

        let mut body = Body::standing(0.0, -1.6);
        let input = MoveInput {
            forward: true,
            ..Default::default()
        };
        sim.step(&mut body, &input, &geometry);

        assert_eq!(body.velocity.z, 0.0);
        assert!(body.position.z - PLAYER_WIDTH / 2.0 >= -2.0 - EPS);
        assert!(penetration(&sim, &body, &block) < EPS);
    }

    #[test]
    fn sequential_boxes_leave_no_penetration() {
        let sim = sim();
        // Floor step plus wall corner around the player
        let blocks = vec![
            Aabb::block(0, 1, 0),
            Aabb::block(1, 1, 0),
            Aabb::block(1, 2, 0),
            Aabb::block(1, 3, 0),
        ];
        let geometry = GeometryIndex::new(blocks.clone());

        let mut body = Body::new(Vec3::new(0.6, 2.0 + PLAYER_HEIGHT / 2.0 + 0.3, 0.5));
        body.yaw = -std::f32::consts::FRAC_PI_2;
        let input = MoveInput {
            forward: true,
            ..Default::default()
        };
        for _ in 0..40 {
            sim.step(&mut body, &input, &geometry);
            for block in &blocks {
                assert!(penetration(&sim, &body, block) < 0.02 + EPS);
            }
        }
        assert!(body.on_ground);
    }

    #[test]
    fn contact_axis_tie_order() {
        assert_eq!(contact_axis(Vec3::splat(0.3)), ContactAxis::Y);
        assert_eq!(contact_axis(Vec3::new(0.2, 0.3, 0.2)), ContactAxis::X);
        assert_eq!(contact_axis(Vec3::new(0.3, 0.3, 0.2)), ContactAxis::Z);
        assert_eq!(contact_axis(Vec3::new(0.2, 0.2, 0.5)), ContactAxis::Y);
    }

    #[test]
    fn push_at_rest_moves_away_from_box_center() {
        // Moving: travel direction wins regardless of side
        assert_eq!(push_sign(0.3, -1.0), 1.0);
        assert_eq!(push_sign(-0.3, 1.0), -1.0);
        // At rest on the -x side: pushed further toward -x
        assert_eq!(push_sign(0.0, -0.4), 1.0);
        // At rest on the +x side: pushed toward +x
        assert_eq!(push_sign(0.0, 0.4), -1.0);
    }

    #[test]
    fn forward_vectors_follow_yaw() {
        let f = forward_from_yaw(0.0);
        assert!((f - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
        let r = right_from_yaw(0.0);
        assert!((r - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }
}
