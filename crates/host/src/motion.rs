use glam::Quat;
use landing_common::NodeId;
use landing_scene::Scene;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Constants of the upward drift field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Vertical speed range, units per tick.
    pub speed_min: f32,
    pub speed_max: f32,
    /// A node whose y exceeds `top` restarts at `bottom`.
    pub top: f32,
    pub bottom: f32,
    /// Half-widths of the x/z respawn ranges.
    pub spread_x: f32,
    pub spread_z: f32,
    /// Rotation about Y per tick, radians.
    pub spin_per_tick: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_min: 0.01,
            speed_max: 0.03,
            top: 5.0,
            bottom: -5.0,
            spread_x: 5.0,
            spread_z: 5.0,
            spin_per_tick: 0.01,
        }
    }
}

/// Per-node animation state, kept in a side table rather than on the node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    /// Assigned on the first tick and after every reset.
    pub speed: Option<f32>,
    pub resets: u32,
}

/// Result of one `MotionTable::step`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub moved: usize,
    pub resets: usize,
}

/// Side table of animated nodes keyed by node identity.
///
/// Nodes are stepped in enrollment order so a seeded table replays the
/// same random draws.
#[derive(Debug)]
pub struct MotionTable {
    config: MotionConfig,
    rng: StdRng,
    states: Vec<(NodeId, MotionState)>,
}

impl MotionTable {
    pub fn new(config: MotionConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            states: Vec::new(),
        }
    }

    pub fn from_os_rng(config: MotionConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_os_rng(),
            states: Vec::new(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Start animating a node. Enrolling twice keeps the existing state.
    pub fn enroll(&mut self, id: NodeId) {
        self.entry(id);
    }

    pub fn state(&self, id: NodeId) -> Option<&MotionState> {
        self.states.iter().find(|(k, _)| *k == id).map(|(_, s)| s)
    }

    fn entry(&mut self, id: NodeId) -> &mut MotionState {
        let at = match self.states.iter().position(|(k, _)| *k == id) {
            Some(at) => at,
            None => {
                self.states.push((id, MotionState::default()));
                self.states.len() - 1
            }
        };
        &mut self.states[at].1
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Pin a node's speed until its next reset.
    pub fn assign_speed(&mut self, id: NodeId, speed: f32) {
        self.entry(id).speed = Some(speed);
    }

    /// Advance every enrolled node present in the scene by one tick.
    ///
    /// Nodes rise by their speed and spin about Y. Past `top` a node
    /// restarts exactly at `bottom` with fresh x, z and speed.
    pub fn step(&mut self, scene: &mut Scene) -> StepOutcome {
        let config = &self.config;
        let rng = &mut self.rng;
        let spin = Quat::from_rotation_y(config.spin_per_tick);
        let mut outcome = StepOutcome::default();

        for (id, state) in &mut self.states {
            let Some(node) = scene.get_mut(*id) else {
                continue;
            };
            let speed = *state
                .speed
                .get_or_insert_with(|| sample_speed(rng, config));

            let t = &mut node.transform;
            t.position.y += speed;
            t.rotation = (spin * t.rotation).normalize();

            if t.position.y > config.top {
                t.position.y = config.bottom;
                t.position.x = sample_symmetric(rng, config.spread_x);
                t.position.z = sample_symmetric(rng, config.spread_z);
                state.speed = Some(sample_speed(rng, config));
                state.resets += 1;
                outcome.resets += 1;
                tracing::trace!(id = %id.short(), "drift reset");
            }
            outcome.moved += 1;
        }
        outcome
    }
}

fn sample_speed(rng: &mut StdRng, config: &MotionConfig) -> f32 {
    if config.speed_max > config.speed_min {
        rng.random_range(config.speed_min..=config.speed_max)
    } else {
        config.speed_min
    }
}

fn sample_symmetric(rng: &mut StdRng, spread: f32) -> f32 {
    if spread > 0.0 {
        rng.random_range(-spread..=spread)
    } else {
        0.0
    }
}
