use crate::environment::Environment;
use crate::geometry::{Aabb, Mesh};
use glam::{Mat4, Vec3};
use landing_common::{NodeId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Translucent sphere grouped with a model as one rigid unit.
///
/// `center` and `radius` are in the node's local frame, after the model's
/// normalization scale has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainmentSphere {
    pub center: Vec3,
    pub radius: f32,
    /// Linear RGBA; alpha below one.
    pub color: [f32; 4],
}

impl ContainmentSphere {
    /// Local matrix mapping a unit sphere onto this sphere.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.radius),
            glam::Quat::IDENTITY,
            self.center,
        )
    }
}

/// How a loaded model is presented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decoration {
    Plain,
    Contained(ContainmentSphere),
}

impl Decoration {
    pub fn sphere(&self) -> Option<&ContainmentSphere> {
        match self {
            Decoration::Plain => None,
            Decoration::Contained(sphere) => Some(sphere),
        }
    }
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// A loaded model: raw geometry plus the uniform normalization scale.
    Model {
        mesh: Arc<Mesh>,
        mesh_scale: f32,
        decoration: Decoration,
    },
    /// Wireframe cube shown while models are loading.
    Placeholder { size: f32 },
}

/// A node owned by the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
}

impl SceneNode {
    /// Matrix placing the node's geometry in world space.
    pub fn geometry_matrix(&self) -> Mat4 {
        let root = self.transform.matrix();
        match &self.content {
            NodeContent::Model { mesh_scale, .. } => {
                root * Mat4::from_scale(Vec3::splat(*mesh_scale))
            }
            NodeContent::Placeholder { size } => root * Mat4::from_scale(Vec3::splat(*size)),
        }
    }

    /// Matrix placing the containment sphere in world space, if any.
    pub fn containment_matrix(&self) -> Option<Mat4> {
        match &self.content {
            NodeContent::Model { decoration, .. } => decoration
                .sphere()
                .map(|s| self.transform.matrix() * s.local_matrix()),
            NodeContent::Placeholder { .. } => None,
        }
    }

    /// Bounds of the geometry in the node's local frame (scale applied,
    /// translation and rotation not).
    pub fn local_bounds(&self) -> Option<Aabb> {
        match &self.content {
            NodeContent::Model {
                mesh, mesh_scale, ..
            } => mesh.bounds().map(|b| b.scaled(*mesh_scale)),
            NodeContent::Placeholder { size } => {
                Some(Aabb::new(Vec3::splat(-size * 0.5), Vec3::splat(size * 0.5)))
            }
        }
    }
}

/// The scene root.
///
/// Owns the environment and every attached node. Nodes are kept in a
/// BTreeMap so iteration order is stable across runs. Each node also
/// remembers when it was attached, which orders nodes that share a name.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    environment: Environment,
    nodes: BTreeMap<NodeId, SceneNode>,
    attached: BTreeMap<NodeId, u64>,
    next_seq: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Default::default()
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    /// Attach a node and return its id.
    pub fn attach(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId::new();
        self.attach_with_id(id, node);
        id
    }

    /// Attach a node under a caller-chosen id, replacing any node already there.
    pub fn attach_with_id(&mut self, id: NodeId, node: SceneNode) {
        tracing::debug!(id = %id.short(), name = %node.name, "node attached");
        self.nodes.insert(id, node);
        self.attached.insert(id, self.next_seq);
        self.next_seq += 1;
    }

    /// Remove a node. Returns it if it existed.
    pub fn detach(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id);
        self.attached.remove(&id);
        if let Some(ref n) = node {
            tracing::debug!(id = %id.short(), name = %n.name, "node detached");
        }
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn summary(&self) -> SceneSummary {
        let mut summary = SceneSummary {
            nodes: self.nodes.len(),
            models: 0,
            contained: 0,
            placeholders: 0,
            flat_environment: self.environment.is_flat(),
        };
        for node in self.nodes.values() {
            match &node.content {
                NodeContent::Model { decoration, .. } => {
                    summary.models += 1;
                    if decoration.sphere().is_some() {
                        summary.contained += 1;
                    }
                }
                NodeContent::Placeholder { .. } => summary.placeholders += 1,
            }
        }
        summary
    }

    /// Deterministic hash of node names and transforms.
    /// Nodes are visited by name, then attach order, so freshly generated
    /// ids do not change it.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mut nodes: Vec<(u64, &SceneNode)> = self
            .nodes
            .iter()
            .map(|(id, node)| (self.attached.get(id).copied().unwrap_or(u64::MAX), node))
            .collect();
        nodes.sort_by(|(sa, a), (sb, b)| a.name.cmp(&b.name).then(sa.cmp(sb)));
        for (_, node) in nodes {
            let t = &node.transform;
            mix(&mut h, node.name.as_bytes());
            for v in [
                t.position.x,
                t.position.y,
                t.position.z,
                t.rotation.x,
                t.rotation.y,
                t.rotation.z,
                t.rotation.w,
                t.scale.x,
                t.scale.y,
                t.scale.z,
            ] {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}

/// Node counts by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSummary {
    pub nodes: usize,
    pub models: usize,
    pub contained: usize,
    pub placeholders: usize,
    pub flat_environment: bool,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} models={} contained={} placeholders={} environment={}",
            self.nodes,
            self.models,
            self.contained,
            self.placeholders,
            if self.flat_environment { "flat" } else { "hdr" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_node(name: &str, x: f32) -> SceneNode {
        SceneNode {
            name: name.into(),
            transform: Transform::from_position(Vec3::new(x, 0.0, 0.0)),
            content: NodeContent::Model {
                mesh: Arc::new(Mesh::cuboid(Vec3::new(2.0, 1.0, 1.0))),
                mesh_scale: 0.5,
                decoration: Decoration::Contained(ContainmentSphere {
                    center: Vec3::ZERO,
                    radius: 0.7,
                    color: [1.0, 1.0, 1.0, 0.25],
                }),
            },
        }
    }

    #[test]
    fn scene_starts_empty() {
        let s = Scene::new();
        assert_eq!(s.node_count(), 0);
        assert!(s.environment().is_flat());
    }

    #[test]
    fn attach_and_detach() {
        let mut s = Scene::new();
        let id = s.attach(model_node("duck", 0.0));
        assert_eq!(s.node_count(), 1);
        assert_eq!(s.get(id).unwrap().name, "duck");

        let node = s.detach(id);
        assert!(node.is_some());
        assert_eq!(s.node_count(), 0);
        assert!(s.detach(id).is_none());
    }

    #[test]
    fn sphere_moves_with_model() {
        let mut s = Scene::new();
        let id = s.attach(model_node("duck", 4.0));
        let node = s.get_mut(id).unwrap();
        node.transform.position.y = 3.0;

        let sphere = node.containment_matrix().unwrap();
        let center = sphere.transform_point3(Vec3::ZERO);
        assert_eq!(center, Vec3::new(4.0, 3.0, 0.0));

        let geometry = node.geometry_matrix();
        assert_eq!(geometry.transform_point3(Vec3::ZERO), center);
    }

    #[test]
    fn local_bounds_apply_mesh_scale() {
        let node = model_node("duck", 0.0);
        let b = node.local_bounds().unwrap();
        assert_eq!(b.max_extent(), 1.0);
    }

    #[test]
    fn summary_counts_kinds() {
        let mut s = Scene::new();
        s.attach(model_node("a", 0.0));
        s.attach(SceneNode {
            name: "placeholder".into(),
            transform: Transform::default(),
            content: NodeContent::Placeholder { size: 1.0 },
        });
        let summary = s.summary();
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.models, 1);
        assert_eq!(summary.contained, 1);
        assert_eq!(summary.placeholders, 1);
        assert!(summary.to_string().contains("environment=flat"));
    }

    #[test]
    fn state_hash_ignores_ids() {
        let mut a = Scene::new();
        let mut b = Scene::new();
        a.attach(model_node("x", 0.0));
        a.attach(model_node("y", 2.0));
        b.attach(model_node("y", 2.0));
        b.attach(model_node("x", 0.0));
        assert_eq!(a.state_hash(), b.state_hash());

        let id = a.nodes().keys().next().copied().unwrap();
        a.get_mut(id).unwrap().transform.position.y += 0.1;
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn state_hash_orders_shared_names_by_attach() {
        let build = || {
            let mut s = Scene::new();
            s.attach(model_node("twin", 0.0));
            s.attach(model_node("twin", 2.0));
            s.state_hash()
        };
        let first = build();
        for _ in 0..32 {
            assert_eq!(build(), first);
        }

        let mut swapped = Scene::new();
        swapped.attach(model_node("twin", 2.0));
        swapped.attach(model_node("twin", 0.0));
        assert_ne!(swapped.state_hash(), first);
    }

    #[test]
    fn reattached_node_moves_to_the_back() {
        let mut s = Scene::new();
        let a = s.attach(model_node("twin", 0.0));
        s.attach(model_node("twin", 2.0));
        let node = s.detach(a).unwrap();
        s.attach(node);

        let mut expected = Scene::new();
        expected.attach(model_node("twin", 2.0));
        expected.attach(model_node("twin", 0.0));
        assert_eq!(s.state_hash(), expected.state_hash());
    }
}
