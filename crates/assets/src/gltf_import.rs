use crate::error::AssetError;
use glam::{Mat3, Mat4, Vec3};
use gltf::mesh::Mode;
use landing_scene::Mesh;
use std::path::Path;

/// Decode a `.gltf`/`.glb` file into a single mesh with node transforms baked in.
///
/// Images are not decoded; only geometry buffers are read.
pub fn decode_gltf_file(path: &Path) -> Result<Mesh, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    decode_gltf(&document, &buffers, &path.display().to_string())
}

/// Decode an in-memory glTF. Buffers must be embedded (GLB or data URIs).
pub fn decode_gltf_slice(bytes: &[u8], label: &str) -> Result<Mesh, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, None, blob)?;
    decode_gltf(&document, &buffers, label)
}

/// Collect every primitive reachable from the default scene (or the first
/// scene, or every mesh when the file has no scenes).
pub fn decode_gltf(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    label: &str,
) -> Result<Mesh, AssetError> {
    let mut builder = MeshBuilder::default();

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, Mat4::IDENTITY, buffers, &mut builder);
            }
        }
        None => {
            for mesh in document.meshes() {
                builder.append(&mesh, Mat4::IDENTITY, buffers);
            }
        }
    }

    if builder.mesh.positions.is_empty() {
        return Err(AssetError::NoGeometry(label.to_string()));
    }

    let mut mesh = builder.mesh;
    if builder.missing_normals {
        mesh.compute_normals();
    }
    tracing::debug!(
        label,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "decoded glTF"
    );
    Ok(mesh)
}

fn visit_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    builder: &mut MeshBuilder,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        builder.append(&mesh, world, buffers);
    }
    for child in node.children() {
        visit_node(&child, world, buffers, builder);
    }
}

#[derive(Default)]
struct MeshBuilder {
    mesh: Mesh,
    missing_normals: bool,
}

impl MeshBuilder {
    fn append(&mut self, mesh: &gltf::Mesh<'_>, world: Mat4, buffers: &[gltf::buffer::Data]) {
        let normal_matrix = {
            let m = Mat3::from_mat4(world);
            if m.determinant().abs() > f32::EPSILON {
                m.inverse().transpose()
            } else {
                Mat3::IDENTITY
            }
        };

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };

            let base = self.mesh.positions.len() as u32;
            self.mesh
                .positions
                .extend(positions.map(|p| world.transform_point3(Vec3::from(p))));
            let added = self.mesh.positions.len() as u32 - base;

            match reader.read_normals() {
                Some(normals) => self.mesh.normals.extend(
                    normals.map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero()),
                ),
                None => {
                    self.missing_normals = true;
                    self.mesh
                        .normals
                        .extend(std::iter::repeat_n(Vec3::ZERO, added as usize));
                }
            }

            if primitive.mode() != Mode::Triangles {
                continue;
            }
            match reader.read_indices() {
                Some(indices) => self
                    .mesh
                    .indices
                    .extend(indices.into_u32().map(|i| i + base)),
                None => self.mesh.indices.extend(base..base + added),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One triangle (0,0,0) (2,0,0) (0,1,0) under a node translated to z=5
    /// and scaled by 2.
    pub(crate) const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0, "translation": [0.0, 0.0, 5.0], "scale": [2.0, 2.0, 2.0] } ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAQAAAAAAAAAAAAAAAAAAAgD8AAAAA"
        } ],
        "bufferViews": [ { "buffer": 0, "byteOffset": 0, "byteLength": 36 } ],
        "accessors": [ {
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [2.0, 1.0, 0.0]
        } ]
    }"#;

    #[test]
    fn decodes_embedded_triangle_with_node_transform() {
        let mesh = decode_gltf_slice(TRIANGLE_GLTF.as_bytes(), "triangle").unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);

        let b = mesh.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(b.max, Vec3::new(4.0, 2.0, 5.0));

        // Normals were absent and are computed from the winding.
        for n in &mesh.normals {
            assert!((n.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn decodes_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.gltf");
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();
        let mesh = decode_gltf_file(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn empty_document_has_no_geometry() {
        let json = r#"{ "asset": { "version": "2.0" } }"#;
        let result = decode_gltf_slice(json.as_bytes(), "empty");
        assert!(matches!(result, Err(AssetError::NoGeometry(_))));
    }

    #[test]
    fn malformed_json_is_gltf_error() {
        let result = decode_gltf_slice(b"{ not json", "broken");
        assert!(matches!(result, Err(AssetError::Gltf(_))));
    }
}
