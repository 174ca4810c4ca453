use std::cell::RefCell;
use std::iter;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec2, Vec3};
use itertools::izip;
use log::{info, warn};

use crate::cache;
use crate::error::{Error, Result};
use crate::mesh::{Mesh, Vertex};
use crate::node::{self, Node};
use crate::shader::Shader;
use crate::texture::{self, Texture, TextureRole};

mod russimp {
    pub use russimp::material::Material;
    pub use russimp::mesh::Mesh;
    pub use russimp::node::Node;
    pub use russimp::scene::{PostProcess, Scene};
    pub use russimp::texture::{Texture, TextureType};
    pub use russimp::{Matrix4x4, Vector3D};
}

const SCENE_FLAGS_INCOMPLETE: u32 = 0x1;

/// A fully loaded, renderer-ready document: a flat mesh list plus a node
/// arena whose transforms are baked to world space at import time.
///
/// The arena is built root-first, so index 0 is always the root and every
/// node appears after its parent.
pub struct Model {
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
}

struct ModelLoader {
    scene: russimp::Scene,
    directory: PathBuf,
}

impl Model {
    /// Imports the document at `path` to completion: parse, make every
    /// referenced texture cache-resident, upload the meshes, build the
    /// node arena. Synchronous and never retried; either a usable model
    /// comes back or the first fatal error does.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Model> {
        let path = path.as_ref();

        let import_error = |reason: String| Error::Import {
            path: path.to_owned(),
            reason,
        };

        let path_str = path
            .to_str()
            .ok_or_else(|| import_error("non UTF-8 path".to_owned()))?;

        let scene = russimp::Scene::from_file(
            path_str,
            vec![
                russimp::PostProcess::JoinIdenticalVertices,
                russimp::PostProcess::GenerateNormals,
                russimp::PostProcess::ValidateDataStructure,
                russimp::PostProcess::Triangulate,
                russimp::PostProcess::FlipUVs,
            ],
        )
        .map_err(|e| import_error(e.to_string()))?;

        if scene.flags & SCENE_FLAGS_INCOMPLETE != 0 {
            return Err(import_error("scene flagged incomplete".to_owned()));
        }

        let root = scene
            .root
            .clone()
            .ok_or_else(|| import_error("no root node".to_owned()))?;

        let loader = ModelLoader {
            scene,
            directory: {
                let mut directory = PathBuf::from(path);
                directory.pop();
                directory
            },
        };

        // Make every material's textures cache-resident up front, so mesh
        // building below only ever sees cache hits.
        for mat in &loader.scene.materials {
            loader.warm_cache(mat);
        }

        let mut meshes = Vec::with_capacity(loader.scene.meshes.len());
        for mesh in &loader.scene.meshes {
            meshes.push(loader.build_mesh(mesh)?);
        }

        let mut nodes = Vec::new();
        build_node(&RefCell::borrow(&root), None, &mut nodes);

        let model = Model { nodes, meshes };
        model.log_hierarchy(path);

        Ok(model)
    }

    /// Draws the whole hierarchy by delegating to the root's traversal.
    pub fn draw(&self, shader: &Shader) {
        node::draw(&self.nodes, 0, &self.meshes, shader);
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    fn log_hierarchy(&self, path: &Path) {
        info!("node hierarchy of {}:", path.display());
        self.log_node(0, 0);
    }

    fn log_node(&self, index: usize, depth: usize) {
        let node = &self.nodes[index];
        info!("{:indent$}{}", "", node.name, indent = depth * 4);

        for &child in &node.children {
            self.log_node(child, depth + 1);
        }
    }
}

impl ModelLoader {
    /// First pipeline pass: resolve every texture the material references,
    /// for the side effect of populating the cache. Failures are already
    /// logged and skipped by the resolution itself.
    fn warm_cache(&self, mat: &russimp::Material) {
        for role in [TextureRole::Diffuse, TextureRole::Specular] {
            let _ = self.resolve_textures(mat, role);
        }
    }

    fn build_mesh(&self, mesh: &russimp::Mesh) -> Result<Mesh> {
        let vertices = assemble_vertices(
            &mesh.vertices,
            &mesh.normals,
            mesh.texture_coords.get(0).and_then(|uvs| uvs.as_deref()),
        );

        let indices: Vec<u32> = mesh
            .faces
            .iter()
            .flat_map(|face| {
                // Triangulated on import
                debug_assert_eq!(face.0.len(), 3);
                face.0.iter().copied()
            })
            .collect();

        // Diffuse first, then specular; sampler counters at draw time rely
        // on this order.
        let mut textures = Vec::new();
        if let Some(mat) = self.scene.materials.get(mesh.material_index as usize) {
            textures.extend(self.resolve_textures(mat, TextureRole::Diffuse));
            textures.extend(self.resolve_textures(mat, TextureRole::Specular));
        }

        Mesh::new(vertices, indices, textures)
    }

    /// Texture list for `role` on `mat`, resolved through the process
    /// cache. A failed decode is logged and skipped; siblings keep loading.
    fn resolve_textures(&self, mat: &russimp::Material, role: TextureRole) -> Vec<Texture> {
        let refs = match mat.textures.get(&russimp::TextureType::from(role)) {
            Some(refs) => refs,
            None => return Vec::new(),
        };

        let mut out = Vec::with_capacity(refs.len());
        for tex in refs {
            match self.resolve_reference(&tex.path, role) {
                Ok(tex) => out.push(tex),
                Err(err) => warn!("skipping texture: {}", err),
            }
        }

        out
    }

    /// One material reference string → a cache-resident texture.
    ///
    /// `*<n>` references address the document's embedded texture table and
    /// are keyed by the embedded asset's internal filename; anything else
    /// is keyed by the literal reference string and read relative to the
    /// document's directory. The literal key means two documents naming
    /// the same relative path share one cache entry even when they live in
    /// different directories; see DESIGN.md.
    fn resolve_reference(&self, reference: &str, role: TextureRole) -> Result<Texture> {
        match embedded_index(reference) {
            Some(index) => {
                let embedded =
                    self.scene
                        .textures
                        .get(index)
                        .ok_or_else(|| Error::TextureDecode {
                            key: reference.to_owned(),
                            reason: format!("no embedded texture at index {}", index),
                        })?;

                let key = embedded.filename.clone();
                cache::get_or_insert_with(&key, || texture::from_embedded(embedded, &key, role))
            }
            None => cache::get_or_insert_with(reference, || {
                texture::from_file(&self.directory, reference, role)
            }),
        }
    }
}

/// Walks the document tree depth-first, appending to the arena so that a
/// node's world transform is final before any of its children compose with
/// it.
fn build_node(node: &russimp::Node, parent: Option<usize>, arena: &mut Vec<Node>) -> usize {
    let local = mat4_from_assimp(&node.transformation);
    let mesh_indices = node.meshes.iter().map(|&i| i as usize).collect();

    let index = node::push_node(arena, node.name.clone(), local, mesh_indices, parent);

    for child in &node.children {
        let child = RefCell::borrow(child);
        build_node(&child, Some(index), arena);
    }

    index
}

/// Assimp matrices are row-major; glam wants columns. Listing the rows as
/// columns transposes into the rendering convention.
fn mat4_from_assimp(m: &russimp::Matrix4x4) -> Mat4 {
    Mat4::from_cols_array(&[
        m.a1, m.b1, m.c1, m.d1, //
        m.a2, m.b2, m.c2, m.d2, //
        m.a3, m.b3, m.c3, m.d3, //
        m.a4, m.b4, m.c4, m.d4,
    ])
}

/// Zips the raw attribute streams into interleaved vertices with the
/// documented fallbacks: no normals → zero vectors, no UV channel → (0, 0).
fn assemble_vertices(
    positions: &[russimp::Vector3D],
    normals: &[russimp::Vector3D],
    uvs: Option<&[russimp::Vector3D]>,
) -> Vec<Vertex> {
    // Streams that may be absent become infinite `None` iterators so the
    // zip stays aligned with positions.
    let normals_iter: Box<dyn Iterator<Item = Option<&russimp::Vector3D>>> = if normals.is_empty() {
        Box::new(iter::repeat(None))
    } else {
        Box::new(normals.iter().map(Some))
    };

    let uvs_iter: Box<dyn Iterator<Item = Option<&russimp::Vector3D>>> = match uvs {
        Some(uvs) => Box::new(uvs.iter().map(Some)),
        None => Box::new(iter::repeat(None)),
    };

    izip!(positions.iter(), normals_iter, uvs_iter)
        .map(|(position, normal, uv)| Vertex {
            position: Vec3::new(position.x, position.y, position.z),
            normal: match normal {
                Some(normal) => Vec3::new(normal.x, normal.y, normal.z),
                None => Vec3::ZERO,
            },
            uv: match uv {
                Some(uv) => Vec2::new(uv.x, uv.y),
                None => Vec2::ZERO,
            },
        })
        .collect()
}

/// Embedded texture references use Assimp's `*<index>` sentinel.
fn embedded_index(reference: &str) -> Option<usize> {
    reference.strip_prefix('*')?.parse().ok()
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(x: f32, y: f32, z: f32) -> russimp::Vector3D {
        russimp::Vector3D { x, y, z }
    }

    #[test]
    fn assimp_matrix_is_transposed_into_columns() {
        let m = russimp::Matrix4x4 {
            a1: 1.0,
            a2: 0.0,
            a3: 0.0,
            a4: 4.0,
            b1: 0.0,
            b2: 1.0,
            b3: 0.0,
            b4: 5.0,
            c1: 0.0,
            c2: 0.0,
            c3: 1.0,
            c4: 6.0,
            d1: 0.0,
            d2: 0.0,
            d3: 0.0,
            d4: 1.0,
        };

        assert_eq!(
            mat4_from_assimp(&m),
            Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)),
        );
    }

    #[test]
    fn full_streams_zip_in_order() {
        let verts = assemble_vertices(
            &[v(1.0, 2.0, 3.0), v(4.0, 5.0, 6.0)],
            &[v(0.0, 1.0, 0.0), v(1.0, 0.0, 0.0)],
            Some(&[v(0.5, 0.25, 0.0), v(0.75, 1.0, 0.0)]),
        );

        assert_eq!(verts.len(), 2);
        assert_eq!(verts[0].position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(verts[0].normal, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(verts[1].uv, Vec2::new(0.75, 1.0));
    }

    #[test]
    fn missing_normals_become_zero_vectors() {
        let verts = assemble_vertices(
            &[v(1.0, 2.0, 3.0), v(4.0, 5.0, 6.0)],
            &[],
            Some(&[v(0.0, 0.0, 0.0), v(1.0, 1.0, 0.0)]),
        );

        assert_eq!(verts.len(), 2);
        for vert in &verts {
            assert_eq!(vert.normal, Vec3::ZERO);
        }
        assert_eq!(verts[1].position, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn missing_uv_channel_becomes_origin() {
        let verts = assemble_vertices(
            &[v(1.0, 2.0, 3.0)],
            &[v(0.0, 1.0, 0.0)],
            None,
        );

        assert_eq!(verts.len(), 1);
        assert_eq!(verts[0].uv, Vec2::ZERO);
        assert_eq!(verts[0].normal, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn embedded_references_parse_the_sentinel() {
        assert_eq!(embedded_index("*0"), Some(0));
        assert_eq!(embedded_index("*12"), Some(12));
        assert_eq!(embedded_index("wood.png"), None);
        assert_eq!(embedded_index("*wood"), None);
        assert_eq!(embedded_index(""), None);
    }
}
