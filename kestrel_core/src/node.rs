use glam::Mat4;

use crate::mesh::Mesh;
use crate::shader::Shader;

/// One element of a model's node arena.
///
/// `transform` is the node's world transform: the parent's world transform
/// with this node's local transform already folded in at build time. Draw
/// never recomputes it.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Mat4,
    /// Indices into the owning model's mesh list.
    pub mesh_indices: Vec<usize>,
    /// Children in document order, as arena indices.
    pub children: Vec<usize>,
    /// Arena index of the parent. Diagnostics only, never consulted for
    /// transforms or ownership.
    pub parent: Option<usize>,
}

/// Appends the node described by `local` under `parent`, returning its
/// arena index.
///
/// The root (no parent) keeps its local transform as world transform; any
/// other node multiplies the parent's already-final world transform with
/// its own local one, so children must be pushed after their parent. The
/// parent's child list is extended here, which keeps sibling order equal
/// to insertion order.
pub(crate) fn push_node(
    arena: &mut Vec<Node>,
    name: String,
    local: Mat4,
    mesh_indices: Vec<usize>,
    parent: Option<usize>,
) -> usize {
    let transform = match parent {
        Some(p) => arena[p].transform * local,
        None => local,
    };

    let index = arena.len();
    arena.push(Node {
        name,
        transform,
        mesh_indices,
        children: Vec::new(),
        parent,
    });

    if let Some(p) = parent {
        arena[p].children.push(index);
    }

    index
}

/// Draws the meshes referenced by `index` with its baked transform, then
/// its children in insertion order. Read-only traversal.
pub(crate) fn draw(arena: &[Node], index: usize, meshes: &[Mesh], shader: &Shader) {
    let node = &arena[index];

    for &mesh_index in &node.mesh_indices {
        meshes[mesh_index].draw(shader, node.transform);
    }

    for &child in &node.children {
        draw(arena, child, meshes, shader);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use glam::Vec3;

    fn push(arena: &mut Vec<Node>, local: Mat4, parent: Option<usize>) -> usize {
        push_node(arena, String::from("n"), local, Vec::new(), parent)
    }

    #[test]
    fn root_world_transform_is_its_local_transform() {
        let mut arena = Vec::new();
        let local = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

        let root = push(&mut arena, local, None);

        assert_eq!(arena[root].transform, local);
        assert_eq!(arena[root].parent, None);
    }

    #[test]
    fn child_world_transform_composes_parent_then_local() {
        let mut arena = Vec::new();

        let root = push(&mut arena, Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)), None);
        let child = push(
            &mut arena,
            Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            Some(root),
        );
        let grandchild = push(
            &mut arena,
            Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)),
            Some(child),
        );

        assert_eq!(
            arena[child].transform,
            Mat4::from_translation(Vec3::new(1.0, 2.0, 0.0)),
        );
        assert_eq!(
            arena[grandchild].transform,
            arena[child].transform * Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
    }

    #[test]
    fn grouping_node_without_meshes_still_carries_its_transform() {
        let mut arena = Vec::new();

        let root = push(&mut arena, Mat4::IDENTITY, None);
        // A pivot with no meshes and no children of its own yet.
        let pivot = push(
            &mut arena,
            Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)),
            Some(root),
        );
        let leaf = push(
            &mut arena,
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
            Some(pivot),
        );

        assert!(arena[pivot].mesh_indices.is_empty());
        assert_eq!(
            arena[leaf].transform,
            Mat4::from_translation(Vec3::new(1.0, 5.0, 0.0)),
        );
    }

    #[test]
    fn parent_back_references_match_child_lists() {
        let mut arena = Vec::new();

        let root = push(&mut arena, Mat4::IDENTITY, None);
        let a = push(&mut arena, Mat4::IDENTITY, Some(root));
        let b = push(&mut arena, Mat4::IDENTITY, Some(root));
        let c = push(&mut arena, Mat4::IDENTITY, Some(a));

        assert_eq!(arena[root].children, vec![a, b]);
        assert_eq!(arena[a].children, vec![c]);

        for (index, node) in arena.iter().enumerate() {
            for &child in &node.children {
                assert_eq!(arena[child].parent, Some(index));
            }
        }
    }
}
