use optics_types::Transform;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    pub struct NodeId;
}

/// One placed entity: its payload, its parent link and both poses.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub data: T,
    parent: Option<NodeId>,
    relative: Transform,
    absolute: Transform,
}

impl<T> Node<T> {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Offset from the parent, or the world pose for a root.
    pub fn relative(&self) -> &Transform {
        &self.relative
    }

    pub fn absolute(&self) -> &Transform {
        &self.absolute
    }
}

/// Arena of placed nodes with one-directional parent links.
///
/// Children are found through an index kept beside the arena. A node's
/// absolute pose is always `parent.absolute ∘ relative`; nodes cannot be
/// re-parented, so the graph stays a forest.
#[derive(Debug, Clone)]
pub struct PlacementGraph<T> {
    nodes: SlotMap<NodeId, Node<T>>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
}

impl<T> Default for PlacementGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PlacementGraph<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|n| &mut n.data)
    }

    /// Insert a node with no parent at world pose `absolute`.
    pub fn insert_root(&mut self, data: T, absolute: Transform) -> NodeId {
        let id = self.nodes.insert(Node {
            data,
            parent: None,
            relative: absolute,
            absolute,
        });
        self.children.insert(id, Vec::new());
        id
    }

    /// Attach a node under `parent` at offset `relative`. `None` when the
    /// parent is not in this graph.
    pub fn attach(&mut self, parent: NodeId, data: T, relative: Transform) -> Option<NodeId> {
        let absolute = self.nodes.get(parent)?.absolute.compose(&relative);
        let id = self.nodes.insert(Node {
            data,
            parent: Some(parent),
            relative,
            absolute,
        });
        self.children.insert(id, Vec::new());
        self.children.get_mut(parent)?.push(id);
        Some(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes below `id` in pre-order, siblings in attachment order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Pose of `id` expressed in the frame of its ancestor `ancestor`.
    pub fn pose_in(&self, id: NodeId, ancestor: NodeId) -> Option<Transform> {
        let node = self.nodes.get(id)?;
        let frame = self.nodes.get(ancestor)?;
        Some(node.absolute.relative_to(&frame.absolute))
    }

    /// Replace the stored offset of `id` and recompute its subtree.
    /// Returns `false` when `id` is unknown.
    pub fn set_relative(&mut self, id: NodeId, relative: Transform) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.relative = relative;
        self.recompute_from(id);
        true
    }

    /// Re-derive absolute poses of `id` and everything below it from the
    /// stored relative chain.
    pub fn recompute_from(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let parent_abs = self
                .nodes
                .get(current)
                .and_then(|n| n.parent)
                .and_then(|p| self.nodes.get(p))
                .map(|p| p.absolute);
            if let Some(node) = self.nodes.get_mut(current) {
                node.absolute = match parent_abs {
                    Some(parent) => parent.compose(&node.relative),
                    None => node.relative,
                };
            }
            stack.extend(self.children(current).iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_composes_with_parent() {
        let mut g = PlacementGraph::new();
        let root = g.insert_root("plate", Transform::planar(10.0, 0.0, 0.0, 90.0));
        let child = g
            .attach(root, "mirror", Transform::from_translation(5.0, 0.0, 0.0))
            .unwrap();
        let t = g.get(child).unwrap().absolute().translation();
        assert!((t[0] - 10.0).abs() < 1e-12);
        assert!((t[1] - 5.0).abs() < 1e-12);
        assert_eq!(g.get(child).unwrap().parent(), Some(root));
    }

    #[test]
    fn attach_to_unknown_parent_fails() {
        let mut g: PlacementGraph<&str> = PlacementGraph::new();
        assert!(g.attach(NodeId::default(), "orphan", Transform::identity()).is_none());
        assert!(g.is_empty());
    }

    #[test]
    fn moving_root_recomputes_descendants() {
        let mut g = PlacementGraph::new();
        let root = g.insert_root(0, Transform::identity());
        let a = g.attach(root, 1, Transform::from_translation(1.0, 0.0, 0.0)).unwrap();
        let b = g.attach(a, 2, Transform::planar(0.0, 2.0, 0.0, 45.0)).unwrap();

        assert!(g.set_relative(root, Transform::from_translation(0.0, 0.0, 7.0)));
        let expected = Transform::from_translation(0.0, 0.0, 7.0)
            .compose(&Transform::from_translation(1.0, 0.0, 0.0))
            .compose(&Transform::planar(0.0, 2.0, 0.0, 45.0));
        assert_eq!(*g.get(b).unwrap().absolute(), expected);
    }

    #[test]
    fn descendants_are_preorder() {
        let mut g = PlacementGraph::new();
        let root = g.insert_root("r", Transform::identity());
        let a = g.attach(root, "a", Transform::identity()).unwrap();
        let a1 = g.attach(a, "a1", Transform::identity()).unwrap();
        let b = g.attach(root, "b", Transform::identity()).unwrap();
        assert_eq!(g.descendants(root), vec![a, a1, b]);
        assert_eq!(g.children(root), &[a, b]);
    }

    #[test]
    fn pose_in_ancestor_frame() {
        let mut g = PlacementGraph::new();
        let root = g.insert_root((), Transform::planar(3.0, 4.0, 0.0, 30.0));
        let child = g.attach(root, (), Transform::planar(1.0, 1.0, 0.0, 10.0)).unwrap();
        let local = g.pose_in(child, root).unwrap();
        assert!(local.approx_eq(&Transform::planar(1.0, 1.0, 0.0, 10.0), 1e-12));
    }
}
