//! Arena holding every widget of an application.

use fenestra_core::{alloc::sparse_set::SparseSet, geometry::Size, math::IVec2};

use crate::{
    widget::{
        Notification, SubWidgetData, SubWidgetFlags, WidgetBehavior, WidgetId, WidgetKind,
        WidgetNode, WidgetRef,
    },
    window::WindowId,
};

/// Widget storage.
///
/// Parent and top-level links are plain handles; removing a widget removes its subtree and
/// detaches it from its parent, so no handle ever keeps a node alive.
#[derive(Default)]
pub struct WidgetTree {
    nodes: SparseSet<WidgetNode>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn get(&self, id: WidgetId) -> Option<WidgetRef<'_>> {
        self.nodes.get(id.0).map(|node| WidgetRef {
            handle: id,
            node,
            tree: self,
        })
    }

    pub(crate) fn node(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.nodes.get_mut(id.0)
    }

    pub(crate) fn insert_top_level(
        &mut self,
        window: WindowId,
        size: Size<u32>,
        behavior: Box<dyn WidgetBehavior>,
    ) -> WidgetId {
        let id = WidgetId(self.nodes.push(WidgetNode {
            id: 0,
            name: None,
            size,
            visible: true,
            children: Vec::new(),
            top_level: None,
            window,
            kind: WidgetKind::TopLevel { window },
            behavior: Some(behavior),
            deferred: Vec::new(),
        }));
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.top_level = Some(id);
        }
        id
    }

    /// Appends a sub-widget to `parent`'s children, in front of its siblings.
    pub(crate) fn insert_sub(
        &mut self,
        parent: WidgetId,
        behavior: Box<dyn WidgetBehavior>,
    ) -> Option<WidgetId> {
        let (top_level, window) = {
            let parent_node = self.nodes.get(parent.0)?;
            (parent_node.top_level, parent_node.window)
        };
        let id = WidgetId(self.nodes.push(WidgetNode {
            id: 0,
            name: None,
            size: Size::default(),
            visible: true,
            children: Vec::new(),
            top_level,
            window,
            kind: WidgetKind::Sub(SubWidgetData {
                parent,
                absolute_pos: IVec2::ZERO,
                margin: IVec2::ZERO,
                flags: SubWidgetFlags::empty(),
                viewport_scale_factor: 0.0,
            }),
            behavior: Some(behavior),
            deferred: Vec::new(),
        }));
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        Some(id)
    }

    /// Removes `id` and its subtree, returning the removed handles in pre-order.
    pub(crate) fn remove(&mut self, id: WidgetId) -> Vec<WidgetId> {
        let Some(node) = self.nodes.get(id.0) else {
            return Vec::new();
        };
        if let Some(parent) = node.sub().map(|sub| sub.parent)
            && let Some(parent_node) = self.nodes.get_mut(parent.0)
        {
            parent_node.children.retain(|child| *child != id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current.0) {
                removed.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        removed
    }

    pub(crate) fn take_behavior(&mut self, id: WidgetId) -> Option<Box<dyn WidgetBehavior>> {
        self.nodes.get_mut(id.0)?.behavior.take()
    }

    /// Puts a behavior back; it is dropped if the widget was removed meanwhile.
    pub(crate) fn restore_behavior(&mut self, id: WidgetId, behavior: Box<dyn WidgetBehavior>) {
        if let Some(node) = self.nodes.get_mut(id.0)
            && node.behavior.is_none()
        {
            node.behavior = Some(behavior);
        }
    }

    /// Queues `notification` until the widget's running hook returns.
    ///
    /// Returns `false` when the widget is gone.
    pub(crate) fn defer(&mut self, id: WidgetId, notification: Notification) -> bool {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return false;
        };
        node.deferred.push(notification);
        true
    }

    pub(crate) fn pop_deferred(&mut self, id: WidgetId) -> Option<Notification> {
        let node = self.nodes.get_mut(id.0)?;
        if node.deferred.is_empty() {
            return None;
        }
        Some(node.deferred.remove(0))
    }

    pub(crate) fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.nodes
            .get(id.0)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Moves a sub-widget to the end of its parent's list: painted last, offered events first.
    pub(crate) fn to_front(&mut self, id: WidgetId) -> bool {
        self.reorder(id, |children, index| {
            let child = children.remove(index);
            children.push(child);
        })
    }

    /// Moves a sub-widget to the start of its parent's list.
    pub(crate) fn to_bottom(&mut self, id: WidgetId) -> bool {
        self.reorder(id, |children, index| {
            let child = children.remove(index);
            children.insert(0, child);
        })
    }

    fn reorder(&mut self, id: WidgetId, apply: impl FnOnce(&mut Vec<WidgetId>, usize)) -> bool {
        let Some(parent) = self.nodes.get(id.0).and_then(|n| n.sub()).map(|s| s.parent) else {
            return false;
        };
        let Some(parent_node) = self.nodes.get_mut(parent.0) else {
            return false;
        };
        let Some(index) = parent_node.children.iter().position(|child| *child == id) else {
            return false;
        };
        apply(&mut parent_node.children, index);
        true
    }

    /// First widget below `root` (inclusive) with numeric id `id`, depth first in paint order.
    pub fn find_by_id(&self, root: WidgetId, id: u32) -> Option<WidgetId> {
        let node = self.nodes.get(root.0)?;
        if node.id == id {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|child| self.find_by_id(*child, id))
    }

    /// First widget below `root` (inclusive) named `name`.
    pub fn find_by_name(&self, root: WidgetId, name: &str) -> Option<WidgetId> {
        let node = self.nodes.get(root.0)?;
        if node.name.as_deref() == Some(name) {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|child| self.find_by_name(*child, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::NoBehavior;
    use fenestra_core::alloc::sparse_set::IndexSlot;

    fn window() -> WindowId {
        WindowId(IndexSlot::new(0, 0))
    }

    fn tree_with_children(count: usize) -> (WidgetTree, WidgetId, Vec<WidgetId>) {
        let mut tree = WidgetTree::new();
        let root = tree.insert_top_level(window(), Size::new(100, 100), Box::new(NoBehavior));
        let children = (0..count)
            .filter_map(|_| tree.insert_sub(root, Box::new(NoBehavior)))
            .collect();
        (tree, root, children)
    }

    #[test]
    fn insertion_order_is_paint_order() {
        let (tree, root, children) = tree_with_children(3);
        assert_eq!(tree.children(root), children);
        for child in &children {
            let node = tree.get(*child).map(|w| (w.parent(), w.top_level()));
            assert_eq!(node, Some((Some(root), Some(root))));
        }
    }

    #[test]
    fn to_front_and_to_bottom_reorder_siblings() {
        let (mut tree, root, c) = tree_with_children(3);

        assert!(tree.to_front(c[0]));
        assert_eq!(tree.children(root), vec![c[1], c[2], c[0]]);

        assert!(tree.to_bottom(c[2]));
        assert_eq!(tree.children(root), vec![c[2], c[1], c[0]]);

        assert!(!tree.to_front(root));
    }

    #[test]
    fn remove_takes_subtree_and_detaches() {
        let (mut tree, root, c) = tree_with_children(2);
        let grandchild = tree.insert_sub(c[0], Box::new(NoBehavior));
        assert!(grandchild.is_some());

        let removed = tree.remove(c[0]);
        assert_eq!(removed.len(), 2);
        assert_eq!(tree.children(root), vec![c[1]]);
        assert!(grandchild.is_some_and(|g| !tree.contains(g)));
        assert!(tree.get(c[0]).is_none());
        assert!(tree.insert_sub(c[0], Box::new(NoBehavior)).is_none());
    }

    #[test]
    fn deferred_notifications_pop_oldest_first() {
        let (mut tree, root, c) = tree_with_children(1);
        let request = |w| Notification::SizeRequest(Size::new(w, 10));
        assert!(tree.defer(root, request(1)));
        assert!(tree.defer(root, request(2)));
        assert_eq!(tree.pop_deferred(root), Some(request(1)));
        assert_eq!(tree.pop_deferred(root), Some(request(2)));
        assert_eq!(tree.pop_deferred(root), None);

        tree.remove(c[0]);
        assert!(!tree.defer(c[0], request(3)));
    }

    #[test]
    fn find_by_id_returns_first_match() {
        let (mut tree, root, c) = tree_with_children(2);
        for child in &c {
            if let Some(node) = tree.node_mut(*child) {
                node.id = 7;
            }
        }
        assert_eq!(tree.find_by_id(root, 7), Some(c[0]));
        assert_eq!(tree.find_by_id(root, 8), None);
    }
}
