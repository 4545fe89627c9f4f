/// Adjacency of one graph node
///
/// `layers[0]` is the base layer; the node exists on layers `0..=max_layer()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) layers: Vec<Vec<usize>>,
}

impl Node {
    pub(crate) fn new(max_layer: usize) -> Self {
        Self {
            layers: vec![Vec::new(); max_layer + 1],
        }
    }

    pub(crate) fn max_layer(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    pub(crate) fn neighbors(&self, layer: usize) -> &[usize] {
        self.layers.get(layer).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Add an edge, ignoring duplicates
    pub(crate) fn add_neighbor(&mut self, layer: usize, neighbor: usize) {
        if let Some(neighbors) = self.layers.get_mut(layer) {
            if !neighbors.contains(&neighbor) {
                neighbors.push(neighbor);
            }
        }
    }

    pub(crate) fn set_neighbors(&mut self, layer: usize, neighbors: Vec<usize>) {
        if let Some(slot) = self.layers.get_mut(layer) {
            *slot = neighbors;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_layers() {
        let node = Node::new(3);
        assert_eq!(node.layers.len(), 4);
        assert_eq!(node.max_layer(), 3);
        assert!(node.neighbors(7).is_empty());
    }

    #[test]
    fn test_no_duplicate_neighbors() {
        let mut node = Node::new(0);
        node.add_neighbor(0, 1);
        node.add_neighbor(0, 1);
        node.add_neighbor(1, 2); // layer absent, ignored
        assert_eq!(node.neighbors(0), &[1]);
        assert!(node.neighbors(1).is_empty());
    }

    #[test]
    fn test_set_neighbors() {
        let mut node = Node::new(1);
        node.add_neighbor(1, 4);
        node.set_neighbors(1, vec![5, 6]);
        assert_eq!(node.neighbors(1), &[5, 6]);
    }
}
