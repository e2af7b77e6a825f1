// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over the assets in a `PowerTopology`.

use petgraph::graph::DiGraph;

use crate::Asset;

/// An iterator over the assets in a `PowerTopology`.
pub struct Assets<'a> {
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Node<Asset>>,
}

impl<'a> Iterator for Assets<'a> {
    type Item = &'a Asset;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|n| &n.weight)
    }
}

/// An iterator over the parents or the children of an asset in a
/// `PowerTopology`.
pub struct Neighbors<'a> {
    pub(crate) graph: &'a DiGraph<Asset, ()>,
    pub(crate) iter: petgraph::graph::Neighbors<'a, ()>,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = &'a Asset;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}
