//! # Barnes–Hut Octree for carriers
//!
//! Spatial index rebuilt from scratch at every Kick. Each node is bound to
//! one [`Octant`] and is in exactly one of three states:
//!
//! - **Empty**: no carrier, no children
//! - **Leaf**: holds exactly one carrier, no children
//! - **Internal**: holds no carrier, has up to 8 children
//!
//! Nodes live in a flat arena (`Vec<BHNode>`) and refer to their children
//! by arena index, so tearing the tree down between steps is a single
//! `clear()`.
//!
//! After [`BHTree::build`] every live carrier sits in exactly one leaf.
//!
//! ## Force traversal
//!
//! For a target carrier the traversal visits every node. When a node holds
//! a different carrier and `distance / max_side(node) < alpha`, the Coulomb
//! force of that carrier is accumulated. Children are always visited, so
//! `alpha` only gates which contributions count; it never prunes subtrees.

use std::fmt::Write as _;

use log::trace;

use crate::error::{Result, SimError};
use crate::simulation::forces::CoulombLaw;
use crate::simulation::octant::{Octant, OCTANT_NAMES};
use crate::simulation::states::{Carrier, NVec3};

/// Default bound on insertion depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A single octree node.
///
/// `carrier` is a slot into the carrier slice the tree was built from, not
/// the carrier's population index.
#[derive(Debug, Clone)]
pub struct BHNode {
    pub octant: Octant,
    pub carrier: Option<usize>,
    pub children: [Option<usize>; 8], // indices into BHTree::nodes
    pub depth: usize,
    pub branch: i8, // code within the parent, -1 for the root
}

impl BHNode {
    fn new(octant: Octant, depth: usize, branch: i8) -> Self {
        Self {
            octant,
            carrier: None,
            children: [None; 8],
            depth,
            branch,
        }
    }

    /// A node is external iff it has no children
    pub fn is_external(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }

    pub fn is_empty(&self) -> bool {
        self.carrier.is_none() && self.is_external()
    }

    /// Diagnostic identifier `D{depth}BD{branch}`
    pub fn id(&self) -> String {
        let branch = if self.branch < 0 {
            "Head"
        } else {
            OCTANT_NAMES[self.branch as usize]
        };
        format!("D{}BD{}", self.depth, branch)
    }
}

/// Arena-backed octree over a slice of carriers.
pub struct BHTree {
    pub nodes: Vec<BHNode>,
    pub root: usize,
    max_depth: usize,
}

impl BHTree {
    /// Empty tree covering `domain`
    pub fn new(domain: Octant, max_depth: usize) -> Self {
        Self {
            nodes: vec![BHNode::new(domain, 0, -1)],
            root: 0,
            max_depth,
        }
    }

    /// Build a tree over `carriers`.
    ///
    /// The root octant is `domain` grown to enclose every carrier, so
    /// carriers that drifted slightly outside the device box are still
    /// indexed.
    ///
    /// # Parameters
    /// - `carriers` : carriers to index; nodes refer back to them by slot
    /// - `domain`   : nominal root region (usually the device box)
    /// - `max_depth`: insertion depth bound
    ///
    /// # Returns
    /// The tree, or [`SimError::TreeDepthExceeded`] when two carriers are
    /// too close to be separated within `max_depth` subdivisions.
    pub fn build(carriers: &[Carrier], domain: &Octant, max_depth: usize) -> Result<Self> {
        let root_octant = Octant::enclosing(domain, carriers.iter().map(|c| &c.x));
        let mut tree = BHTree::new(root_octant, max_depth);

        for slot in 0..carriers.len() {
            tree.insert(slot, carriers)?;
        }

        trace!("octree built: {} carriers, {} nodes", carriers.len(), tree.nodes.len());
        Ok(tree)
    }

    /// Insert carrier `slot` of `carriers`.
    ///
    /// Walks down iteratively:
    /// - Empty node: store the carrier, done.
    /// - Internal node: step into the child the carrier's octant code
    ///   selects, creating it when absent.
    /// - Leaf: push the resident carrier one level down into its own child,
    ///   which turns this node internal, then continue the walk. If both
    ///   carriers share a code, the next iteration meets the resident as a
    ///   leaf again one level deeper and splits again.
    pub fn insert(&mut self, slot: usize, carriers: &[Carrier]) -> Result<()> {
        let pos = carriers[slot].x;

        if !self.nodes[self.root].octant.contains(&pos) {
            return Err(SimError::OutsideTreeDomain { index: carriers[slot].index });
        }

        let mut node_idx = self.root;

        loop {
            let node = &self.nodes[node_idx];

            if node.is_empty() {
                self.nodes[node_idx].carrier = Some(slot);
                return Ok(());
            }

            if node.depth >= self.max_depth {
                return Err(SimError::TreeDepthExceeded {
                    index: carriers[slot].index,
                    depth: node.depth,
                });
            }

            // Leaf: move the resident down before descending
            if let Some(resident) = node.carrier {
                let code = node.octant.octant_code(&carriers[resident].x);
                let child = self.child_or_create(node_idx, code);
                self.nodes[child].carrier = Some(resident);
                self.nodes[node_idx].carrier = None;
            }

            let code = self.nodes[node_idx].octant.octant_code(&pos);
            node_idx = self.child_or_create(node_idx, code);
        }
    }

    /// Accumulate the Coulomb force on carrier `slot` from the tree.
    ///
    /// # Parameters
    /// - `slot`    : target carrier (slot in `carriers`)
    /// - `carriers`: the slice the tree was built from
    /// - `law`     : pairwise Coulomb law with screening
    /// - `alpha`   : distance / node-size acceptance threshold
    pub fn force_on_carrier(&self, slot: usize, carriers: &[Carrier], law: &CoulombLaw, alpha: f64) -> NVec3 {
        let target = &carriers[slot];
        let mut force = NVec3::zeros();

        self.visit(|node| {
            let Some(other) = node.carrier else { return };
            if other == slot {
                return;
            }
            let source = &carriers[other];
            let dist = (source.x - target.x).norm();
            if dist / node.octant.max_side() < alpha {
                force += law.force(target, source);
            }
        });

        force
    }

    /// Depth-first walk over every node reachable from the root
    pub fn visit<F: FnMut(&BHNode)>(&self, mut f: F) {
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            f(node);
            // reversed so children pop in code order
            stack.extend(node.children.iter().rev().flatten());
        }
    }

    /// Slots held by leaves, in traversal order
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.visit(|node| {
            if node.is_external() {
                if let Some(slot) = node.carrier {
                    out.push(slot);
                }
            }
        });
        out
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn root_octant(&self) -> &Octant {
        &self.nodes[self.root].octant
    }

    /// Indented textual dump, one node per line
    pub fn dump(&self, carriers: &[Carrier]) -> String {
        let mut out = String::new();
        self.visit(|node| {
            let indent = "  ".repeat(node.depth);
            let holder = match node.carrier {
                Some(slot) => carriers[slot].id(),
                None => String::from("-"),
            };
            let c = node.octant.center();
            let _ = writeln!(out, "{indent}{} {} center=({:.4}, {:.4}, {:.4})", node.id(), holder, c.x, c.y, c.z);
        });
        out
    }

    // helpers ==============================================================================

    fn child_or_create(&mut self, node_idx: usize, code: usize) -> usize {
        if let Some(child) = self.nodes[node_idx].children[code] {
            return child;
        }
        let parent = &self.nodes[node_idx];
        let child = BHNode::new(parent.octant.child(code), parent.depth + 1, code as i8);
        let child_idx = self.nodes.len();
        self.nodes.push(child);
        self.nodes[node_idx].children[code] = Some(child_idx);
        child_idx
    }
}
