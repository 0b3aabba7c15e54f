//! Barnes-Hut quadtree for O(n log n) gravity between nodes.
//!
//! Distant groups of bodies are replaced by their center of mass, so each
//! body only visits the cells that are too close to approximate.

use egui::{Pos2, Vec2};

/// Below this depth bodies keep splitting; past it they share a leaf.
const MAX_DEPTH: u32 = 32;

/// Distance floor so coincident bodies do not produce infinite forces
const MIN_DISTANCE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub index: usize,
    pub pos: Pos2,
    pub mass: f32,
}

#[derive(Debug, Default)]
pub enum QuadNode {
    #[default]
    Empty,
    /// Normally one body; several only when they pile up at MAX_DEPTH
    Leaf(Vec<Body>),
    Internal {
        center_of_mass: Pos2,
        total_mass: f32,
        count: u32,
        /// NW, NE, SW, SE
        children: Box<[QuadNode; 4]>,
    },
}

/// Square cell of the tree
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    pub min: Pos2,
    pub size: f32,
}

impl Cell {
    fn center(&self) -> Pos2 {
        self.min + Vec2::splat(self.size / 2.0)
    }

    /// 0=NW, 1=NE, 2=SW, 3=SE
    fn quadrant(&self, pos: Pos2) -> usize {
        let c = self.center();
        (pos.x >= c.x) as usize + 2 * (pos.y >= c.y) as usize
    }

    fn child(&self, quadrant: usize) -> Cell {
        let half = self.size / 2.0;
        let dx = if quadrant % 2 == 1 { half } else { 0.0 };
        let dy = if quadrant >= 2 { half } else { 0.0 };
        Cell {
            min: self.min + Vec2::new(dx, dy),
            size: half,
        }
    }
}

pub struct Quadtree {
    pub root: QuadNode,
    pub cell: Cell,
    /// Opening angle: a cell is approximated when size / distance < theta
    pub theta: f32,
}

impl Quadtree {
    pub fn build(bodies: &[Body], theta: f32) -> Self {
        let mut min = Pos2::new(f32::MAX, f32::MAX);
        let mut max = Pos2::new(f32::MIN, f32::MIN);
        for b in bodies {
            min = min.min(b.pos);
            max = max.max(b.pos);
        }

        let cell = if bodies.is_empty() {
            Cell { min: Pos2::ZERO, size: 0.0 }
        } else {
            // Pad a little so bodies on the edge land strictly inside
            let size = (max.x - min.x).max(max.y - min.y) + 2.0;
            Cell {
                min: min - Vec2::splat(1.0),
                size,
            }
        };

        let mut tree = Self {
            root: QuadNode::Empty,
            cell,
            theta,
        };
        for &body in bodies {
            tree.root = Self::insert(std::mem::take(&mut tree.root), body, cell, 0);
        }
        tree
    }

    fn insert(node: QuadNode, body: Body, cell: Cell, depth: u32) -> QuadNode {
        match node {
            QuadNode::Empty => QuadNode::Leaf(vec![body]),

            QuadNode::Leaf(mut bodies) if depth >= MAX_DEPTH => {
                bodies.push(body);
                QuadNode::Leaf(bodies)
            }

            QuadNode::Leaf(bodies) => {
                let mut split = QuadNode::Internal {
                    center_of_mass: Pos2::ZERO,
                    total_mass: 0.0,
                    count: 0,
                    children: Box::default(),
                };
                for existing in bodies {
                    split = Self::insert(split, existing, cell, depth);
                }
                Self::insert(split, body, cell, depth)
            }

            QuadNode::Internal {
                center_of_mass,
                total_mass,
                count,
                mut children,
            } => {
                let q = cell.quadrant(body.pos);
                children[q] = Self::insert(std::mem::take(&mut children[q]), body, cell.child(q), depth + 1);

                let new_total = total_mass + body.mass;
                let com = center_of_mass.to_vec2() * (total_mass / new_total)
                    + body.pos.to_vec2() * (body.mass / new_total);

                QuadNode::Internal {
                    center_of_mass: com.to_pos2(),
                    total_mass: new_total,
                    count: count + 1,
                    children,
                }
            }
        }
    }

    /// Gravity acting on `body` from every other body in the tree.
    ///
    /// Magnitude is `g * m1 * m2 / d^2` along the line toward the other mass,
    /// so a negative `g` pushes bodies apart.
    pub fn force_on(&self, body: &Body, g: f32) -> Vec2 {
        self.force_from(&self.root, self.cell, body, g)
    }

    fn force_from(&self, node: &QuadNode, cell: Cell, body: &Body, g: f32) -> Vec2 {
        match node {
            QuadNode::Empty => Vec2::ZERO,

            QuadNode::Leaf(bodies) => bodies
                .iter()
                .filter(|other| other.index != body.index)
                .map(|other| pairwise(body, other.pos, other.mass, g, other.index))
                .fold(Vec2::ZERO, |acc, f| acc + f),

            QuadNode::Internal {
                center_of_mass,
                total_mass,
                children,
                ..
            } => {
                let distance = (*center_of_mass - body.pos).length();
                if distance > 0.0 && cell.size / distance < self.theta {
                    let delta = *center_of_mass - body.pos;
                    delta / distance * (g * body.mass * total_mass / (distance * distance))
                } else {
                    children
                        .iter()
                        .enumerate()
                        .map(|(q, child)| self.force_from(child, cell.child(q), body, g))
                        .fold(Vec2::ZERO, |acc, f| acc + f)
                }
            }
        }
    }
}

fn pairwise(body: &Body, other_pos: Pos2, other_mass: f32, g: f32, other_index: usize) -> Vec2 {
    let mut delta = other_pos - body.pos;
    let mut distance = delta.length();
    if distance < MIN_DISTANCE {
        // Coincident: split them along x, lower index to the left
        distance = MIN_DISTANCE;
        let side = if body.index < other_index { 1.0 } else { -1.0 };
        delta = Vec2::new(side * MIN_DISTANCE, 0.0);
    }
    delta / distance * (g * body.mass * other_mass / (distance * distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(index: usize, x: f32, y: f32) -> Body {
        Body {
            index,
            pos: Pos2::new(x, y),
            mass: 1.0,
        }
    }

    #[test]
    fn build_counts_all_bodies() {
        let bodies = vec![
            body(0, 0.0, 0.0),
            body(1, 100.0, 0.0),
            body(2, 0.0, 100.0),
            body(3, 100.0, 100.0),
        ];

        let tree = Quadtree::build(&bodies, 0.5);

        match &tree.root {
            QuadNode::Internal { count, total_mass, .. } => {
                assert_eq!(*count, 4);
                assert_eq!(*total_mass, 4.0);
            }
            other => panic!("Expected internal node, got {:?}", other),
        }
    }

    #[test]
    fn negative_constant_repels() {
        let bodies = vec![body(0, 0.0, 0.0), body(1, 100.0, 0.0)];
        let tree = Quadtree::build(&bodies, 0.5);

        let force = tree.force_on(&bodies[0], -2000.0);
        assert!(force.x < 0.0, "Force should push left: {:?}", force);
        assert!((force.x + 0.2).abs() < 1e-4, "Expected -2000/100^2: {:?}", force);
    }

    #[test]
    fn lone_body_feels_nothing() {
        let bodies = vec![body(0, 5.0, 5.0)];
        let tree = Quadtree::build(&bodies, 0.5);
        assert_eq!(tree.force_on(&bodies[0], -2000.0), Vec2::ZERO);
    }

    #[test]
    fn coincident_bodies_are_pushed_apart() {
        let bodies = vec![body(0, 10.0, 10.0), body(1, 10.0, 10.0)];
        let tree = Quadtree::build(&bodies, 0.5);

        let left = tree.force_on(&bodies[0], -2000.0);
        let right = tree.force_on(&bodies[1], -2000.0);
        assert!(left.x < 0.0 && right.x > 0.0, "{:?} {:?}", left, right);
        assert!(left.x.is_finite());
    }

    #[test]
    fn approximation_stays_close_to_exact_sum() {
        let mut bodies = vec![body(0, 0.0, 0.0)];
        for i in 1..20 {
            bodies.push(body(i, 1000.0 + (i % 5) as f32 * 10.0, (i / 5) as f32 * 10.0));
        }
        let tree = Quadtree::build(&bodies, 0.5);

        let approx = tree.force_on(&bodies[0], -2000.0);
        let exact = bodies[1..]
            .iter()
            .map(|b| pairwise(&bodies[0], b.pos, b.mass, -2000.0, b.index))
            .fold(Vec2::ZERO, |acc, f| acc + f);

        assert!((approx - exact).length() < exact.length() * 0.05);
    }
}
