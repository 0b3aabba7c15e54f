//! Force-directed graph layout algorithm.
//!
//! Each step combines:
//! - Gravity between all nodes (Barnes-Hut, negative constant = repulsion)
//! - Springs along edges toward a rest length
//! - Central gravity of constant strength toward the origin
//! - Damped velocity integration, clamped to a maximum speed

use super::quadtree::{Body, Quadtree};
use super::types::GraphState;
use egui::{Pos2, Vec2};

/// Force-directed layout parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceLayout {
    /// Is the simulation allowed to move nodes at all?
    pub enabled: bool,
    /// Gravity between nodes; negative values repel
    pub gravitational_constant: f32,
    /// Pull toward the origin, independent of distance
    pub central_gravity: f32,
    /// Rest length of an edge
    pub spring_length: f32,
    /// Stiffness of an edge
    pub spring_constant: f32,
    /// Fraction of velocity lost to friction each step
    pub damping: f32,
    /// Barnes-Hut opening angle
    pub theta: f32,
    /// Per-axis speed cap
    pub max_velocity: f32,
    /// Speed below which the layout counts as settled
    pub min_velocity: f32,
    /// Integration step
    pub timestep: f32,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            enabled: true,
            gravitational_constant: -2000.0,
            central_gravity: 0.3,
            spring_length: 95.0,
            spring_constant: 0.04,
            damping: 0.09,
            theta: 0.5,
            max_velocity: 50.0,
            min_velocity: 0.1,
            timestep: 0.5,
        }
    }
}

impl ForceLayout {
    /// Run one iteration of the force simulation.
    /// Returns the fastest node speed after the step.
    pub fn step(&self, state: &mut GraphState) -> f32 {
        if !self.enabled || state.positions.is_empty() {
            return 0.0;
        }

        let forces = self.forces(state);

        let mut max_speed: f32 = 0.0;
        for (i, force) in forces.into_iter().enumerate() {
            if state.dragged_node == Some(i) {
                state.velocities[i] = Vec2::ZERO;
                continue;
            }

            // Unit mass: acceleration is force minus friction
            let vel = &mut state.velocities[i];
            let acceleration = force - *vel * self.damping;
            *vel += acceleration * self.timestep;
            vel.x = vel.x.clamp(-self.max_velocity, self.max_velocity);
            vel.y = vel.y.clamp(-self.max_velocity, self.max_velocity);

            state.positions[i] += *vel * self.timestep;
            max_speed = max_speed.max(vel.length());
        }

        max_speed
    }

    /// Check if the simulation has settled
    pub fn is_settled(&self, state: &GraphState) -> bool {
        !self.enabled
            || state
                .velocities
                .iter()
                .all(|v| v.length() < self.min_velocity)
    }

    fn forces(&self, state: &GraphState) -> Vec<Vec2> {
        let bodies: Vec<Body> = state
            .positions
            .iter()
            .enumerate()
            .map(|(index, &pos)| Body {
                index,
                pos,
                mass: 1.0,
            })
            .collect();

        let tree = Quadtree::build(&bodies, self.theta);
        let mut forces: Vec<Vec2> = bodies
            .iter()
            .map(|b| tree.force_on(b, self.gravitational_constant))
            .collect();

        for &(from, to) in &state.edge_endpoints {
            if from == to {
                continue;
            }
            let delta = state.positions[from] - state.positions[to];
            let distance = delta.length().max(0.01);
            let spring = self.spring_constant * (self.spring_length - distance) / distance;
            let force = delta * spring;
            forces[from] += force;
            forces[to] -= force;
        }

        for (i, force) in forces.iter_mut().enumerate() {
            let to_center = Pos2::ZERO - state.positions[i];
            let distance = to_center.length();
            if distance > 0.0 {
                *force += to_center * (self.central_gravity / distance);
            }
        }

        forces
    }
}
