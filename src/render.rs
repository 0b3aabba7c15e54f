//! Renderer adapter: the drawn graph instance, its layout lifecycle, and
//! the single owner that swaps instances in and out.

use crate::graph::{ForceLayout, GraphData, GraphState};
use crate::settings::Settings;
use crate::theme;
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Live physics steps allowed after stabilization before the view stops
/// moving on its own. Dragging a node grants a fresh budget.
const LIVE_STEP_BUDGET: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizationOptions {
    pub enabled: bool,
    /// Upper bound on layout steps before the layout is declared stable
    pub iterations: u32,
    /// Steps between progress events
    pub update_interval: u32,
}

impl Default for StabilizationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            iterations: 1000,
            update_interval: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkOptions {
    pub font_size: f32,
    pub node_color: Color32,
    pub edge_color: Color32,
    pub arrows_to: bool,
    pub physics: ForceLayout,
    pub stabilization: StabilizationOptions,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl NetworkOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            font_size: settings.font_size,
            node_color: theme::color_or(&settings.node_color, Color32::from_rgb(51, 51, 51)),
            edge_color: theme::color_or(&settings.edge_color, Color32::from_rgb(153, 153, 153)),
            arrows_to: true,
            physics: settings.force_layout(),
            stabilization: StabilizationOptions {
                enabled: settings.stabilization_enabled,
                iterations: settings.stabilization_iterations,
                ..StabilizationOptions::default()
            },
        }
    }
}

/// Signals a view reports back while its layout runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    StabilizationProgress { iterations: u32, total: u32 },
    /// Emitted once per view
    StabilizationDone { iterations: u32 },
}

/// Pan and zoom between graph space (origin at the layout center) and the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn to_screen(&self, pos: Pos2, center: Pos2) -> Pos2 {
        center + pos.to_vec2() * self.zoom + self.pan
    }

    pub fn to_graph(&self, screen: Pos2, center: Pos2) -> Pos2 {
        ((screen - center - self.pan) / self.zoom).to_pos2()
    }

    /// Zoom by `factor`, keeping the point under `anchor` fixed
    pub fn zoom_at(&mut self, factor: f32, anchor: Pos2, center: Pos2) {
        let new_zoom = (self.zoom * factor).clamp(0.05, 5.0);
        let anchor_offset = anchor - center - self.pan;
        self.pan += anchor_offset * (1.0 - new_zoom / self.zoom);
        self.zoom = new_zoom;
    }
}

/// One constructed graph instance
pub struct NetworkView {
    id: u64,
    state: GraphState,
    options: NetworkOptions,
    iterations: u32,
    stabilized: bool,
    live_steps: u32,
}

impl NetworkView {
    /// Seed positions inside `bounds` (graph space)
    pub fn new(data: GraphData, options: NetworkOptions, bounds: Rect) -> Self {
        Self::from_state(GraphState::new(data, bounds), options)
    }

    pub fn from_state(state: GraphState, options: NetworkOptions) -> Self {
        let id = NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, nodes = state.node_count(), "Constructed network view");
        Self {
            id,
            state,
            options,
            iterations: 0,
            stabilized: false,
            live_steps: 0,
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }

    pub fn is_stabilized(&self) -> bool {
        self.stabilized
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Run up to `budget` stabilization steps and report what happened.
    ///
    /// Stops at convergence or at the configured iteration cap, whichever
    /// comes first. Nothing is returned once the view has stabilized.
    pub fn advance(&mut self, budget: u32) -> Vec<LayoutEvent> {
        if self.stabilized {
            return Vec::new();
        }

        let physics = self.options.physics;
        let stabilization = self.options.stabilization;
        let total = stabilization.iterations;

        if !physics.enabled || !stabilization.enabled || total == 0 || self.state.node_count() == 0 {
            return vec![self.finish()];
        }

        let interval = stabilization.update_interval.max(1);
        let mut events = Vec::new();
        let mut converged = false;

        for _ in 0..budget.max(1) {
            if self.iterations >= total {
                break;
            }
            let speed = physics.step(&mut self.state);
            self.iterations += 1;

            if speed < physics.min_velocity {
                converged = true;
                break;
            }
            if self.iterations % interval == 0 {
                tracing::debug!(iterations = self.iterations, total, "Stabilization progress");
                events.push(LayoutEvent::StabilizationProgress {
                    iterations: self.iterations,
                    total,
                });
            }
        }

        if converged || self.iterations >= total {
            events.push(self.finish());
        }
        events
    }

    fn finish(&mut self) -> LayoutEvent {
        self.stabilized = true;
        tracing::info!(id = self.id, iterations = self.iterations, "Network stabilized");
        LayoutEvent::StabilizationDone {
            iterations: self.iterations,
        }
    }

    /// Live physics after stabilization. Returns true while nodes still move.
    pub fn tick(&mut self) -> bool {
        let physics = self.options.physics;
        if !self.stabilized {
            return false;
        }
        if self.state.dragged_node.is_some() {
            self.live_steps = 0;
        } else if self.live_steps >= LIVE_STEP_BUDGET || physics.is_settled(&self.state) {
            return false;
        }
        physics.step(&mut self.state);
        self.live_steps += 1;
        true
    }

    /// Draw edges, then nodes and labels on top
    pub fn paint(&self, painter: &Painter, viewport: &Viewport, center: Pos2) {
        let zoom = viewport.zoom;
        let edge_stroke = Stroke::new((1.0 * zoom).max(0.5), self.options.edge_color);

        for edge in &self.state.data.edges {
            let (Some(&from), Some(&to)) = (
                self.state.node_index.get(&edge.from),
                self.state.node_index.get(&edge.to),
            ) else {
                continue;
            };
            let source = viewport.to_screen(self.state.positions[from], center);
            let target = viewport.to_screen(self.state.positions[to], center);
            painter.line_segment([source, target], edge_stroke);

            if self.options.arrows_to && edge.arrow_to && source != target {
                let dir = (target - source).normalized();
                let radius = self.state.data.nodes[to].size * zoom;
                let tip = target - dir * (radius + 1.0);
                let arrow_size = 8.0 * zoom;
                let perp = Vec2::new(-dir.y, dir.x);

                painter.add(Shape::convex_polygon(
                    vec![
                        tip,
                        tip - dir * arrow_size + perp * arrow_size * 0.5,
                        tip - dir * arrow_size - perp * arrow_size * 0.5,
                    ],
                    self.options.edge_color,
                    Stroke::NONE,
                ));
            }
        }

        let font = FontId::proportional((self.options.font_size * zoom).max(4.0));
        for (i, node) in self.state.data.nodes.iter().enumerate() {
            let pos = viewport.to_screen(self.state.positions[i], center);
            let radius = node.size * zoom;
            let outline = if self.state.hovered_node == Some(i) {
                theme::stroke(theme::state::HOVER, 2.0)
            } else {
                Stroke::NONE
            };

            painter.circle(pos, radius, self.options.node_color, outline);
            painter.text(
                pos + Vec2::new(0.0, radius + 2.0),
                Align2::CENTER_TOP,
                &node.label,
                font.clone(),
                theme::text::PRIMARY,
            );
        }
    }
}

/// Sole owner of the live view. `replace` and `dispose` are the only ways
/// to change which instance is live.
#[derive(Default)]
pub struct NetworkHost {
    view: Option<NetworkView>,
    disposed: u64,
}

impl NetworkHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `view`, tearing down whatever was there first
    pub fn replace(&mut self, view: NetworkView) -> &mut NetworkView {
        self.dispose();
        self.view.insert(view)
    }

    pub fn dispose(&mut self) {
        if let Some(old) = self.view.take() {
            self.disposed += 1;
            tracing::info!(id = old.id, disposed = self.disposed, "Destroying network view");
        }
    }

    pub fn view(&self) -> Option<&NetworkView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut NetworkView> {
        self.view.as_mut()
    }

}

#[cfg(test)]
impl NetworkView {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
impl NetworkHost {
    /// Views torn down over this host's lifetime
    pub fn disposed_count(&self) -> u64 {
        self.disposed
    }
}
