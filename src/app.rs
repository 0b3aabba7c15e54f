//! Main application state and UI.

use crate::api::ApiClient;
use crate::fetch::FetchError;
use crate::render::{NetworkOptions, Viewport};
use crate::session::{GraphSession, ViewState};
use crate::settings::Settings;
use crate::theme;
use eframe::egui::{self, Align, Layout, PointerButton, RichText, Sense, Vec2};

/// Layout steps run per frame while stabilizing
const STABILIZATION_STEPS_PER_FRAME: u32 = 50;

pub struct VouchingApp {
    settings: Settings,
    session: GraphSession,
    viewport: Viewport,
}

impl VouchingApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let session = Self::mount(&settings);
        Self {
            settings,
            session,
            viewport: Viewport::default(),
        }
    }

    fn mount(settings: &Settings) -> GraphSession {
        let options = NetworkOptions::from_settings(settings);
        match ApiClient::from_settings(settings) {
            Ok(client) => {
                tracing::info!(endpoint = client.endpoint(), "Mounting vouching graph");
                GraphSession::mount(client, settings.fetch_config(), options)
            }
            Err(e) => GraphSession::failed(FetchError::from(e), options),
        }
    }

    fn reload(&mut self) {
        match ApiClient::from_settings(&self.settings) {
            Ok(client) => self.session.remount(client, self.settings.fetch_config()),
            Err(e) => {
                self.session = GraphSession::failed(
                    FetchError::from(e),
                    NetworkOptions::from_settings(&self.settings),
                )
            }
        }
        self.viewport = Viewport::default();
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Union Vouching Graph");
            ui.add_space(4.0);

            match self.session.state() {
                ViewState::Error(err) => {
                    let color = if err.is_informational() {
                        theme::state::WARNING
                    } else {
                        theme::state::ERROR
                    };
                    ui.colored_label(color, format!("Error: {}", err));
                }
                ViewState::Loading => {
                    let text = match self.session.progress() {
                        Some((done, total)) => format!("Loading data... laying out {}/{}", done, total),
                        None => "Loading data...".to_string(),
                    };
                    ui.label(RichText::new(text).color(theme::text::MUTED));
                }
                ViewState::Ready => {
                    if let Some(view) = self.session.host().view() {
                        let state = view.state();
                        ui.label(
                            RichText::new(format!(
                                "{} participants, {} trust lines, laid out in {} iterations",
                                state.node_count(),
                                state.data.edges.len(),
                                view.iterations()
                            ))
                            .color(theme::text::MUTED),
                        );
                    }
                }
            }
        });

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("⟳ Reload").clicked() {
                self.reload();
            }
        });
    }

    fn render_graph(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let center = rect.center();

        painter.rect(rect, 0.0, theme::bg::CANVAS, theme::stroke(theme::border::CANVAS, 1.0));

        let Some(view) = self.session.view_mut() else {
            return;
        };

        // Hover picks the node under the pointer, in graph space
        let hover_pos = response.hover_pos();
        let hovered = hover_pos.and_then(|p| view.state().node_at(self.viewport.to_graph(p, center)));
        view.state_mut().hovered_node = hovered;

        // Dragging a node moves it; dragging empty canvas pans
        if response.drag_started_by(PointerButton::Primary) {
            view.state_mut().dragged_node = hovered;
        }
        if response.dragged_by(PointerButton::Primary) {
            match (view.state().dragged_node, response.interact_pointer_pos()) {
                (Some(index), Some(pointer)) => {
                    let target = self.viewport.to_graph(pointer, center);
                    view.state_mut().move_node(index, target);
                }
                _ => self.viewport.pan += response.drag_delta(),
            }
        }
        if response.drag_stopped() {
            view.state_mut().dragged_node = None;
        }

        // Two-finger scroll pans, pinch / ctrl+scroll zooms at the cursor
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
        let zoom_delta = ui.input(|i| i.zoom_delta());
        if scroll_delta != Vec2::ZERO && response.hovered() {
            self.viewport.pan += scroll_delta;
        }
        if let Some(cursor) = hover_pos {
            if zoom_delta != 1.0 {
                self.viewport.zoom_at(zoom_delta, cursor, center);
            }
        }

        view.paint(&painter.with_clip_rect(rect), &self.viewport, center);

        if let Some(index) = hovered {
            let address = view.state().data.nodes[index].id.clone();
            response.on_hover_text_at_pointer(address);
        }
    }
}

impl eframe::App for VouchingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep repainting while waiting on the fetch or while the layout moves
        let waiting = self.session.poll();
        let moving = self.session.advance_layout(STABILIZATION_STEPS_PER_FRAME);
        if waiting || moving {
            ctx.request_repaint();
        }

        ctx.set_visuals(egui::Visuals::light());

        egui::TopBottomPanel::top("status")
            .frame(egui::Frame::none().fill(theme::bg::PANEL).inner_margin(egui::Margin::same(10.0)))
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::PANEL).inner_margin(egui::Margin::same(10.0)))
            .show(ctx, |ui| {
                self.render_graph(ui);
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.unmount();
    }
}
