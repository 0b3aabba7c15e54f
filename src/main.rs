//! Union Vouching Graph
//!
//! Native viewer for the trust lines (staker -> borrower) indexed by the
//! Union subgraph, laid out as a force-directed graph.

mod api;
mod app;
mod fetch;
mod graph;
mod render;
mod session;
mod settings;
mod theme;

use eframe::egui;
use settings::Settings;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_title("Union Vouching Graph"),
        ..Default::default()
    };

    eframe::run_native(
        "Union Vouching Graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::VouchingApp::new(cc, settings)))),
    )
}
