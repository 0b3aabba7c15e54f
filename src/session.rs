//! Mount lifecycle: one background fetch per mount, the view it produces,
//! and the loading / error / ready state shown around it.

use crate::api::GraphQlTransport;
use crate::fetch::{fetch_graph, FetchConfig, FetchError};
use crate::graph::GraphData;
use crate::render::{LayoutEvent, NetworkHost, NetworkOptions, NetworkView};
use egui::{Pos2, Rect, Vec2};
use std::sync::mpsc::{self, Receiver, TryRecvError};

type FetchResult = Result<GraphData, FetchError>;

/// What the user sees around the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(FetchError),
    /// Data arrived and the layout reported stabilization
    Ready,
}

pub struct GraphSession {
    state: ViewState,
    /// Dropping this is the unmount signal for the worker
    receiver: Option<Receiver<FetchResult>>,
    host: NetworkHost,
    options: NetworkOptions,
    /// Latest (iterations, total) reported by the layout
    progress: Option<(u32, u32)>,
}

impl GraphSession {
    /// Area new views scatter their nodes over, in graph space
    fn seed_bounds() -> Rect {
        Rect::from_center_size(Pos2::ZERO, Vec2::new(600.0, 400.0))
    }

    /// Start a session and kick off its fetch on a worker thread
    pub fn mount<T>(transport: T, config: FetchConfig, options: NetworkOptions) -> Self
    where
        T: GraphQlTransport + Send + 'static,
    {
        Self {
            state: ViewState::Loading,
            receiver: Some(spawn_fetch(transport, config)),
            host: NetworkHost::new(),
            options,
            progress: None,
        }
    }

    /// A session that failed before any request could be made
    pub fn failed(error: FetchError, options: NetworkOptions) -> Self {
        tracing::error!(error = %error, "Error in data fetching");
        Self {
            state: ViewState::Error(error),
            receiver: None,
            host: NetworkHost::new(),
            options,
            progress: None,
        }
    }

    /// Tear everything down and fetch again from scratch
    pub fn remount<T>(&mut self, transport: T, config: FetchConfig)
    where
        T: GraphQlTransport + Send + 'static,
    {
        self.unmount();
        self.state = ViewState::Loading;
        self.progress = None;
        self.receiver = Some(spawn_fetch(transport, config));
    }

    /// Stop listening for the pending fetch and destroy the live view.
    /// The request itself is left to finish on its own.
    pub fn unmount(&mut self) {
        if self.receiver.take().is_some() {
            tracing::debug!("Unmounted with a fetch in flight");
        }
        self.host.dispose();
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn progress(&self) -> Option<(u32, u32)> {
        self.progress
    }

    pub fn host(&self) -> &NetworkHost {
        &self.host
    }

    pub fn view_mut(&mut self) -> Option<&mut NetworkView> {
        self.host.view_mut()
    }

    /// Pick up the fetch result if it has arrived. Returns true while still waiting.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.receiver else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => Err(FetchError::Transport(
                "fetch worker exited without a result".to_string(),
            )),
        };

        self.receiver = None;
        self.handle_result(result);
        false
    }

    /// Apply a finished fetch: build a view from the data or show the error
    pub fn handle_result(&mut self, result: FetchResult) {
        match result {
            Ok(data) => {
                let view = NetworkView::new(data, self.options, Self::seed_bounds());
                self.host.replace(view);
            }
            Err(error) => {
                if error.is_informational() {
                    tracing::warn!(error = %error, "Nothing to draw");
                } else {
                    tracing::error!(error = %error, "Error in data fetching");
                }
                self.state = ViewState::Error(error);
            }
        }
    }

    /// Run a frame's worth of layout. Returns true while the layout is still moving.
    pub fn advance_layout(&mut self, budget: u32) -> bool {
        let Some(view) = self.host.view_mut() else {
            return false;
        };

        for event in view.advance(budget) {
            match event {
                LayoutEvent::StabilizationProgress { iterations, total } => {
                    tracing::info!("Stabilization progress: {} / {}", iterations, total);
                    self.progress = Some((iterations, total));
                }
                LayoutEvent::StabilizationDone { .. } => {
                    if self.state == ViewState::Loading {
                        self.state = ViewState::Ready;
                    }
                }
            }
        }

        if view.is_stabilized() {
            view.tick()
        } else {
            true
        }
    }
}

impl Drop for GraphSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn spawn_fetch<T>(transport: T, config: FetchConfig) -> Receiver<FetchResult>
where
    T: GraphQlTransport + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = fetch_graph(&transport, &config);
        if tx.send(result).is_err() {
            tracing::debug!("Fetch finished after unmount, result dropped");
        }
    });
    rx
}
