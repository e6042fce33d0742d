mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    engine::{SimulationEngine, SimulationOutcome, YearSummary},
    render::{html, ChartConfig},
    rng::SeededRng,
    scenario::Scenario,
    snapshot::{PersistenceError, SnapshotStore},
};

#[derive(Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Year { summary: YearSummary },
    Completed { outcome: SimulationOutcome },
    Failed { message: String },
}

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub species: String,
    pub total_years: u32,
    pub history: Vec<u64>,
    pub completed: bool,
    pub average_growth_rate: Option<f64>,
    pub error: Option<String>,
}

#[derive(Default)]
struct RunProgress {
    history: Vec<u64>,
    years: Vec<YearSummary>,
    outcome: Option<SimulationOutcome>,
    error: Option<String>,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    progress: Arc<Mutex<RunProgress>>,
    scenario_name: String,
    species_name: String,
    total_years: u32,
    chart: ChartConfig,
    snapshots: Arc<SnapshotStore>,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub host: String,
    pub port: u16,
    /// Saves the finished run under this name.
    pub save_as: Option<String>,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        host,
        port,
        save_as,
    } = config;

    let (profile, params) = scenario.prepare()?;
    let snapshots = Arc::new(SnapshotStore::open(&scenario.output.snapshot_dir)?);
    let seeded = SeededRng::new(scenario.seed);
    let mut engine =
        SimulationEngine::new(profile.clone(), params, seeded.rng).with_seed(seeded.seed);

    let (tx, _) = broadcast::channel::<String>(512);
    let progress = Arc::new(Mutex::new(RunProgress {
        history: vec![params.initial_population],
        ..RunProgress::default()
    }));

    let state = Arc::new(AppState {
        broadcaster: tx.clone(),
        progress: progress.clone(),
        scenario_name: scenario.name.clone(),
        species_name: profile.name().to_string(),
        total_years: params.simulation_years,
        chart: scenario.chart.clone(),
        snapshots: snapshots.clone(),
    });

    let progress_for_sim = progress.clone();
    let tx_for_sim = tx.clone();
    let sim_handle = tokio::task::spawn_blocking(move || {
        let result = engine.run_with_hook(|summary| {
            {
                let mut guard = progress_for_sim.lock().expect("progress lock poisoned");
                guard.history.push(summary.total);
                guard.years.push(*summary);
            }
            broadcast(&tx_for_sim, &UiEvent::Year { summary: *summary });
        });
        let event = match result {
            Ok(outcome) => {
                if let Some(name) = &save_as {
                    if let Err(err) = snapshots.save(name, &outcome) {
                        warn!(%err, "failed to save web run");
                    }
                }
                let mut guard = progress_for_sim.lock().expect("progress lock poisoned");
                guard.outcome = Some(outcome.clone());
                UiEvent::Completed { outcome }
            }
            Err(err) => {
                let message = err.to_string();
                let mut guard = progress_for_sim.lock().expect("progress lock poisoned");
                guard.error = Some(message.clone());
                UiEvent::Failed { message }
            }
        };
        broadcast(&tx_for_sim, &event);
    });

    let scenario_label = scenario.name.clone();
    tokio::spawn(async move {
        match sim_handle.await {
            Ok(()) => info!(scenario = %scenario_label, "web simulation finished"),
            Err(err) => error!(?err, "simulation task failed"),
        }
    });

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    info!("population view live at http://{addr} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/:file", get(static_asset))
        .route("/chart", get(chart))
        .route("/api/state", get(latest_state))
        .route("/api/frames", get(all_frames))
        .route("/api/events", get(stream_events))
        .route("/api/snapshots", get(list_snapshots))
        .route("/api/snapshots/:name", get(load_snapshot))
        .with_state(state)
}

fn broadcast(tx: &broadcast::Sender<String>, event: &UiEvent) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = tx.send(payload);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down web view");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn static_asset(Path(file): Path<String>) -> Response {
    match assets::lookup(&file) {
        Some(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn chart(State(state): State<Arc<AppState>>) -> Html<String> {
    let history = state
        .progress
        .lock()
        .expect("progress lock poisoned")
        .history
        .clone();
    Html(html::build(&history, &state.species_name, &state.chart))
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let guard = state.progress.lock().expect("progress lock poisoned");
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        species: state.species_name.clone(),
        total_years: state.total_years,
        history: guard.history.clone(),
        completed: guard.outcome.is_some(),
        average_growth_rate: guard.outcome.as_ref().map(|o| o.average_growth_rate),
        error: guard.error.clone(),
    })
}

async fn all_frames(State(state): State<Arc<AppState>>) -> Json<Vec<YearSummary>> {
    let frames = state
        .progress
        .lock()
        .expect("progress lock poisoned")
        .years
        .clone();
    Json(frames)
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}

async fn list_snapshots(State(state): State<Arc<AppState>>) -> Response {
    match state.snapshots.list() {
        Ok(names) => Json(names).into_response(),
        Err(err) => persistence_response(err),
    }
}

async fn load_snapshot(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match state.snapshots.load(&name) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => persistence_response(err),
    }
}

fn persistence_response(err: PersistenceError) -> Response {
    let status = match &err {
        PersistenceError::NotFound(_) => StatusCode::NOT_FOUND,
        PersistenceError::InvalidName(_) => StatusCode::BAD_REQUEST,
        PersistenceError::Corrupt { .. } | PersistenceError::UnsupportedVersion { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PersistenceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(%err, "snapshot request failed");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::SpeciesProfile;
    use tempfile::tempdir;

    fn app_state(dir: &std::path::Path) -> Arc<AppState> {
        let (tx, _) = broadcast::channel(8);
        Arc::new(AppState {
            broadcaster: tx,
            progress: Arc::new(Mutex::new(RunProgress {
                history: vec![10, 12],
                ..RunProgress::default()
            })),
            scenario_name: "house_mouse".into(),
            species_name: "House Mouse".into(),
            total_years: 3,
            chart: ChartConfig::default(),
            snapshots: Arc::new(SnapshotStore::open(dir).unwrap()),
        })
    }

    #[tokio::test]
    async fn state_reports_partial_progress() {
        let temp = tempdir().unwrap();
        let Json(envelope) = latest_state(State(app_state(temp.path()))).await;
        assert_eq!(envelope.history, vec![10, 12]);
        assert!(!envelope.completed);
        assert_eq!(envelope.average_growth_rate, None);
    }

    #[tokio::test]
    async fn chart_renders_current_history() {
        let temp = tempdir().unwrap();
        let Html(page) = chart(State(app_state(temp.path()))).await;
        assert!(page.contains("data: [10,12]"));
    }

    #[tokio::test]
    async fn missing_snapshot_is_404() {
        let temp = tempdir().unwrap();
        let response = load_snapshot(State(app_state(temp.path())), Path("ghost".into())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stored_snapshot_is_served() {
        let temp = tempdir().unwrap();
        let state = app_state(temp.path());
        let outcome = SimulationOutcome {
            profile: SpeciesProfile::new("House Mouse", 6.0, 5.0, 0.8, 2).unwrap(),
            initial_population: 10,
            simulation_years: 1,
            history: vec![10, 12],
            average_growth_rate: 20.0,
            seed: None,
        };
        state.snapshots.save("mouse", &outcome).unwrap();
        let response = load_snapshot(State(state.clone()), Path("mouse".into())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let listing = list_snapshots(State(state)).await;
        assert_eq!(listing.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_static_file_is_404() {
        let response = static_asset(Path("missing.js".into())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = static_asset(Path("app.js".into())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn events_are_tagged() {
        let summary = YearSummary {
            year: 1,
            breeding_eligible: 4,
            breeding_females: 2,
            offspring: 7,
            survivors: 5,
            total: 12,
            extinction_guarded: false,
        };
        let json = serde_json::to_string(&UiEvent::Year { summary }).unwrap();
        assert!(json.starts_with("{\"type\":\"year\""));
    }
}
