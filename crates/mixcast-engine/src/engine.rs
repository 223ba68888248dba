//! Engine coordinator and the background streaming loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use mixcast_core::{
    ComponentResult, EngineEvent, SharedEncoder, SharedFilter, SharedOutput, SharedSource,
    StreamClock, StreamMetrics, StreamSettings, StreamState,
};

use crate::metrics::MetricsCollector;
use crate::pipeline::RenderPipeline;
use crate::registry::ComponentRegistry;
use crate::scene::Scene;

/// Insertion-ordered scene table: the streaming loop visits scenes in the
/// order their names were first registered.
type SceneTable = IndexMap<String, Arc<Scene>>;

/// The coordinator: owns the scene table, the component registry, the render
/// pipeline, and the background streaming thread.
///
/// Construct one per process and hand references to whatever needs it;
/// nothing here is global. All methods are called from the owning thread —
/// only the streaming loop runs elsewhere, against `Arc`-shared state.
pub struct Engine {
    settings: StreamSettings,
    clock: StreamClock,
    registry: ComponentRegistry,
    scenes: Arc<Mutex<SceneTable>>,
    pipeline: Arc<Mutex<RenderPipeline>>,
    metrics: Arc<MetricsCollector>,
    state: Arc<RwLock<StreamState>>,
    should_stop: Arc<AtomicBool>,
    stream_thread: Option<JoinHandle<()>>,
    event_tx: Sender<EngineEvent>,
    initialized: bool,
}

impl Engine {
    /// Create an engine. Events are delivered on `event_tx` with best-effort
    /// `try_send` semantics.
    pub fn new(settings: StreamSettings, event_tx: Sender<EngineEvent>) -> Self {
        Self {
            clock: StreamClock::start(),
            registry: ComponentRegistry::new(),
            scenes: Arc::new(Mutex::new(IndexMap::new())),
            pipeline: Arc::new(Mutex::new(RenderPipeline::new())),
            metrics: Arc::new(MetricsCollector::new(settings.video.fps as f32)),
            state: Arc::new(RwLock::new(StreamState::Idle)),
            should_stop: Arc::new(AtomicBool::new(false)),
            stream_thread: None,
            event_tx,
            settings,
            initialized: false,
        }
    }

    /// Validate settings and mark the engine ready. Idempotent; on failure
    /// the engine stays uninitialized.
    #[instrument(name = "engine_initialize", skip(self))]
    pub fn initialize(&mut self) -> ComponentResult<()> {
        if self.initialized {
            debug!("engine already initialized");
            return Ok(());
        }
        self.settings.validate()?;
        self.initialized = true;
        info!(
            fps = self.settings.video.fps,
            width = self.settings.video.width,
            height = self.settings.video.height,
            "engine initialized"
        );
        Ok(())
    }

    /// Stop streaming if active, shut down every scene and pipeline
    /// component, and release engine state. Idempotent.
    #[instrument(name = "engine_shutdown", skip(self))]
    pub fn shutdown(&mut self) {
        self.stop_streaming();

        let scenes: Vec<Arc<Scene>> = {
            let mut table = self.scenes.lock();
            table.drain(..).map(|(_, scene)| scene).collect()
        };
        for scene in scenes {
            scene.shutdown();
        }

        self.pipeline.lock().shutdown_components();
        self.initialized = false;
        self.send_event(EngineEvent::Shutdown);
        info!("engine shut down");
    }

    /// The engine's monotonic clock.
    pub fn clock(&self) -> StreamClock {
        self.clock
    }

    /// The settings the engine was built with.
    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Create a scene and register it under `name`, replacing any previous
    /// mapping. The replaced scene stays alive for external holders.
    pub fn create_scene(&self, name: &str) -> Arc<Scene> {
        let scene = Arc::new(Scene::new(name, &self.settings));
        let replaced = self
            .scenes
            .lock()
            .insert(name.to_string(), Arc::clone(&scene));
        if replaced.is_some() {
            warn!(scene = name, "replacing existing scene registration");
        }
        debug!(scene = name, "scene created");
        self.send_event(EngineEvent::SceneCreated {
            name: name.to_string(),
        });
        scene
    }

    /// Look up a scene by name.
    pub fn scene(&self, name: &str) -> Option<Arc<Scene>> {
        self.scenes.lock().get(name).cloned()
    }

    /// Scene names in registration order.
    pub fn scene_names(&self) -> Vec<String> {
        self.scenes.lock().keys().cloned().collect()
    }

    /// Register a source factory under `id`.
    pub fn register_source(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedSource + Send + Sync + 'static,
    ) {
        self.registry.register_source(id, factory);
    }

    /// Register an encoder factory under `id`.
    pub fn register_encoder(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedEncoder + Send + Sync + 'static,
    ) {
        self.registry.register_encoder(id, factory);
    }

    /// Register an output factory under `id`.
    pub fn register_output(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedOutput + Send + Sync + 'static,
    ) {
        self.registry.register_output(id, factory);
    }

    /// Register a filter factory under `id`.
    pub fn register_filter(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedFilter + Send + Sync + 'static,
    ) {
        self.registry.register_filter(id, factory);
    }

    /// Create a source by registered id. `None` for unknown ids — the
    /// expected outcome until factories are registered.
    pub fn create_source(&self, id: &str, name: &str) -> Option<SharedSource> {
        self.registry.create_source(id, name, self.clock)
    }

    /// Create an encoder by registered id.
    pub fn create_encoder(&self, id: &str, name: &str) -> Option<SharedEncoder> {
        self.registry.create_encoder(id, name, self.clock)
    }

    /// Create an output by registered id.
    pub fn create_output(&self, id: &str, name: &str) -> Option<SharedOutput> {
        self.registry.create_output(id, name, self.clock)
    }

    /// Create a filter by registered id.
    pub fn create_filter(&self, id: &str, name: &str) -> Option<SharedFilter> {
        self.registry.create_filter(id, name, self.clock)
    }

    /// Append a filter to the render pipeline.
    pub fn add_filter(&self, filter: SharedFilter) {
        self.pipeline.lock().add_filter(filter);
    }

    /// Attach an encoder to the render pipeline.
    pub fn add_encoder(&self, encoder: SharedEncoder) {
        self.pipeline.lock().add_encoder(encoder);
    }

    /// Attach an output to the render pipeline.
    pub fn add_output(&self, output: SharedOutput) {
        self.pipeline.lock().add_output(output);
    }

    /// Launch the background streaming loop. Returns false without side
    /// effects when already streaming.
    #[instrument(name = "start_streaming", skip(self))]
    pub fn start_streaming(&mut self) -> bool {
        if !self.state.read().is_idle() {
            warn!("streaming already started");
            return false;
        }

        self.should_stop.store(false, Ordering::SeqCst);
        self.metrics = Arc::new(MetricsCollector::new(self.settings.video.fps as f32));
        self.metrics.start();
        self.pipeline.lock().start_outputs();
        self.transition_to(StreamState::Running);

        let ctx = LoopContext {
            scenes: Arc::clone(&self.scenes),
            pipeline: Arc::clone(&self.pipeline),
            metrics: Arc::clone(&self.metrics),
            state: Arc::clone(&self.state),
            should_stop: Arc::clone(&self.should_stop),
            settings: self.settings.clone(),
            event_tx: self.event_tx.clone(),
        };
        self.stream_thread = Some(thread::spawn(move || stream_loop(ctx)));

        self.send_event(EngineEvent::StreamStarted);
        info!("streaming started");
        true
    }

    /// Signal the loop to stop and block until the thread exits (at most
    /// about one tick). No-op when idle.
    #[instrument(name = "stop_streaming", skip(self))]
    pub fn stop_streaming(&mut self) {
        if self.state.read().is_idle() {
            debug!("not streaming, nothing to stop");
            return;
        }

        self.should_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }

        self.pipeline.lock().stop_outputs();
        self.metrics.stop();
        self.transition_to(StreamState::Idle);
        self.send_event(EngineEvent::StreamStopped);
        info!("streaming stopped");
    }

    /// Whether a streaming thread is live.
    pub fn is_streaming(&self) -> bool {
        !self.state.read().is_idle()
    }

    /// Current streaming-loop state.
    pub fn stream_state(&self) -> StreamState {
        *self.state.read()
    }

    /// Metrics snapshot for the current (or most recent) session.
    pub fn metrics(&self) -> StreamMetrics {
        self.metrics.snapshot()
    }

    fn transition_to(&self, next: StreamState) {
        transition(&self.state, &self.event_tx, next);
    }

    fn send_event(&self, event: EngineEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("failed to send event: {}", e);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.should_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Swap the loop state and emit the change.
fn transition(state: &RwLock<StreamState>, event_tx: &Sender<EngineEvent>, next: StreamState) {
    let previous = {
        let mut state = state.write();
        let previous = *state;
        *state = next;
        previous
    };

    debug!(
        previous = previous.name(),
        current = next.name(),
        "state transition"
    );

    if event_tx
        .try_send(EngineEvent::StateChanged {
            previous,
            current: next,
        })
        .is_err()
    {
        debug!("state change event dropped");
    }
}

/// Shared state handed to the streaming thread.
struct LoopContext {
    scenes: Arc<Mutex<SceneTable>>,
    pipeline: Arc<Mutex<RenderPipeline>>,
    metrics: Arc<MetricsCollector>,
    state: Arc<RwLock<StreamState>>,
    should_stop: Arc<AtomicBool>,
    settings: StreamSettings,
    event_tx: Sender<EngineEvent>,
}

/// Fixed-rate streaming loop.
///
/// Deadline-paced: each tick's deadline is the previous deadline plus the
/// period, and the sleep is clamped at zero when a tick overruns, so a slow
/// tick delays the schedule instead of dropping a frame. Misses surface as
/// `late_ticks` in the metrics. The stop signal is checked every tick
/// boundary, bounding stop latency by roughly one period.
fn stream_loop(ctx: LoopContext) {
    debug!("stream loop starting");

    let period = ctx.settings.tick_interval();
    let start_time = Instant::now();
    let mut next_deadline = start_time + period;
    let mut last_log_time = start_time;

    while !ctx.should_stop.load(Ordering::SeqCst) {
        run_tick(&ctx);
        ctx.metrics.record_tick();

        if last_log_time.elapsed() >= Duration::from_secs(5) {
            let snapshot = ctx.metrics.snapshot();
            info!(
                ticks = snapshot.ticks,
                late = snapshot.late_ticks,
                rate = snapshot.tick_rate,
                "stream loop stats"
            );
            if ctx.event_tx.try_send(EngineEvent::Metrics(snapshot)).is_err() {
                debug!("metrics event dropped");
            }
            ctx.metrics.mark_reported();
            last_log_time = Instant::now();
        }

        let now = Instant::now();
        if now < next_deadline {
            thread::sleep(next_deadline - now);
        } else {
            ctx.metrics.record_late_tick();
        }
        next_deadline += period;
    }

    transition(&ctx.state, &ctx.event_tx, StreamState::Stopping);
    let totals = ctx.metrics.snapshot();
    info!(
        ticks = totals.ticks,
        video = totals.video_frames,
        audio = totals.audio_frames,
        late = totals.late_ticks,
        "stream loop stopped"
    );
}

/// One tick: render every scene in registration order, video before audio,
/// and feed the results downstream.
fn run_tick(ctx: &LoopContext) {
    // Clone handles out so renders run without the table lock held.
    let scenes: Vec<Arc<Scene>> = ctx.scenes.lock().values().cloned().collect();

    for scene in scenes {
        // Video before audio: downstream timestamp pairing relies on the
        // order.
        let video = scene.render_video();
        let audio = scene.render_audio();

        if video.is_some() {
            ctx.metrics.record_video_frame();
        }
        if audio.is_some() {
            ctx.metrics.record_audio_frame();
        }

        if video.is_some() || audio.is_some() {
            ctx.pipeline.lock().process(video, audio);
        }
    }
}
