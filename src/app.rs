//! Main application loop tying capture, scheduling, and the session together.

use crate::{
    capture::CaptureDevice,
    commands::CommandDispatcher,
    config::Config,
    error::{Error, Result},
    filters::TranslationSmoother,
    fitter::{FitterSetup, ModelFitter, PoseFitter},
    mesh::FaceMesh,
    projection::{CameraIntrinsics, ProjectionModel},
    reconstruction::LandmarkReconstructor,
    scheduler::FrameScheduler,
    session::PoseSession,
    tracker::FaceTracker,
};
use log::{debug, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Builds the fitting solver once its construction inputs are available
pub type FitterFactory = Box<dyn FnOnce(&FitterSetup) -> Box<dyn ModelFitter> + Send>;

/// Head tracking application
pub struct TrackingApp<C: CaptureDevice> {
    config: Config,
    capture: C,
    tracker: Arc<dyn FaceTracker>,
    fitter_factory: Option<FitterFactory>,
    neutral: FaceMesh,
    blendshapes: Vec<FaceMesh>,
    scheduler: FrameScheduler,
    session: Option<PoseSession>,
    dispatcher: CommandDispatcher,
    show_debug: Arc<AtomicBool>,
    last_report_frame: u64,
    last_report_time: Instant,
}

impl<C: CaptureDevice> TrackingApp<C> {
    /// Create the application.
    ///
    /// The fitter is not constructed here: its intrinsics depend on the
    /// capture-device handshake, so construction is deferred until the
    /// device reports ready.
    pub fn new(
        config: Config,
        capture: C,
        tracker: Arc<dyn FaceTracker>,
        neutral: FaceMesh,
        blendshapes: Vec<FaceMesh>,
        fitter_factory: FitterFactory,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing tracking app: {} landmarks, {} blendshapes, {} tracker iterations",
            config.face.landmark_count,
            blendshapes.len(),
            config.tracker.iterations
        );

        let show_debug = Arc::new(AtomicBool::new(false));
        let mut dispatcher = CommandDispatcher::new();
        // Phrases are matched exactly as the speech recognizer delivers them
        {
            let flag = show_debug.clone();
            dispatcher.register("Show debug", move || {
                info!("Debug overlay enabled");
                flag.store(true, Ordering::SeqCst);
            });
        }
        {
            let flag = show_debug.clone();
            dispatcher.register("Hide debug", move || {
                info!("Debug overlay disabled");
                flag.store(false, Ordering::SeqCst);
            });
        }

        Ok(Self {
            config,
            capture,
            tracker,
            fitter_factory: Some(fitter_factory),
            neutral,
            blendshapes,
            scheduler: FrameScheduler::new(),
            session: None,
            dispatcher,
            show_debug,
            last_report_frame: 0,
            last_report_time: Instant::now(),
        })
    }

    /// Handle a recognized voice command
    pub fn handle_command(&mut self, phrase: &str) -> bool {
        self.dispatcher.dispatch(phrase)
    }

    pub fn session(&self) -> Option<&PoseSession> {
        self.session.as_ref()
    }

    /// Active configuration; tracker implementations read their iteration
    /// count and confidence threshold from here at session start
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Construct the fitter and session once the capture handshake is done.
    ///
    /// Calling this before the device is ready is a programming error and
    /// is rejected.
    fn initialize_session(&mut self) -> Result<()> {
        if !self.capture.initialized() {
            return Err(Error::CaptureError(
                "Session initialization attempted before capture handshake".to_string(),
            ));
        }
        let factory = self
            .fitter_factory
            .take()
            .ok_or_else(|| Error::FitterError("Fitter factory already consumed".to_string()))?;

        let intrinsics = CameraIntrinsics::from_normalized(
            &self.capture.normalized_projection(),
            self.capture.width(),
            self.capture.height(),
        );
        let mesh_scale = self
            .neutral
            .mesh_scale(self.config.face.inter_pupil_distance)?;
        let setup = FitterSetup::new(&self.neutral, &self.blendshapes, mesh_scale, &intrinsics)?;

        let fitter = PoseFitter::new(factory(&setup), self.config.face.landmark_count);
        let projection = ProjectionModel::new(intrinsics, self.capture.width());
        let smoother = TranslationSmoother::from_config(&self.config.filter)?;
        self.session = Some(PoseSession::new(
            fitter,
            smoother,
            LandmarkReconstructor::new(projection),
            self.config.face.landmark_count,
        ));

        info!(
            "Session initialized: {}x{} capture, mesh scale {:.6}",
            self.capture.width(),
            self.capture.height(),
            mesh_scale
        );
        Ok(())
    }

    /// Run one processing cycle.
    ///
    /// Drains completed tracking results, initializes the session when the
    /// capture device becomes ready, and admits at most one new frame into
    /// tracking. Returns the number of drained actions plus admitted frames,
    /// so callers can detect a fully idle cycle.
    pub fn step(&mut self) -> Result<usize> {
        let mut work = 0;

        // Sampled before the drain: idle here means no worker exists, so the
        // drained session state is current when a frame is admitted below. A
        // worker finishing mid-cycle leaves its result for the next cycle.
        let was_idle = self.scheduler.is_idle();

        let mut drained = 0;
        if let Some(session) = &mut self.session {
            drained = self.scheduler.drain(session);
            work += drained;
        }
        if drained > 0 {
            self.report_progress();
            if self.show_debug.load(Ordering::SeqCst) {
                if let Some(session) = &self.session {
                    if let Some(pose) = session.pose() {
                        debug!(
                            "pose rotation {:?} translation {:?}, {} landmarks",
                            pose.rotation,
                            pose.translation,
                            session.landmark_world().len()
                        );
                    }
                }
            }
        }

        if self.session.is_none() {
            if self.capture.initialized() {
                self.initialize_session()?;
            }
            return Ok(work);
        }

        if was_idle {
            if let Some(frame) = self.capture.next_frame() {
                let session = self.session.as_ref().ok_or_else(|| {
                    Error::CaptureError("Frame admitted without a session".to_string())
                })?;
                let seed = session.seed(&frame.camera_to_world);
                self.scheduler.submit(
                    self.tracker.clone(),
                    frame.image,
                    seed,
                    frame.camera_to_world,
                );
                work += 1;
            }
        }

        Ok(work)
    }

    /// Run processing cycles until `max_idle_cycles` consecutive cycles do
    /// no work, polling briefly between cycles.
    pub fn run(&mut self, max_idle_cycles: u32) -> Result<()> {
        info!("Entering main loop");
        let mut idle_cycles = 0;
        while idle_cycles < max_idle_cycles {
            if self.step()? == 0 {
                idle_cycles += 1;
                std::thread::sleep(Duration::from_millis(1));
            } else {
                idle_cycles = 0;
            }
        }
        info!(
            "Main loop finished after {} drained frames",
            self.scheduler.frame_counter()
        );
        Ok(())
    }

    /// Log throughput every configured number of fully-drained frames
    fn report_progress(&mut self) {
        let period = self.config.report.frame_report_period;
        let frames = self.scheduler.frame_counter();
        if frames >= self.last_report_frame + period {
            let elapsed = self.last_report_time.elapsed().as_secs_f64();
            let fps = (frames - self.last_report_frame) as f64 / elapsed.max(1e-9);
            info!("Processed {frames} frames ({fps:.1} fps)");
            self.last_report_frame = frames;
            self.last_report_time = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{
        demo_mesh, orbiting_outcomes, CentroidFitter, ScriptedTracker, SyntheticCapture,
    };

    fn demo_app(
        frames: usize,
        landmark_count: usize,
    ) -> (TrackingApp<SyntheticCapture>, Arc<ScriptedTracker>) {
        let mut config = Config::default();
        config.face.landmark_count = landmark_count;

        let mut capture = SyntheticCapture::new(640, 480, (1.0, 1.33));
        capture.push_frames(frames);

        let tracker = Arc::new(ScriptedTracker::new(orbiting_outcomes(
            frames,
            landmark_count,
            640,
            480,
        )));

        let neutral = demo_mesh(120);
        let blendshapes = vec![crate::synthetic::demo_blendshape(&neutral, 0.5)];
        let factory: FitterFactory =
            Box::new(|setup| Box::new(CentroidFitter::from_setup(setup, 0.6)));

        let app = TrackingApp::new(
            config,
            capture,
            tracker.clone(),
            neutral,
            blendshapes,
            factory,
        )
        .unwrap();
        (app, tracker)
    }

    #[test]
    fn test_session_gated_on_capture_handshake() {
        let (mut app, _) = demo_app(0, 5);
        app.capture.set_initialized(false);
        app.step().unwrap();
        assert!(app.session().is_none());

        app.capture.set_initialized(true);
        app.step().unwrap();
        assert!(app.session().is_some());
    }

    #[test]
    fn test_run_publishes_pose() {
        let (mut app, tracker) = demo_app(5, 8);
        app.run(50).unwrap();

        let session = app.session().unwrap();
        assert!(session.pose().is_some());
        assert!(session.last_update().is_some());
        assert_eq!(session.landmark_world().len(), 8);
        assert_eq!(tracker.calls(), 5);
    }

    #[test]
    fn test_commands_toggle_debug_only() {
        let (mut app, _) = demo_app(0, 5);
        assert!(app.handle_command("Show debug"));
        assert!(app.show_debug.load(Ordering::SeqCst));
        assert!(app.handle_command("Hide debug"));
        assert!(!app.show_debug.load(Ordering::SeqCst));
        assert!(!app.handle_command("unknown phrase"));
        // Matching is exact, as delivered by the recognizer
        assert!(!app.handle_command("show debug"));
    }
}
