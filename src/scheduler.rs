//! Single-in-flight frame scheduling.
//!
//! At most one tracking pass runs in the background at a time. The worker
//! never touches session state; it only sends an immutable action through a
//! FIFO channel. The consumer thread drains the channel to completion
//! before the frame counter and processing-start timestamp advance, so the
//! counter only ever reflects fully-drained frames.
//!
//! There is no cancellation: a started pass always runs to completion and
//! its result is always consumed, even if it is one frame stale.

use crate::{
    session::PoseSession,
    tracker::{CameraImage, FaceTracker},
};
use nalgebra::Matrix4;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc::{channel, Receiver, Sender},
    Arc,
};
use std::thread;
use std::time::Instant;

/// Deferred state mutation handed from the worker to the consumer thread
pub enum SessionAction {
    /// Landmarks were found; update the session
    Update {
        landmarks: Vec<f32>,
        camera_to_world: Matrix4<f32>,
        reset_requested: bool,
    },
    /// The tracker found nothing; hard-reset the session
    Reset,
}

/// Coordinates one in-flight background tracking pass
pub struct FrameScheduler {
    tx: Sender<SessionAction>,
    rx: Receiver<SessionAction>,
    in_flight: Arc<AtomicUsize>,
    frame_counter: u64,
    processing_started: Option<Instant>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
            frame_counter: 0,
            processing_started: None,
        }
    }

    /// Whether a new frame may be admitted into tracking
    pub fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }

    /// Count of fully-drained frames
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Start of the current processing cycle, set after each full drain
    pub fn processing_started(&self) -> Option<Instant> {
        self.processing_started
    }

    /// Admit a frame into tracking on a background worker.
    ///
    /// Returns false without starting anything if a pass is already in
    /// flight; frame-ready events arriving while busy are dropped, not
    /// queued.
    pub fn submit(
        &self,
        tracker: Arc<dyn FaceTracker>,
        image: CameraImage,
        seed: Option<Vec<f32>>,
        camera_to_world: Matrix4<f32>,
    ) -> bool {
        if self
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let tx = self.tx.clone();
        let in_flight = self.in_flight.clone();
        thread::spawn(move || {
            let outcome = tracker.track(&image, seed.as_deref());
            let action = match outcome.landmarks {
                Some(landmarks) => SessionAction::Update {
                    landmarks,
                    camera_to_world,
                    reset_requested: outcome.reset_requested,
                },
                None => SessionAction::Reset,
            };
            // The consumer may already be gone on shutdown; the result is
            // simply dropped then.
            let _ = tx.send(action);
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
        true
    }

    /// Drain all completed results into the session.
    ///
    /// Returns the number of actions applied. The frame counter and
    /// processing-start timestamp advance only after the queue is empty.
    pub fn drain(&mut self, session: &mut PoseSession) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.rx.try_recv() {
            match action {
                SessionAction::Update {
                    landmarks,
                    camera_to_world,
                    reset_requested,
                } => session.apply(&landmarks, &camera_to_world, reset_requested),
                SessionAction::Reset => session.reset(),
            }
            applied += 1;
        }

        if applied > 0 {
            self.frame_counter += 1;
            self.processing_started = Some(Instant::now());
        }
        applied
    }
}
