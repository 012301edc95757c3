//! Real-time 3D head pose and facial landmark tracking.
//!
//! This library estimates a moving subject's head pose and landmark
//! positions from a stream of camera images, for anchoring synthetic
//! overlay content to the face. The pipeline combines:
//! 1. A pinhole projection model converting between pixel, camera-space,
//!    and world-space coordinates
//! 2. A single-in-flight frame scheduler that keeps a slow tracking pass
//!    from ever blocking the consumption loop
//! 3. A feedback loop seeding each tracking pass with the previous frame's
//!    projected landmarks
//! 4. A reset policy that degrades tracking failures to "no pose this
//!    frame" instead of surfacing errors
//!
//! The 2D landmark tracker, the model-fitting solver, and the capture
//! subsystem are external collaborators behind the [`tracker::FaceTracker`],
//! [`fitter::ModelFitter`], and [`capture::CaptureDevice`] traits.
//!
//! # Examples
//!
//! ```no_run
//! use face_pose_tracker::{
//!     app::{FitterFactory, TrackingApp},
//!     config::Config,
//!     synthetic::{demo_mesh, orbiting_outcomes, CentroidFitter, ScriptedTracker, SyntheticCapture},
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut capture = SyntheticCapture::new(896, 504, (1.0, 1.78));
//! capture.push_frames(30);
//! let tracker = Arc::new(ScriptedTracker::new(orbiting_outcomes(30, 51, 896, 504)));
//! let mesh = demo_mesh(120);
//!
//! let factory: FitterFactory = Box::new(|setup| Box::new(CentroidFitter::from_setup(setup, 0.6)));
//! let mut app = TrackingApp::new(config, capture, tracker, mesh, Vec::new(), factory)?;
//! app.run(100)?;
//!
//! if let Some(pose) = app.session().and_then(|s| s.pose()) {
//!     println!("head at {:?}", pose.translation);
//! }
//! # Ok(())
//! # }
//! ```

/// Main application loop
pub mod app;

/// Capture device boundary contract
pub mod capture;

/// Voice-command dispatch table
pub mod commands;

/// Configuration management
pub mod config;

/// Constants used throughout the pipeline
pub mod constants;

/// Error types and result handling
pub mod error;

/// Smoothing filters for the fitted head position
pub mod filters;

/// Model-fitter capability boundary and adapter
pub mod fitter;

/// Mean-shape and blendshape mesh assets
pub mod mesh;

/// Pinhole camera projection model
pub mod projection;

/// World-space landmark reconstruction and seeding
pub mod reconstruction;

/// Single-in-flight frame scheduling
pub mod scheduler;

/// Published per-session tracking state
pub mod session;

/// Synthetic stand-ins for the external collaborators
pub mod synthetic;

/// External 2D landmark tracker boundary contract
pub mod tracker;

pub use error::{Error, Result};
