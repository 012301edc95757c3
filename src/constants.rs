//! Constants used throughout the pipeline.

/// Number of 2D landmarks returned by the face tracker
pub const NUM_LANDMARKS: usize = 51;

/// Average human inter-pupil distance in meters
pub const DEFAULT_INTER_PUPIL_DISTANCE: f32 = 0.063;

/// Default number of refinement iterations for the local tracker
pub const DEFAULT_TRACKER_ITERATIONS: u32 = 3;

/// Default tracker confidence threshold below which a fitter reset is requested
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 900.0;

/// Frames between periodic throughput reports
pub const DEFAULT_FRAME_REPORT_PERIOD: u64 = 10;

/// Vertex indices of the left eye corners in the mean face mesh
pub const LEFT_EYE_CORNER_INDICES: (usize, usize) = (52, 55);

/// Vertex indices of the right eye corners in the mean face mesh
pub const RIGHT_EYE_CORNER_INDICES: (usize, usize) = (19, 22);

/// Tracker landmark indices that have a corresponding vertex in the mean face mesh
pub const TRACKED_LANDMARK_INDICES: [usize; 37] = [
    18, 14, 13, 16, 11, 17, 15, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 0, 2, 4, 5, 7, 9,
    31, 34, 37, 40, 36, 32, 38, 42, 43, 45, 47, 49,
];

/// Mesh vertex indices corresponding, pairwise, to `TRACKED_LANDMARK_INDICES`
pub const MESH_VERTEX_INDICES: [usize; 37] = [
    25, 58, 4, 5, 93, 110, 111, 52, 97, 103, 55, 109, 99, 22, 102, 96, 19, 98, 108, 47, 48, 49,
    16, 15, 14, 63, 6, 30, 7, 78, 79, 84, 85, 88, 86, 87, 39,
];

/// Default smoothing filter parameters
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;

/// Numeric precision epsilon for geometry checks
pub const EPSILON: f32 = 1e-6;
