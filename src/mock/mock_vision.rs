use log::{error, info};
use nalgebra::{point, Point2, Rotation2, Vector2};
use std::f64::consts::PI;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{SyncSender, TrySendError},
    Arc,
};
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::constants::NUM_LANDMARK;
use crate::enums::LandmarkName;
use crate::face::dispatch_process::DispatchInput;
use crate::face::landmark::{LandmarkPoint, LandmarkSnapshot};

// Position of the nose tip in the image.
const FACE_CENTER: (f64, f64) = (0.5, 0.5);
// Distance between the outer eye corners in the image.
const FACE_SCALE: f64 = 0.2;

pub struct MockVision {
    // Frame rate in Hz.
    _frame_rate: f64,
    // Stop the loop.
    _stop: Arc<AtomicBool>,
}

impl MockVision {
    /// Create a new mock vision pipeline. The synthetic face talks, raises
    /// the eyebrows, blinks, looks around, and tilts the head slowly.
    ///
    /// # Arguments
    /// * `frame_rate` - Frame rate in Hz.
    /// * `stop` - An Arc instance that holds the AtomicBool instance to stop
    /// the loop.
    ///
    /// # Returns
    /// A new mock vision pipeline.
    pub fn new(frame_rate: f64, stop: &Arc<AtomicBool>) -> Self {
        Self {
            _frame_rate: frame_rate,
            _stop: stop.clone(),
        }
    }

    /// Create the snapshot of the synthetic face.
    ///
    /// # Notes
    /// The face is in the mirrored camera view, so the left eye of the face
    /// is on the left of the image.
    ///
    /// # Arguments
    /// * `time` - Time in second.
    ///
    /// # Returns
    /// Landmark snapshot.
    pub fn create_snapshot(time: f64) -> LandmarkSnapshot {
        let wave = |frequency: f64| (2.0 * PI * frequency * time).sin();

        let mouth = 0.65 + 0.25 * wave(0.5);
        let eyebrow = 0.05 * wave(0.3);
        let eyelid = 0.1 + 0.05 * wave(0.2);
        let gaze = 0.05 * wave(0.1);
        let roll = 0.1 * wave(0.05);

        // In the unit of the eye distance with the origin at the nose tip and
        // y downward.
        let face = [
            (LandmarkName::LeftEyeOuter, -0.5, -0.45),
            (LandmarkName::RightEyeOuter, 0.5, -0.45),
            (LandmarkName::MiddleEyebrow, 0.0, -0.75),
            (LandmarkName::LeftEyebrow, -0.3, -0.95 - eyebrow),
            (LandmarkName::RightEyebrow, 0.3, -0.95 - eyebrow),
            (LandmarkName::LeftEyebrowCorner, -0.55, -0.85 - eyebrow),
            (LandmarkName::RightEyebrowCorner, 0.55, -0.85 - eyebrow),
            (LandmarkName::LeftEyeball, -0.3 + gaze, -0.4),
            (LandmarkName::LeftUpperEyelid, -0.3, -0.45 - eyelid / 2.0),
            (LandmarkName::LeftLowerEyelid, -0.3, -0.45 + eyelid / 2.0),
            (LandmarkName::RightUpperEyelid, 0.3, -0.45 - eyelid / 2.0),
            (LandmarkName::RightLowerEyelid, 0.3, -0.45 + eyelid / 2.0),
            (LandmarkName::UpperLip, 0.0, 0.3),
            (LandmarkName::LowerLip, 0.0, 0.3 + mouth),
            (LandmarkName::LeftUpperMouth, -0.35, 0.3),
            (LandmarkName::RightUpperMouth, 0.35, 0.3),
            (LandmarkName::LeftLowerMouth, -0.3, 0.4 + mouth / 2.0),
            (LandmarkName::RightLowerMouth, 0.3, 0.4 + mouth / 2.0),
            (LandmarkName::LeftUpperCheek, -0.55, 0.05),
            (LandmarkName::LeftLowerCheek, -0.5, 0.35),
            (LandmarkName::RightUpperCheek, 0.55, 0.05),
            (LandmarkName::RightLowerCheek, 0.5, 0.35),
        ];

        // Other landmarks are put at the nose tip.
        let mut points = vec![Self::to_image(&point![0.0, 0.0], roll); NUM_LANDMARK];
        for (name, x, y) in face {
            points[name.index()] = Self::to_image(&point![x, y], roll);
        }

        LandmarkSnapshot::new(points)
    }

    /// Project the point of the face to the image.
    fn to_image(point: &Point2<f64>, roll: f64) -> LandmarkPoint {
        let projected = Rotation2::new(roll) * point.coords * FACE_SCALE
            + Vector2::new(FACE_CENTER.0, FACE_CENTER.1);

        LandmarkPoint::new(projected.x, projected.y, 0.0)
    }

    /// Run the mock vision pipeline.
    ///
    /// # Arguments
    /// * `sender` - Sender to the dispatch process.
    pub fn run(&mut self, sender: SyncSender<DispatchInput>) {
        let period = match Duration::try_from_secs_f64(1.0 / self._frame_rate) {
            Ok(period) => period,
            Err(_) => {
                error!("Mock vision can not run at {} Hz.", self._frame_rate);
                return;
            }
        };

        info!("Mock vision is running at {} Hz.", self._frame_rate);

        let start = Instant::now();
        while !self._stop.load(Ordering::Relaxed) {
            let snapshot = Self::create_snapshot(start.elapsed().as_secs_f64());

            // Drop the frame if the dispatch process is busy.
            if let Err(TrySendError::Disconnected(_)) =
                sender.try_send(DispatchInput::Snapshot(Some(snapshot)))
            {
                break;
            }

            sleep(period);
        }

        info!("Mock vision is stopped.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use std::path::Path;
    use std::sync::mpsc::sync_channel;
    use std::thread::spawn;

    use crate::face::dispatch_scheduler::DispatchScheduler;
    use crate::face::frame_normalizer::FrameNormalizer;
    use crate::face::mapping::MappingTable;
    use crate::mock::mock_transport::MockTransport;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_create_snapshot() {
        let snapshot = MockVision::create_snapshot(0.0);

        assert!(snapshot.is_ready());

        let frame = FrameNormalizer::new(&snapshot).unwrap();

        assert_relative_eq!(frame.roll, 0.0, epsilon = EPSILON);
        assert_relative_eq!(frame.reference_distance, FACE_SCALE, epsilon = EPSILON);
        assert_eq!(frame.anchor, point![FACE_CENTER.0, FACE_CENTER.1]);
    }

    #[test]
    fn test_create_snapshot_roll() {
        // Maximum roll at the quarter period
        let frame = FrameNormalizer::new(&MockVision::create_snapshot(5.0)).unwrap();

        assert_relative_eq!(frame.roll, 0.1, epsilon = EPSILON);
        assert_relative_eq!(frame.reference_distance, FACE_SCALE, epsilon = EPSILON);
    }

    #[test]
    fn test_dispatch_synthetic_face() {
        let mapping_table =
            MappingTable::from_file(Path::new("config/servo_mapping.json")).unwrap();
        let mut scheduler = DispatchScheduler::new(mapping_table, 0);
        let mut transport = MockTransport::new();

        let now = Instant::now();
        let num_first = scheduler
            .process_snapshot_at(
                Some(&MockVision::create_snapshot(0.0)),
                now,
                &mut transport,
            )
            .unwrap();

        assert_eq!(num_first, 19);

        // The mouth moves
        let num_second = scheduler
            .process_snapshot_at(
                Some(&MockVision::create_snapshot(0.5)),
                now + Duration::from_millis(100),
                &mut transport,
            )
            .unwrap();

        assert!(num_second > 0);
    }

    #[test]
    fn test_run() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut mock_vision = MockVision::new(100.0, &stop);

        let (sender, receiver) = sync_channel(1);
        let handle = spawn(move || {
            mock_vision.run(sender);
        });

        let input = receiver.recv_timeout(Duration::from_millis(1000)).unwrap();

        assert!(matches!(input, DispatchInput::Snapshot(Some(_))));

        stop.store(true, Ordering::Relaxed);

        assert!(handle.join().is_ok());
    }

    #[test]
    fn test_run_invalid_frame_rate() {
        let stop = Arc::new(AtomicBool::new(false));

        for frame_rate in [0.0, -30.0, f64::NAN] {
            let mut mock_vision = MockVision::new(frame_rate, &stop);

            let (sender, receiver) = sync_channel(1);
            mock_vision.run(sender);

            assert!(receiver.try_recv().is_err());
        }
    }
}
