//! ABOUTME: The Watcher control loop and its run summary
//! ABOUTME: Strictly sequential iterations: acquire, analyse, write artifacts, check capacity

use crate::WatchConfig;
use image::DynamicImage;
use lo_capture::{CaptureConfig, FrameFetch, FrameSource, RetryPolicy};
use lo_core::{time::now_label, Error, Result};
use lo_storage::{
    ArtifactRole, ArtifactStore, ArtifactWriter, CapacityGuard, PersistencePolicy, StorageConfig,
};
use lo_vision::{FrameAnalysis, MotionDetector};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Why a run ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The save directory reached its file ceiling
    CapacityReached,
    /// The frame source ran out of frames
    EndOfStream,
    /// `watch.max_frames` frames were analysed
    FrameLimit,
}

/// Counters reported when the loop stops gracefully
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Frames analysed after the background model was seeded
    pub frames_processed: u64,
    /// Iterations without a usable frame
    pub frames_skipped: u64,
    pub motion_frames: u64,
    pub artifacts_written: u64,
    pub stop_reason: StopReason,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            frames_processed: 0,
            frames_skipped: 0,
            motion_frames: 0,
            artifacts_written: 0,
            stop_reason: StopReason::EndOfStream,
        }
    }
}

/// Owns the single detector instance and drives it frame by frame
pub struct Watcher<S> {
    detector: MotionDetector,
    source: Box<dyn FrameSource>,
    writer: ArtifactWriter<S>,
    policy: PersistencePolicy,
    retry: RetryPolicy,
    startup_attempts: u32,
    file_limit: usize,
    rescan_interval: u64,
    settings: WatchConfig,
    last_label: Option<String>,
}

impl<S> Watcher<S>
where
    S: ArtifactStore,
{
    pub fn new(
        detector: MotionDetector,
        source: Box<dyn FrameSource>,
        store: S,
        capture: &CaptureConfig,
        storage: &StorageConfig,
        settings: WatchConfig,
    ) -> Self {
        Self {
            detector,
            source,
            writer: ArtifactWriter::new(store, storage.jpeg_quality),
            policy: PersistencePolicy::new(storage.debug_level),
            retry: RetryPolicy::from_config(capture),
            startup_attempts: capture.startup_attempts.max(1),
            file_limit: storage.file_limit,
            rescan_interval: storage.rescan_interval,
            settings,
            last_label: None,
        }
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    /// Run until the source ends, the frame limit is hit, or the directory is full
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        let delay = self.settings.startup_delay();
        if !delay.is_zero() {
            info!(delay_secs = delay.as_secs(), "Waiting before first acquisition");
            tokio::time::sleep(delay).await;
        }

        let mut summary = RunSummary::new();
        let mut guard =
            CapacityGuard::open(self.writer.store(), self.file_limit, self.rescan_interval).await?;
        if guard.is_full() {
            info!(
                entries = guard.entries(),
                ceiling = guard.ceiling(),
                "Save directory already at its file limit"
            );
            summary.stop_reason = StopReason::CapacityReached;
            return Ok(summary);
        }

        self.initialize().await?;

        loop {
            if let Some(limit) = self.settings.frame_limit() {
                if summary.frames_processed >= limit {
                    summary.stop_reason = StopReason::FrameLimit;
                    break;
                }
            }
            if guard.is_full() {
                summary.stop_reason = StopReason::CapacityReached;
                break;
            }

            let frame = match self.source.next_frame().await? {
                FrameFetch::Frame(frame) => frame,
                FrameFetch::EndOfStream => {
                    summary.stop_reason = StopReason::EndOfStream;
                    break;
                }
                FrameFetch::Unavailable(reason) => {
                    summary.frames_skipped += 1;
                    counter!("lookout_frames_skipped_total").increment(1);

                    let wait = self.retry.record_failure();
                    if self.retry.exhausted() {
                        return Err(Error::SourceStalled {
                            consecutive_failures: self.retry.consecutive_failures(),
                        });
                    }
                    warn!(
                        reason = %reason,
                        retry_in_ms = wait.as_millis() as u64,
                        "Frame unavailable, skipping iteration"
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };
            self.retry.record_success();

            let label = self.next_label();
            let analysis = self.detector.process(&frame)?;
            summary.frames_processed += 1;
            counter!("lookout_frames_processed_total").increment(1);

            if analysis.motion_detected {
                summary.motion_frames += 1;
                counter!("lookout_motion_frames_total").increment(1);
                info!(
                    label = %label,
                    largest_area = analysis.largest_area,
                    "Motion detected"
                );
            }

            for role in self.policy.plan(analysis.motion_detected) {
                let image = artifact_image(&analysis, role);
                self.writer.write(&label, role, &image).await?;
                guard.record_write();
                summary.artifacts_written += 1;
                counter!("lookout_artifacts_written_total").increment(1);
            }

            if guard.check(self.writer.store()).await?.is_reached() {
                summary.stop_reason = StopReason::CapacityReached;
                break;
            }
        }

        info!(
            frames_processed = summary.frames_processed,
            frames_skipped = summary.frames_skipped,
            motion_frames = summary.motion_frames,
            artifacts_written = summary.artifacts_written,
            stop_reason = ?summary.stop_reason,
            "Watcher stopped"
        );
        Ok(summary)
    }

    /// Seed the background model from the first frame the source delivers
    async fn initialize(&mut self) -> Result<()> {
        let mut attempts = 0;
        while attempts < self.startup_attempts {
            attempts += 1;
            match self.source.next_frame().await? {
                FrameFetch::Frame(frame) => {
                    self.detector.initialize(&frame)?;
                    self.retry.record_success();
                    return Ok(());
                }
                FrameFetch::EndOfStream => break,
                FrameFetch::Unavailable(reason) => {
                    warn!(attempt = attempts, reason = %reason, "No startup frame yet");
                    if attempts < self.startup_attempts {
                        tokio::time::sleep(self.retry.record_failure()).await;
                    }
                }
            }
        }
        Err(Error::StartupFrameUnavailable { attempts })
    }

    /// Timestamp label for the current iteration, distinct from the previous one
    fn next_label(&mut self) -> String {
        let mut label = now_label();
        while self.last_label.as_deref() == Some(label.as_str()) {
            std::hint::spin_loop();
            label = now_label();
        }
        debug!(label = %label, "Iteration label");
        self.last_label = Some(label.clone());
        label
    }
}

fn artifact_image(analysis: &FrameAnalysis, role: ArtifactRole) -> DynamicImage {
    match role {
        ArtifactRole::Color => DynamicImage::ImageRgb8(analysis.color.clone()),
        ArtifactRole::Gray => DynamicImage::ImageLuma8(analysis.gray.clone()),
        ArtifactRole::Delta => DynamicImage::ImageLuma8(analysis.delta.clone()),
        ArtifactRole::Thresh => DynamicImage::ImageLuma8(analysis.threshold.clone()),
        ArtifactRole::Average => DynamicImage::ImageLuma8(analysis.average.clone()),
    }
}
