//! ABOUTME: Camera frame source that runs an external still-capture command per frame
//! ABOUTME: Decodes the command's stdout; failures and timeouts become unavailable frames

use crate::{FrameFetch, FrameSource};
use async_trait::async_trait;
use lo_core::{Error, Result};
use metrics::counter;
use std::{
    process::Stdio,
    time::{Duration, Instant},
};
use tokio::{process::Command, time::timeout};
use tracing::{debug, instrument, warn};

/// Bytes of stderr kept for log messages
const STDERR_LOG_LIMIT: usize = 512;

/// Runs e.g. `libcamera-still -n -o -` or
/// `ffmpeg -rtsp_transport tcp -i URL -frames:v 1 -f image2pipe -vcodec mjpeg -`
/// and decodes whatever image arrives on stdout.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSource {
    /// `argv` is the program followed by its arguments
    pub fn new(argv: Vec<String>, timeout: Duration) -> Result<Self> {
        let mut parts = argv.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::Config("Capture command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    async fn capture(&self) -> std::result::Result<Vec<u8>, String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {}", self.program, e))?;

        // On timeout the child is dropped and killed
        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| format!("timed out after {}ms", self.timeout.as_millis()))?
            .map_err(|e| format!("failed to wait for {}: {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(STDERR_LOG_LIMIT).collect();
            return Err(format!("exited with {}: {}", output.status, stderr));
        }
        if output.stdout.is_empty() {
            return Err("command produced no output".to_string());
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl FrameSource for CommandSource {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn next_frame(&mut self) -> Result<FrameFetch> {
        let start = Instant::now();

        let data = match self.capture().await {
            Ok(data) => data,
            Err(reason) => {
                counter!("lookout_capture_failures_total").increment(1);
                warn!(reason = %reason, "Capture command failed");
                return Ok(FrameFetch::Unavailable(reason));
            }
        };

        match image::load_from_memory(&data) {
            Ok(img) => {
                debug!(
                    bytes = data.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Frame captured"
                );
                Ok(FrameFetch::Frame(img.to_rgb8()))
            }
            Err(e) => {
                counter!("lookout_capture_failures_total").increment(1);
                warn!(error = %e, bytes = data.len(), "Capture output is not a decodable image");
                Ok(FrameFetch::unavailable(format!("decode failed: {}", e)))
            }
        }
    }

    fn describe(&self) -> String {
        format!("command:{} {}", self.program, self.args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSource {
        CommandSource::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandSource::new(vec![], Duration::from_secs(1)).is_err());
        assert!(CommandSource::new(vec![" ".to_string()], Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_argv_split() {
        let source = CommandSource::new(
            vec!["libcamera-still".into(), "-n".into(), "-o".into(), "-".into()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(source.program(), "libcamera-still");
        assert_eq!(source.args(), &["-n", "-o", "-"]);
    }

    #[tokio::test]
    async fn test_decodes_stdout_image() {
        let dir = test_support::scratch_dir();
        let path = dir.path().join("frame.png");
        test_support::uniform_frame(12, 9, 77).save(&path).unwrap();

        let mut source = sh(&format!("cat '{}'", path.display()));
        match source.next_frame().await.unwrap() {
            FrameFetch::Frame(img) => {
                assert_eq!(img.dimensions(), (12, 9));
                assert_eq!(img.get_pixel(3, 3).0, [77, 77, 77]);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_command_is_unavailable() {
        let mut source = sh("echo boom >&2; exit 3");
        match source.next_frame().await.unwrap() {
            FrameFetch::Unavailable(reason) => assert!(reason.contains("boom")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbage_output_is_unavailable() {
        let mut source = sh("echo not-an-image");
        assert!(matches!(
            source.next_frame().await.unwrap(),
            FrameFetch::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let mut source = CommandSource::new(
            vec!["sleep".to_string(), "5".to_string()],
            Duration::from_millis(100),
        )
        .unwrap();
        match source.next_frame().await.unwrap() {
            FrameFetch::Unavailable(reason) => assert!(reason.contains("timed out")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let mut source = CommandSource::new(
            vec!["/nonexistent/lookout-camera".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(
            source.next_frame().await.unwrap(),
            FrameFetch::Unavailable(_)
        ));
    }
}
