//! ABOUTME: In-memory frame source that replays a scripted sequence of fetch results
//! ABOUTME: Drives the watcher in tests and demos without a camera

use crate::{FrameFetch, FrameSource};
use async_trait::async_trait;
use image::RgbImage;
use lo_core::Result;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<FrameFetch>,
    served: usize,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = FrameFetch>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
            served: 0,
        }
    }

    /// Script consisting only of frames
    pub fn from_frames<I: IntoIterator<Item = RgbImage>>(frames: I) -> Self {
        Self::new(frames.into_iter().map(FrameFetch::Frame))
    }

    pub fn push(&mut self, fetch: FrameFetch) {
        self.script.push_back(fetch);
    }

    /// Number of fetches handed out so far, end of stream excluded
    pub fn served(&self) -> usize {
        self.served
    }
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn next_frame(&mut self) -> Result<FrameFetch> {
        match self.script.pop_front() {
            Some(fetch) => {
                self.served += 1;
                Ok(fetch)
            }
            None => Ok(FrameFetch::EndOfStream),
        }
    }

    fn describe(&self) -> String {
        format!("scripted ({} pending)", self.script.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::uniform_frame;

    #[tokio::test]
    async fn test_replays_script_then_ends() {
        let mut source = ScriptedSource::new([
            FrameFetch::Frame(uniform_frame(4, 4, 1)),
            FrameFetch::unavailable("camera busy"),
        ]);
        source.push(FrameFetch::Frame(uniform_frame(4, 4, 2)));

        assert!(matches!(source.next_frame().await.unwrap(), FrameFetch::Frame(_)));
        assert!(matches!(
            source.next_frame().await.unwrap(),
            FrameFetch::Unavailable(_)
        ));
        assert!(matches!(source.next_frame().await.unwrap(), FrameFetch::Frame(_)));
        assert!(matches!(
            source.next_frame().await.unwrap(),
            FrameFetch::EndOfStream
        ));
        assert!(matches!(
            source.next_frame().await.unwrap(),
            FrameFetch::EndOfStream
        ));
        assert_eq!(source.served(), 3);
    }
}
