/// Stages every frame goes through, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameStage {
    /// Waiting for the next redraw.
    #[default]
    Idle,

    /// Compute stage writes the output image.
    Compute,

    /// Image writes become visible to the render stage.
    Barrier,

    /// Render stage samples the image onto the quad.
    Render,

    /// Frame is handed over for presentation.
    Present,
}

impl FrameStage {
    pub fn next(self) -> Self {
        match self {
            FrameStage::Idle => FrameStage::Compute,
            FrameStage::Compute => FrameStage::Barrier,
            FrameStage::Barrier => FrameStage::Render,
            FrameStage::Render => FrameStage::Present,
            FrameStage::Present => FrameStage::Idle,
        }
    }
}

/// Tracks the current [`FrameStage`] and the number of completed frames.
#[derive(Debug, Default)]
pub struct FrameLoop {
    stage: FrameStage,
    frames: u64,
}

impl FrameLoop {
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Moves to `stage`, which must directly follow the current one.
    pub fn enter(&mut self, stage: FrameStage) {
        debug_assert_eq!(
            self.stage.next(),
            stage,
            "frame stage entered out of order"
        );

        self.stage = stage;
    }

    /// Returns to [`FrameStage::Idle`]; yields whether the frame got as far
    /// as [`FrameStage::Present`] (it doesn't when the surface couldn't be
    /// acquired).
    pub fn finish(&mut self) -> bool {
        let presented = self.stage == FrameStage::Present;

        if presented {
            self.frames += 1;
        } else {
            debug_assert_eq!(
                self.stage,
                FrameStage::Idle,
                "frame abandoned mid-way"
            );
        }

        self.stage = FrameStage::Idle;

        presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_cycle() {
        let mut stage = FrameStage::Idle;
        let mut seen = Vec::new();

        for _ in 0..10 {
            stage = stage.next();
            seen.push(stage);
        }

        assert_eq!(
            seen,
            [
                FrameStage::Compute,
                FrameStage::Barrier,
                FrameStage::Render,
                FrameStage::Present,
                FrameStage::Idle,
                FrameStage::Compute,
                FrameStage::Barrier,
                FrameStage::Render,
                FrameStage::Present,
                FrameStage::Idle,
            ]
        );
    }

    #[test]
    fn counts_presented_frames() {
        let mut frame = FrameLoop::default();

        for _ in 0..3 {
            frame.enter(FrameStage::Compute);
            frame.enter(FrameStage::Barrier);
            frame.enter(FrameStage::Render);
            frame.enter(FrameStage::Present);

            assert!(frame.finish());
            assert_eq!(frame.stage(), FrameStage::Idle);
        }

        assert_eq!(frame.frames(), 3);
    }

    #[test]
    fn dropped_frame_is_not_counted() {
        let mut frame = FrameLoop::default();

        assert!(!frame.finish());
        assert_eq!(frame.frames(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of order")]
    fn barrier_cannot_be_skipped() {
        let mut frame = FrameLoop::default();

        frame.enter(FrameStage::Compute);
        frame.enter(FrameStage::Render);
    }
}
