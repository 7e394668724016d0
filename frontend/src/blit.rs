//! Blit dispatcher: selects a scaling kernel from the configured video mode
//! and the source resolution, runs it, and requests one display flip.
//!
//! Selection is a small state machine over (mode x relative source size):
//!
//! | Source size                      | Kernel                        |
//! |----------------------------------|-------------------------------|
//! | narrow and taller than extended  | double horizontally (2x1)     |
//! | narrow, height within extended   | 2x2 family picked by the mode |
//! | wide, height within extended     | 1x2 (plain, or TV scanlines)  |
//! | wide and tall                    | 1:1 copy                      |
//!
//! The only cross-frame state is the previous source size, used for two
//! dirty-tracking duties: clearing the simple kernels' delta caches when the
//! resolution changes, and zero-filling the destination rows a shrinking
//! frame leaves behind.

use chroma_core::{NATIVE_HEIGHT, NATIVE_HEIGHT_EXTENDED, NATIVE_WIDTH};
use serde::Deserialize;

use crate::filters::{
    Adaptive2x2, AdaptiveFlavor, Epx2x2, Scaler, Simple1x1, Simple1x2, Simple2x1, Simple2x2,
    Smooth2x2, Tv1x2, Tv2x2,
};

/// The configured scaling/filter family, chosen at launch and read every
/// frame. Hot-swapping is allowed; it resets the delta caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoMode {
    Blocky,
    Tv,
    Smooth,
    #[serde(rename = "supereagle")]
    #[value(name = "supereagle")]
    SuperEagle,
    #[serde(rename = "2xsai")]
    #[value(name = "2xsai")]
    TwoXSai,
    #[serde(rename = "super2xsai")]
    #[value(name = "super2xsai")]
    SuperTwoXSai,
    Epx,
    Hq2x,
}

impl VideoMode {
    /// Numeric selector used by the `-v<n>` style CLI shorthand (1-8).
    pub fn from_index(index: u8) -> Option<VideoMode> {
        Some(match index {
            1 => VideoMode::Blocky,
            2 => VideoMode::Tv,
            3 => VideoMode::Smooth,
            4 => VideoMode::SuperEagle,
            5 => VideoMode::TwoXSai,
            6 => VideoMode::SuperTwoXSai,
            7 => VideoMode::Epx,
            8 => VideoMode::Hq2x,
            _ => return None,
        })
    }

    /// The three modes whose kernels keep inter-frame delta caches.
    pub fn is_simple(self) -> bool {
        matches!(self, VideoMode::Blocky | VideoMode::Tv | VideoMode::Smooth)
    }
}

impl Default for VideoMode {
    fn default() -> Self {
        VideoMode::Blocky
    }
}

/// Which kernel a (mode, source size) pair resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalerKind {
    Simple1x1,
    Simple2x1,
    Simple1x2,
    Tv1x2,
    Simple2x2,
    Tv2x2,
    Smooth2x2,
    SuperEagle,
    TwoXSai,
    SuperTwoXSai,
    Epx,
    Hq2x,
}

impl ScalerKind {
    /// Pure selection; every (mode, size) combination lands in a defined
    /// case, with the 1:1 copy as the universal fallback.
    pub fn select(mode: VideoMode, width: usize, height: usize) -> ScalerKind {
        if width <= NATIVE_WIDTH {
            if height > NATIVE_HEIGHT_EXTENDED {
                return ScalerKind::Simple2x1;
            }
            match mode {
                VideoMode::Blocky => ScalerKind::Simple2x2,
                VideoMode::Tv => ScalerKind::Tv2x2,
                VideoMode::Smooth => ScalerKind::Smooth2x2,
                VideoMode::SuperEagle => ScalerKind::SuperEagle,
                VideoMode::TwoXSai => ScalerKind::TwoXSai,
                VideoMode::SuperTwoXSai => ScalerKind::SuperTwoXSai,
                VideoMode::Epx => ScalerKind::Epx,
                VideoMode::Hq2x => ScalerKind::Hq2x,
            }
        } else if height <= NATIVE_HEIGHT_EXTENDED {
            match mode {
                VideoMode::Tv => ScalerKind::Tv1x2,
                _ => ScalerKind::Simple1x2,
            }
        } else {
            ScalerKind::Simple1x1
        }
    }
}

/// Where a blit lands: a writable destination view plus a flip request.
/// The frame buffer manager implements this for the real display; tests
/// implement it over a plain buffer.
pub trait BlitTarget {
    /// Destination origin slice and pitch in pixels. The slice starts at
    /// the (possibly centered) destination origin and stays valid for the
    /// duration of one blit.
    fn dest(&mut self) -> (&mut [u16], usize);

    /// Present the destination surface on screen.
    fn flip(&mut self);
}

/// One kernel instance per mode, owned for the session so delta caches
/// survive across frames.
struct Scalers {
    simple1x1: Simple1x1,
    simple2x1: Simple2x1,
    simple1x2: Simple1x2,
    tv1x2: Tv1x2,
    simple2x2: Simple2x2,
    tv2x2: Tv2x2,
    smooth2x2: Smooth2x2,
    super_eagle: Adaptive2x2,
    two_x_sai: Adaptive2x2,
    super_two_x_sai: Adaptive2x2,
    epx: Epx2x2,
    hq2x: Adaptive2x2,
}

impl Scalers {
    fn new() -> Self {
        Self {
            simple1x1: Simple1x1,
            simple2x1: Simple2x1,
            simple1x2: Simple1x2,
            tv1x2: Tv1x2,
            simple2x2: Simple2x2::new(),
            tv2x2: Tv2x2::new(),
            smooth2x2: Smooth2x2::new(),
            super_eagle: Adaptive2x2::new(AdaptiveFlavor::Eagle),
            two_x_sai: Adaptive2x2::new(AdaptiveFlavor::Sai),
            super_two_x_sai: Adaptive2x2::new(AdaptiveFlavor::SuperSai),
            epx: Epx2x2,
            hq2x: Adaptive2x2::new(AdaptiveFlavor::Hq),
        }
    }

    fn get(&mut self, kind: ScalerKind) -> &mut dyn Scaler {
        match kind {
            ScalerKind::Simple1x1 => &mut self.simple1x1,
            ScalerKind::Simple2x1 => &mut self.simple2x1,
            ScalerKind::Simple1x2 => &mut self.simple1x2,
            ScalerKind::Tv1x2 => &mut self.tv1x2,
            ScalerKind::Simple2x2 => &mut self.simple2x2,
            ScalerKind::Tv2x2 => &mut self.tv2x2,
            ScalerKind::Smooth2x2 => &mut self.smooth2x2,
            ScalerKind::SuperEagle => &mut self.super_eagle,
            ScalerKind::TwoXSai => &mut self.two_x_sai,
            ScalerKind::SuperTwoXSai => &mut self.super_two_x_sai,
            ScalerKind::Epx => &mut self.epx,
            ScalerKind::Hq2x => &mut self.hq2x,
        }
    }

    fn clear_deltas(&mut self) {
        self.simple2x2.clear_delta();
        self.tv2x2.clear_delta();
        self.smooth2x2.clear_delta();
    }
}

pub struct BlitDispatcher {
    mode: VideoMode,
    scalers: Scalers,
    prev_width: usize,
    prev_height: usize,
}

impl BlitDispatcher {
    pub fn new(mode: VideoMode) -> Self {
        Self {
            mode,
            scalers: Scalers::new(),
            prev_width: 0,
            prev_height: 0,
        }
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    /// Hot-swap the video mode. Delta caches become meaningless across a
    /// kernel change, so they are reset here.
    pub fn set_mode(&mut self, mode: VideoMode) {
        if self.mode != mode {
            log::info!("video mode -> {mode:?}");
            self.mode = mode;
            self.scalers.clear_deltas();
        }
    }

    /// Scale the current source frame into the target and flip once.
    ///
    /// `src` starts at the visible source origin with rows `src_pitch`
    /// pixels apart; `width`/`height` are this frame's source size.
    pub fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        target: &mut dyn BlitTarget,
        width: usize,
        height: usize,
    ) {
        let resized = self.prev_width != width || self.prev_height != height;

        // Stale deltas across a resolution change produce visible
        // corruption; the reset must be explicit.
        if self.mode.is_simple() && width <= NATIVE_WIDTH && resized {
            self.scalers.clear_deltas();
        }

        let kind = ScalerKind::select(self.mode, width, height);

        {
            let (dst, dst_pitch) = target.dest();
            self.scalers.get(kind).blit(src, src_pitch, dst, dst_pitch, width, height);

            // A frame shorter than the previous one leaves ghost rows of
            // the taller frame in the destination; zero them down to the
            // maximum doubled height.
            if height < self.prev_height {
                for y in NATIVE_HEIGHT * 2..NATIVE_HEIGHT_EXTENDED * 2 {
                    dst[y * dst_pitch..y * dst_pitch + dst_pitch].fill(0);
                }
            }
        }

        target.flip();

        self.prev_width = width;
        self.prev_height = height;
    }
}
