//! Frame buffer manager: the padded off-screen source buffer the machine
//! renders into, the display surface the blit kernels write to, and the
//! destination geometry kept consistent across windowed/fullscreen
//! configuration. The source buffer lives outside `Display` so a blit can
//! read it while writing the display surface.
//!
//! All pixel data is RGB565, one `u16` per pixel. The destination is a
//! bounds-checked view (offset + pitch) into an owned surface rather than a
//! raw pointer into SDL memory; `flip` uploads the surface to a streaming
//! texture and presents it.

use anyhow::{Context, anyhow, bail};
use chroma_core::{NATIVE_HEIGHT, NATIVE_HEIGHT_EXTENDED, NATIVE_WIDTH};
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};

use crate::blit::BlitTarget;

/// Source row pitch in pixels. The whole pipeline assumes output = source
/// x2, so the source buffer is laid out at the doubled width and the 2x
/// kernels can work without an intermediate buffer.
pub const SOURCE_PITCH: usize = NATIVE_WIDTH * 2;

/// Rows of filter context above (and below) the visible frame. Some kernels
/// read neighboring rows beyond the logical frame.
const BORDER_ROWS: usize = 2;

// Doubled to leave room for interlaced sources, which render up to twice
// the extended height.
const SOURCE_ROWS: usize = (NATIVE_HEIGHT_EXTENDED + 2 * BORDER_ROWS) * 2;

/// Windowed output size: the doubled logical frame, extended height.
pub const WINDOW_WIDTH: u32 = (NATIVE_WIDTH * 2) as u32;
pub const WINDOW_HEIGHT: u32 = (NATIVE_HEIGHT_EXTENDED * 2) as u32;

/// The off-screen render target, with border padding. The machine writes at
/// the visible origin, two full rows into the allocation.
pub struct FrameBuffer {
    buf: Vec<u16>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buf: vec![0; SOURCE_PITCH * SOURCE_ROWS],
        }
    }

    pub fn pitch(&self) -> usize {
        SOURCE_PITCH
    }

    /// Writable visible region, for the machine's renderer.
    pub fn screen_mut(&mut self) -> &mut [u16] {
        &mut self.buf[BORDER_ROWS * SOURCE_PITCH..]
    }

    /// Readable visible region, for the blit kernels.
    pub fn screen(&self) -> &[u16] {
        &self.buf[BORDER_ROWS * SOURCE_PITCH..]
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination placement inside the display surface: origin offset and row
/// pitch, both in pixels. Recomputed on every configure; pure, so the
/// resize/fullscreen invariants are testable without a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestGeometry {
    pub offset: usize,
    pub pitch: usize,
    pub surface_width: usize,
    pub surface_height: usize,
}

impl DestGeometry {
    /// A fullscreen display smaller than the doubled frame cannot hold the
    /// output; that is a configuration error, not something to clamp into
    /// at blit time.
    pub fn compute(
        fullscreen: bool,
        display_width: usize,
        display_height: usize,
    ) -> anyhow::Result<DestGeometry> {
        if !fullscreen {
            // The window is sized to exactly match the doubled frame.
            return Ok(DestGeometry {
                offset: 0,
                pitch: NATIVE_WIDTH * 2,
                surface_width: NATIVE_WIDTH * 2,
                surface_height: NATIVE_HEIGHT_EXTENDED * 2,
            });
        }

        let min_width = NATIVE_WIDTH * 2;
        let min_height = NATIVE_HEIGHT_EXTENDED * 2;
        if display_width < min_width || display_height < min_height {
            bail!(
                "display {display_width}x{display_height} is smaller than the \
                 {min_width}x{min_height} output frame"
            );
        }

        // Center the doubled nominal frame, but never so low that an
        // extended-height frame would run off the bottom of the surface.
        let offset_rows =
            ((display_height - NATIVE_HEIGHT * 2) / 2).min(display_height - min_height);
        let offset_cols = (display_width - min_width) / 2;
        Ok(DestGeometry {
            offset: display_width * offset_rows + offset_cols,
            pitch: display_width,
            surface_width: display_width,
            surface_height: display_height,
        })
    }
}

/// The on-screen half of the pipeline: SDL window/canvas, the owned display
/// surface, and the current destination geometry.
pub struct Display {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    surface: Vec<u16>,
    geometry: DestGeometry,
    fullscreen: bool,
}

impl Display {
    /// Create the window and run the first configure. Any failure here is
    /// fatal to the caller; a half-initialized display pipeline cannot
    /// safely continue.
    pub fn new(
        video: &sdl2::VideoSubsystem,
        title: &str,
        fullscreen: bool,
    ) -> anyhow::Result<Display> {
        let mut builder = video.window(title, WINDOW_WIDTH, WINDOW_HEIGHT);
        builder.position_centered();
        if fullscreen {
            builder.fullscreen_desktop();
        }
        let window = builder.build().context("failed to create window")?;

        let canvas = window
            .into_canvas()
            .accelerated()
            .present_vsync()
            .build()
            .context("failed to create canvas")?;

        let texture_creator = canvas.texture_creator();

        let mut display = Display {
            canvas,
            texture_creator,
            surface: Vec::new(),
            geometry: DestGeometry::compute(false, 0, 0)?,
            fullscreen,
        };
        display.configure()?;
        Ok(display)
    }

    /// Recompute the whole layout from the current output size. The old
    /// buffers are fully released before the new ones are allocated;
    /// callers must not blit between teardown and the end of configure.
    pub fn configure(&mut self) -> anyhow::Result<()> {
        self.teardown();

        let (w, h) = self
            .canvas
            .output_size()
            .map_err(|e| anyhow!("failed to query output size: {e}"))?;
        let geometry = DestGeometry::compute(self.fullscreen, w as usize, h as usize)?;

        self.surface = vec![0; geometry.surface_width * geometry.surface_height];
        self.geometry = geometry;

        log::debug!(
            "display configured: {}x{} offset {} pitch {}",
            geometry.surface_width,
            geometry.surface_height,
            geometry.offset,
            geometry.pitch
        );
        Ok(())
    }

    /// Release the display surface. No blit may run until the next
    /// configure completes.
    pub fn teardown(&mut self) {
        self.surface = Vec::new();
    }

    pub fn geometry(&self) -> DestGeometry {
        self.geometry
    }

    /// Destination-origin view of the display surface, cropped to the
    /// doubled logical frame. Used for screenshots.
    pub fn output_region(&self) -> (&[u16], usize, usize, usize) {
        let width = NATIVE_WIDTH * 2;
        let height = (NATIVE_HEIGHT_EXTENDED * 2).min(self.geometry.surface_height);
        (
            &self.surface[self.geometry.offset..],
            self.geometry.pitch,
            width,
            height,
        )
    }
}

impl BlitTarget for Display {
    fn dest(&mut self) -> (&mut [u16], usize) {
        (&mut self.surface[self.geometry.offset..], self.geometry.pitch)
    }

    fn flip(&mut self) {
        let width = self.geometry.surface_width as u32;
        let height = self.geometry.surface_height as u32;

        let texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB565, width, height);
        let mut texture = match texture {
            Ok(t) => t,
            Err(e) => {
                log::error!("failed to create texture: {e}");
                return;
            }
        };

        let mut bytes = Vec::with_capacity(self.surface.len() * 2);
        for &p in &self.surface {
            bytes.extend_from_slice(&p.to_ne_bytes());
        }

        if let Err(e) = texture.update(None, &bytes, self.geometry.surface_width * 2) {
            log::error!("failed to update texture: {e}");
            return;
        }

        self.canvas.clear();
        if let Err(e) = self.canvas.copy(&texture, None, None) {
            log::error!("failed to copy texture: {e}");
            return;
        }
        self.canvas.present();
    }
}
