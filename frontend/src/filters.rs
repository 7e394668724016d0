//! Pixel scaling kernels.
//!
//! Every kernel implements [`Scaler`] with one fixed signature: scale the
//! RGB565 source region into the destination at its pitch. The three simple
//! kernels keep an inter-frame delta cache of source rows so unchanged rows
//! are skipped; the cache must be cleared whenever the source resolution or
//! the video mode changes, or stale rows bleed into the new frame.
//!
//! The pixel-art family (SuperEagle, 2xSaI, Super2xSaI, HQ2x) is represented
//! here by simplified edge-blend kernels behind the same trait; the exact
//! pixel math of those filters is not a goal of this layer.

/// Scale-and-copy capability. `src` starts at the visible source origin,
/// `dst` at the destination origin; pitches are in pixels.
pub trait Scaler {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    );

    /// Drop any inter-frame delta state. Default: stateless kernel.
    fn clear_delta(&mut self) {}
}

// RGB565 helpers: carry-less average and 50% darken.
const RGB565_AVG_MASK: u16 = 0xF7DE;
const RGB565_HALF_MASK: u16 = 0x7BEF;

#[inline]
fn avg(a: u16, b: u16) -> u16 {
    (a & b).wrapping_add(((a ^ b) & RGB565_AVG_MASK) >> 1)
}

#[inline]
fn dark(p: u16) -> u16 {
    (p >> 1) & RGB565_HALF_MASK
}

/// Per-row copy of the previous frame's source pixels. `changed` both
/// answers and records, so a kernel calls it once per row.
struct DeltaCache {
    rows: Vec<u16>,
    width: usize,
    height: usize,
    valid: bool,
}

impl DeltaCache {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            width: 0,
            height: 0,
            valid: false,
        }
    }

    fn begin_frame(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.rows = vec![0; width * height];
            self.width = width;
            self.height = height;
            self.valid = false;
        }
    }

    fn changed(&mut self, y: usize, row: &[u16]) -> bool {
        let cached = &mut self.rows[y * self.width..(y + 1) * self.width];
        if self.valid && cached == row {
            return false;
        }
        cached.copy_from_slice(row);
        true
    }

    fn end_frame(&mut self) {
        self.valid = true;
    }

    fn clear(&mut self) {
        self.valid = false;
    }
}

/// 1:1 copy, no scaling.
pub struct Simple1x1;

impl Scaler for Simple1x1 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        for y in 0..height {
            dst[y * dst_pitch..y * dst_pitch + width]
                .copy_from_slice(&src[y * src_pitch..y * src_pitch + width]);
        }
    }
}

/// Double horizontally only (tall/interlaced source).
pub struct Simple2x1;

impl Scaler for Simple2x1 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        for y in 0..height {
            let src_row = &src[y * src_pitch..y * src_pitch + width];
            let dst_row = &mut dst[y * dst_pitch..y * dst_pitch + width * 2];
            for (x, &p) in src_row.iter().enumerate() {
                dst_row[x * 2] = p;
                dst_row[x * 2 + 1] = p;
            }
        }
    }
}

/// Double vertically only (hi-res source).
pub struct Simple1x2;

impl Scaler for Simple1x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        for y in 0..height {
            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            a[..width].copy_from_slice(&src[y * src_pitch..y * src_pitch + width]);
            b[..width].copy_from_slice(&src[y * src_pitch..y * src_pitch + width]);
        }
    }
}

/// Double vertically with darkened scanlines.
pub struct Tv1x2;

impl Scaler for Tv1x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        for y in 0..height {
            let src_row = &src[y * src_pitch..y * src_pitch + width];
            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            a[..width].copy_from_slice(src_row);
            for (d, &p) in b[..width].iter_mut().zip(src_row) {
                *d = dark(p);
            }
        }
    }
}

/// Plain nearest-neighbor 2x2 doubling, with delta row skipping.
pub struct Simple2x2 {
    delta: DeltaCache,
}

impl Simple2x2 {
    pub fn new() -> Self {
        Self {
            delta: DeltaCache::new(),
        }
    }
}

impl Scaler for Simple2x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        self.delta.begin_frame(width, height);
        for y in 0..height {
            let src_row = &src[y * src_pitch..y * src_pitch + width];
            if !self.delta.changed(y, src_row) {
                continue;
            }
            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            for (x, &p) in src_row.iter().enumerate() {
                a[x * 2] = p;
                a[x * 2 + 1] = p;
            }
            b[..width * 2].copy_from_slice(&a[..width * 2]);
        }
        self.delta.end_frame();
    }

    fn clear_delta(&mut self) {
        self.delta.clear();
    }
}

/// TV-style 2x2: doubled pixels, second line darkened and vertically
/// blended with the next source row.
pub struct Tv2x2 {
    delta: DeltaCache,
}

impl Tv2x2 {
    pub fn new() -> Self {
        Self {
            delta: DeltaCache::new(),
        }
    }
}

impl Scaler for Tv2x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        self.delta.begin_frame(width, height);
        for y in 0..height {
            let src_row = &src[y * src_pitch..y * src_pitch + width];
            // Scanline blend reads the next row, so a change there dirties
            // this row too. Cheaper to just compare both.
            let next_y = (y + 1).min(height - 1);
            let next_row = &src[next_y * src_pitch..next_y * src_pitch + width];
            let dirty = self.delta.changed(y, src_row);
            if !dirty && y + 1 < height {
                // Still need redraw if the row below changed last frame;
                // the cache for y+1 is updated on its own iteration.
                let cached =
                    &self.delta.rows[(y + 1) * self.delta.width..(y + 2) * self.delta.width];
                if cached == next_row {
                    continue;
                }
            } else if !dirty {
                continue;
            }

            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            for (x, &p) in src_row.iter().enumerate() {
                a[x * 2] = p;
                a[x * 2 + 1] = avg(p, *src_row.get(x + 1).unwrap_or(&p));
                let blended = dark(avg(p, next_row[x]));
                b[x * 2] = blended;
                b[x * 2 + 1] = blended;
            }
        }
        self.delta.end_frame();
    }

    fn clear_delta(&mut self) {
        self.delta.clear();
    }
}

/// Bilinear-style 2x2 smoothing: horizontal and vertical neighbor blends.
pub struct Smooth2x2 {
    delta: DeltaCache,
}

impl Smooth2x2 {
    pub fn new() -> Self {
        Self {
            delta: DeltaCache::new(),
        }
    }
}

impl Scaler for Smooth2x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        self.delta.begin_frame(width, height);
        // Vertical blends couple adjacent rows; the delta cache is only
        // used for whole-frame validity here, not per-row skipping.
        let force = !self.delta.valid;
        let mut any_changed = force;
        for y in 0..height {
            let src_row = &src[y * src_pitch..y * src_pitch + width];
            any_changed |= self.delta.changed(y, src_row);
        }
        self.delta.end_frame();
        if !any_changed {
            return;
        }

        for y in 0..height {
            let src_row = &src[y * src_pitch..y * src_pitch + width];
            let next_y = (y + 1).min(height - 1);
            let next_row = &src[next_y * src_pitch..next_y * src_pitch + width];
            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            for (x, &p) in src_row.iter().enumerate() {
                let right = *src_row.get(x + 1).unwrap_or(&p);
                let down = next_row[x];
                let down_right = *next_row.get(x + 1).unwrap_or(&down);
                a[x * 2] = p;
                a[x * 2 + 1] = avg(p, right);
                b[x * 2] = avg(p, down);
                b[x * 2 + 1] = avg(avg(p, right), avg(down, down_right));
            }
        }
    }

    fn clear_delta(&mut self) {
        self.delta.clear();
    }
}

/// Neighborhood of a source pixel with edge clamping.
#[inline]
fn neighbors(
    src: &[u16],
    src_pitch: usize,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
) -> (u16, u16, u16, u16, u16) {
    let p = src[y * src_pitch + x];
    let up = if y > 0 { src[(y - 1) * src_pitch + x] } else { p };
    let down = if y + 1 < height {
        src[(y + 1) * src_pitch + x]
    } else {
        p
    };
    let left = if x > 0 { src[y * src_pitch + x - 1] } else { p };
    let right = if x + 1 < width { src[y * src_pitch + x + 1] } else { p };
    (p, up, down, left, right)
}

/// EPX / Scale2x edge-preserving doubling.
pub struct Epx2x2;

impl Scaler for Epx2x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        for y in 0..height {
            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            for x in 0..width {
                let (p, up, down, left, right) =
                    neighbors(src, src_pitch, width, height, x, y);

                let (mut e0, mut e1, mut e2, mut e3) = (p, p, p, p);
                if left == up && up != right && left != down {
                    e0 = up;
                }
                if up == right && up != left && right != down {
                    e1 = right;
                }
                if left == down && left != up && down != right {
                    e2 = left;
                }
                if down == right && right != up && left != down {
                    e3 = down;
                }

                a[x * 2] = e0;
                a[x * 2 + 1] = e1;
                b[x * 2] = e2;
                b[x * 2 + 1] = e3;
            }
        }
    }
}

/// Which flavor of edge-blend interpolation an [`Adaptive2x2`] applies.
#[derive(Clone, Copy)]
pub enum AdaptiveFlavor {
    /// SuperEagle-style: hard diagonal fills when a diagonal edge matches.
    Eagle,
    /// 2xSaI-style: blend toward neighbors unless an edge matches.
    Sai,
    /// Super2xSaI-style: heavier blending (two-step averages).
    SuperSai,
    /// HQ2x-style: EPX edges softened by blending instead of hard copies.
    Hq,
}

/// Simplified stand-in for the pixel-art interpolation family. Shares one
/// neighborhood walk; the flavor only changes how edges are filled.
pub struct Adaptive2x2 {
    flavor: AdaptiveFlavor,
}

impl Adaptive2x2 {
    pub fn new(flavor: AdaptiveFlavor) -> Self {
        Self { flavor }
    }
}

impl Scaler for Adaptive2x2 {
    fn blit(
        &mut self,
        src: &[u16],
        src_pitch: usize,
        dst: &mut [u16],
        dst_pitch: usize,
        width: usize,
        height: usize,
    ) {
        for y in 0..height {
            let next_y = (y + 1).min(height - 1);
            let (a, b) = dst[y * 2 * dst_pitch..].split_at_mut(dst_pitch);
            for x in 0..width {
                let (p, up, down, left, right) =
                    neighbors(src, src_pitch, width, height, x, y);
                let down_right = {
                    let nx = (x + 1).min(width - 1);
                    src[next_y * src_pitch + nx]
                };

                let (e0, e1, e2, e3) = match self.flavor {
                    AdaptiveFlavor::Eagle => {
                        // Fill the diagonal solid when it forms an edge.
                        if p == down_right {
                            (p, p, p, p)
                        } else {
                            (p, avg(p, right), avg(p, down), avg(p, down_right))
                        }
                    }
                    AdaptiveFlavor::Sai => (
                        p,
                        if p == up { p } else { avg(p, right) },
                        if p == left { p } else { avg(p, down) },
                        avg(avg(p, right), avg(down, down_right)),
                    ),
                    AdaptiveFlavor::SuperSai => {
                        let h = avg(p, right);
                        let v = avg(p, down);
                        (p, avg(h, p), avg(v, p), avg(h, v))
                    }
                    AdaptiveFlavor::Hq => {
                        let e1 = if up == right && up != left {
                            avg(p, right)
                        } else {
                            p
                        };
                        let e2 = if left == down && left != up {
                            avg(p, down)
                        } else {
                            p
                        };
                        let e3 = if down == right && right != up {
                            avg(p, down_right)
                        } else {
                            p
                        };
                        (p, e1, e2, e3)
                    }
                };

                a[x * 2] = e0;
                a[x * 2 + 1] = e1;
                b[x * 2] = e2;
                b[x * 2 + 1] = e3;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: usize, height: usize, p: u16) -> Vec<u16> {
        vec![p; width * height]
    }

    #[test]
    fn simple2x2_doubles_pixels() {
        let src = vec![1, 2, 3, 4]; // 2x2
        let mut dst = vec![0u16; 4 * 4];
        let mut k = Simple2x2::new();
        k.blit(&src, 2, &mut dst, 4, 2, 2);
        assert_eq!(dst[0..4], [1, 1, 2, 2]);
        assert_eq!(dst[4..8], [1, 1, 2, 2]);
        assert_eq!(dst[8..12], [3, 3, 4, 4]);
        assert_eq!(dst[12..16], [3, 3, 4, 4]);
    }

    #[test]
    fn simple2x1_doubles_width_only() {
        let src = vec![7, 8];
        let mut dst = vec![0u16; 4];
        Simple2x1.blit(&src, 2, &mut dst, 4, 2, 1);
        assert_eq!(dst, [7, 7, 8, 8]);
    }

    #[test]
    fn simple1x2_doubles_height_only() {
        let src = vec![5, 6];
        let mut dst = vec![0u16; 4];
        Simple1x2.blit(&src, 2, &mut dst, 2, 2, 1);
        assert_eq!(dst, [5, 6, 5, 6]);
    }

    #[test]
    fn simple1x1_copies() {
        let src = vec![9, 10, 11, 12];
        let mut dst = vec![0u16; 4];
        Simple1x1.blit(&src, 2, &mut dst, 2, 2, 2);
        assert_eq!(dst, src);
    }

    #[test]
    fn delta_cache_skips_unchanged_rows() {
        let src = solid(4, 4, 0x1234);
        let mut dst = vec![0u16; 8 * 8];
        let mut k = Simple2x2::new();
        k.blit(&src, 4, &mut dst, 8, 4, 4);

        // Deface the destination; an identical second frame must not
        // repaint it because every row is cached.
        dst.fill(0xDEAD);
        k.blit(&src, 4, &mut dst, 8, 4, 4);
        assert!(dst.iter().all(|&p| p == 0xDEAD));

        // After a delta clear the same frame repaints fully.
        k.clear_delta();
        k.blit(&src, 4, &mut dst, 8, 4, 4);
        assert!(dst.iter().all(|&p| p == 0x1234));
    }

    #[test]
    fn delta_cache_repaints_changed_rows() {
        let mut src = solid(4, 2, 1);
        let mut dst = vec![0u16; 8 * 4];
        let mut k = Simple2x2::new();
        k.blit(&src, 4, &mut dst, 8, 4, 2);

        dst.fill(0);
        src[4] = 2; // dirty row 1 only
        k.blit(&src, 4, &mut dst, 8, 4, 2);
        assert!(dst[0..16].iter().all(|&p| p == 0), "row 0 repainted");
        assert_eq!(dst[16], 2);
    }

    #[test]
    fn epx_preserves_solid_regions() {
        let src = solid(4, 4, 0xFFFF);
        let mut dst = vec![0u16; 8 * 8];
        Epx2x2.blit(&src, 4, &mut dst, 8, 4, 4);
        assert!(dst.iter().all(|&p| p == 0xFFFF));
    }

    #[test]
    fn tv_scanlines_are_darker() {
        let src = solid(2, 2, 0xFFFF);
        let mut dst = vec![0u16; 4 * 4];
        let mut k = Tv2x2::new();
        k.blit(&src, 2, &mut dst, 4, 2, 2);
        // Even output lines keep full brightness, odd lines are darkened.
        assert_eq!(dst[0], 0xFFFF);
        assert!(dst[4] < 0xFFFF);
    }

    #[test]
    fn adaptive_kernels_preserve_solid_regions() {
        for flavor in [
            AdaptiveFlavor::Eagle,
            AdaptiveFlavor::Sai,
            AdaptiveFlavor::SuperSai,
            AdaptiveFlavor::Hq,
        ] {
            let src = solid(4, 4, 0xAAAA);
            let mut dst = vec![0u16; 8 * 8];
            Adaptive2x2::new(flavor).blit(&src, 4, &mut dst, 8, 4, 4);
            assert!(dst.iter().all(|&p| p == 0xAAAA));
        }
    }
}
