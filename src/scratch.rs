//! Scratch-off erasure surface
//!
//! The cover of a ticket is an RGBA bitmap. Scratching stamps a brush into
//! the bitmap's alpha channel; once enough of the cover is transparent the
//! surface reports completion, once per reset cycle.
//!
//! Input is polled: the game samples the pointer once per frame while it is
//! held over the surface. A fast drag can leave gaps between samples.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BRUSH_SCALE, ERASE_THRESHOLD};
use crate::signal::{Signal, Subscription};

/// 8-bit RGBA pixel
pub type Rgba8 = [u8; 4];

/// Plain RGBA32 bitmap, row-major with row 0 at the bottom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba8>,
}

impl Texture {
    /// Build from raw pixels; `None` when the buffer does not match the size
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgba8>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Uniformly coloured bitmap
    pub fn solid(width: usize, height: usize, color: Rgba8) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixels: vec![color; width.max(1) * height.max(1)],
        }
    }

    /// Round brush: opaque inside the inscribed circle, transparent outside
    pub fn round_brush(diameter: usize) -> Self {
        let d = diameter.max(1);
        let r = d as f32 / 2.0;
        let mut pixels = Vec::with_capacity(d * d);
        for y in 0..d {
            for x in 0..d {
                let p = Vec2::new(x as f32 + 0.5 - r, y as f32 + 0.5 - r);
                let a = if p.length() <= r { 255 } else { 0 };
                pixels.push([255, 255, 255, a]);
            }
        }
        Self {
            width: d,
            height: d,
            pixels,
        }
    }

    /// Non-empty and the pixel buffer matches the size. Struct literals and
    /// deserialized textures bypass [`Texture::from_pixels`], so consumers
    /// check this before indexing.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.width * self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    fn alpha_at(&self, x: usize, y: usize) -> f32 {
        self.pixels[y * self.width + x][3] as f32 / 255.0
    }

    /// Bilinear alpha sample at normalized (u, v), clamped at the edges
    pub fn sample_alpha_bilinear(&self, u: f32, v: f32) -> f32 {
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let cx = |i: i64| i.clamp(0, max_x) as usize;
        let cy = |i: i64| i.clamp(0, max_y) as usize;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let a00 = self.alpha_at(cx(x0), cy(y0));
        let a10 = self.alpha_at(cx(x0 + 1), cy(y0));
        let a01 = self.alpha_at(cx(x0), cy(y0 + 1));
        let a11 = self.alpha_at(cx(x0 + 1), cy(y0 + 1));

        let bottom = a00 + (a10 - a00) * fx;
        let top = a01 + (a11 - a01) * fx;
        bottom + (top - bottom) * fy
    }
}

/// On-screen placement of the surface (axis aligned)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    /// Centre in screen space
    pub center: Vec2,
    /// Width and height in screen units
    pub size: Vec2,
}

impl DisplayRect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Screen point to rect-local point (origin at the rect centre)
    #[inline]
    pub fn screen_to_local(&self, screen: Vec2) -> Vec2 {
        screen - self.center
    }

    /// Whether a rect-local point lies inside the rect
    pub fn contains_local(&self, local: Vec2) -> bool {
        let half = self.size / 2.0;
        local.x >= -half.x && local.x <= half.x && local.y >= -half.y && local.y <= half.y
    }

    /// Rect-local point to (fractional) pixel coordinates of a bitmap
    pub fn local_to_pixel(&self, local: Vec2, width: usize, height: usize) -> Vec2 {
        let x = (local.x + self.size.x / 2.0) * (width as f32 / self.size.x);
        let y = (local.y + self.size.y / 2.0) * (height as f32 / self.size.y);
        Vec2::new(x, y)
    }
}

/// Tunables for a scratch surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchSettings {
    /// Brush size multiplier
    pub brush_scale: f32,
    /// Erased fraction at which the surface counts as scratched
    pub threshold: f32,
}

impl Default for ScratchSettings {
    fn default() -> Self {
        Self {
            brush_scale: DEFAULT_BRUSH_SCALE,
            threshold: ERASE_THRESHOLD,
        }
    }
}

/// Alpha state of the cover bitmap
#[derive(Debug, Clone)]
pub struct AlphaMask {
    width: usize,
    height: usize,
    original: Vec<Rgba8>,
    pixels: Vec<Rgba8>,
    transparent: usize,
}

impl AlphaMask {
    /// Cover built from `source` with every pixel fully opaque; colour is kept
    pub fn new(source: &Texture) -> Self {
        let original: Vec<Rgba8> = source.pixels.iter().map(|&[r, g, b, _]| [r, g, b, 255]).collect();
        Self {
            width: source.width,
            height: source.height,
            pixels: original.clone(),
            original,
            transparent: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total(&self) -> usize {
        self.width * self.height
    }

    /// Pixels made transparent by scratching since the last reset
    pub fn transparent(&self) -> usize {
        self.transparent
    }

    pub fn erased_fraction(&self) -> f32 {
        self.transparent as f32 / self.total() as f32
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    pub fn alpha(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x][3]
    }

    /// Clear one pixel's alpha. Returns whether it was still visible.
    #[inline]
    fn erase(&mut self, x: usize, y: usize) -> bool {
        let px = &mut self.pixels[y * self.width + x];
        if px[3] != 0 {
            px[3] = 0;
            self.transparent += 1;
            true
        } else {
            false
        }
    }

    /// Restore the cover, fully opaque
    pub fn reset(&mut self) {
        self.pixels.copy_from_slice(&self.original);
        self.transparent = 0;
    }
}

/// A scratchable ticket cover
#[derive(Debug)]
pub struct ErasureSurface {
    rect: DisplayRect,
    brush: Texture,
    settings: ScratchSettings,
    mask: Option<AlphaMask>,
    completed: bool,
    active: bool,
    on_completed: Signal<()>,
}

impl ErasureSurface {
    /// Create a surface with no cover yet; see [`ErasureSurface::set_texture`]
    pub fn new(rect: DisplayRect, brush: Texture, settings: ScratchSettings) -> Self {
        let brush = if brush.is_valid() {
            brush
        } else {
            log::warn!(
                "Invalid {}x{} brush with {} pixels, using a single pixel brush",
                brush.width,
                brush.height,
                brush.pixels.len()
            );
            Texture::solid(1, 1, [255, 255, 255, 255])
        };
        Self {
            rect,
            brush,
            settings,
            mask: None,
            completed: false,
            active: false,
            on_completed: Signal::new(),
        }
    }

    /// Install (or replace) the cover bitmap. Resets the completion cycle.
    ///
    /// An invalid cover is logged and skipped, leaving the previous cover in
    /// place. Returns whether the cover was installed.
    pub fn set_texture(&mut self, cover: &Texture) -> bool {
        if !cover.is_valid() {
            log::warn!(
                "Ignoring invalid {}x{} cover with {} pixels",
                cover.width,
                cover.height,
                cover.pixels.len()
            );
            return false;
        }
        self.mask = Some(AlphaMask::new(cover));
        self.completed = false;
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.mask.is_some()
    }

    pub fn mask(&self) -> Option<&AlphaMask> {
        self.mask.as_ref()
    }

    pub fn rect(&self) -> DisplayRect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: DisplayRect) {
        self.rect = rect;
    }

    pub fn settings(&self) -> ScratchSettings {
        self.settings
    }

    pub fn transparent_count(&self) -> usize {
        self.mask.as_ref().map_or(0, AlphaMask::transparent)
    }

    pub fn erased_fraction(&self) -> f32 {
        self.mask.as_ref().map_or(0.0, AlphaMask::erased_fraction)
    }

    /// Whether completion already fired in this reset cycle
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Scratching is only accepted while the surface is revealed
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Observe threshold crossings
    pub fn on_completed(&self, listener: impl FnMut(&()) + 'static) -> Subscription {
        self.on_completed.subscribe(listener)
    }

    pub fn completion_listeners(&self) -> usize {
        self.on_completed.listener_count()
    }

    /// Stamp the brush at a rect-local position.
    ///
    /// Returns `true` only on the application that crosses the threshold.
    pub fn apply_brush(&mut self, local: Vec2) -> bool {
        let Some(mask) = self.mask.as_mut() else {
            log::warn!("apply_brush on a surface without a cover texture");
            return false;
        };

        let (w, h) = (mask.width(), mask.height());
        let p = self.rect.local_to_pixel(local, w, h);

        let bw = ((self.brush.width as f32 * self.settings.brush_scale).round() as usize).clamp(1, w);
        let bh = ((self.brush.height as f32 * self.settings.brush_scale).round() as usize).clamp(1, h);

        let bx = (p.x as i64 - (bw / 2) as i64).clamp(0, (w - bw) as i64) as usize;
        let by = (p.y as i64 - (bh / 2) as i64).clamp(0, (h - bh) as i64) as usize;

        for i in 0..bw {
            for j in 0..bh {
                let u = i as f32 / bw as f32;
                let v = j as f32 / bh as f32;
                if self.brush.sample_alpha_bilinear(u, v) > 0.0 {
                    mask.erase(bx + i, by + j);
                }
            }
        }

        self.check_threshold()
    }

    fn check_threshold(&mut self) -> bool {
        let fraction = self.erased_fraction();
        if !self.completed && fraction >= self.settings.threshold {
            self.completed = true;
            log::debug!("Scratch surface erased {:.0}%", fraction * 100.0);
            self.on_completed.emit(&());
            return true;
        }
        false
    }

    /// Per-frame pointer sample in screen space.
    ///
    /// Scratches when the pointer is held, the surface is active and the
    /// point lies within the display rect.
    pub fn poll(&mut self, pointer_screen: Vec2, held: bool) -> bool {
        if !held || !self.active {
            return false;
        }
        let local = self.rect.screen_to_local(pointer_screen);
        if !self.rect.contains_local(local) {
            return false;
        }
        self.apply_brush(local)
    }

    /// Restore the cover and start a new completion cycle.
    /// Does nothing before a cover has been installed.
    pub fn reset_texture(&mut self) {
        if let Some(mask) = self.mask.as_mut() {
            mask.reset();
        }
        self.completed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const OPAQUE: Rgba8 = [200, 180, 40, 255];

    fn surface(cover: usize, brush: usize, threshold: f32) -> ErasureSurface {
        let rect = DisplayRect::new(Vec2::ZERO, Vec2::splat(cover as f32));
        let mut s = ErasureSurface::new(
            rect,
            Texture::solid(brush, brush, [255, 255, 255, 255]),
            ScratchSettings {
                brush_scale: 1.0,
                threshold,
            },
        );
        s.set_texture(&Texture::solid(cover, cover, OPAQUE));
        s
    }

    #[test]
    fn test_cover_with_transparent_holes_can_complete() {
        let mut pixels = vec![OPAQUE; 100];
        for px in pixels.iter_mut().take(11) {
            *px = [0, 0, 0, 0];
        }
        let cover = Texture::from_pixels(10, 10, pixels).unwrap();
        let mut s = surface(10, 10, 0.9);
        assert!(s.set_texture(&cover));
        assert!(s.mask().unwrap().pixels().iter().all(|px| px[3] == 255));
        assert_eq!(s.mask().unwrap().pixels()[0], [0, 0, 0, 255]);

        assert!(s.apply_brush(Vec2::ZERO));
        assert_eq!(s.transparent_count(), 100);

        s.reset_texture();
        assert_eq!(s.transparent_count(), 0);
        assert!(s.mask().unwrap().pixels().iter().all(|px| px[3] == 255));
    }

    #[test]
    fn test_invalid_cover_is_skipped() {
        let mut s = surface(10, 4, 0.9);
        let empty = Texture {
            width: 0,
            height: 0,
            pixels: vec![],
        };
        assert!(!s.set_texture(&empty));
        let short = Texture {
            width: 4,
            height: 4,
            pixels: vec![OPAQUE; 3],
        };
        assert!(!s.set_texture(&short));
        // Previous cover stays usable
        assert_eq!(s.mask().unwrap().total(), 100);
        s.apply_brush(Vec2::ZERO);
        assert_eq!(s.transparent_count(), 16);

        let mut bare = ErasureSurface::new(
            DisplayRect::new(Vec2::ZERO, Vec2::splat(10.0)),
            Texture::solid(4, 4, [255, 255, 255, 255]),
            ScratchSettings::default(),
        );
        assert!(!bare.set_texture(&empty));
        assert!(!bare.is_initialized());
        assert!(!bare.apply_brush(Vec2::ZERO));
    }

    #[test]
    fn test_invalid_brush_falls_back_to_single_pixel() {
        let mut s = ErasureSurface::new(
            DisplayRect::new(Vec2::ZERO, Vec2::splat(10.0)),
            Texture {
                width: 0,
                height: 0,
                pixels: vec![],
            },
            ScratchSettings {
                brush_scale: 1.0,
                threshold: 0.9,
            },
        );
        s.set_texture(&Texture::solid(10, 10, OPAQUE));
        s.apply_brush(Vec2::ZERO);
        assert_eq!(s.transparent_count(), 1);
    }

    #[test]
    fn test_overlapping_brush_counts_pixels_once() {
        let mut s = surface(20, 4, 0.9);
        s.apply_brush(Vec2::ZERO);
        assert_eq!(s.transparent_count(), 16);
        s.apply_brush(Vec2::ZERO);
        assert_eq!(s.transparent_count(), 16);
        // Half overlap adds only the new column pair
        s.apply_brush(Vec2::new(2.0, 0.0));
        assert_eq!(s.transparent_count(), 24);
    }

    #[test]
    fn test_brush_clamped_inside_mask() {
        let mut s = surface(10, 4, 0.9);
        // Far outside the bottom-left corner still stamps a full brush
        s.apply_brush(Vec2::new(-100.0, -100.0));
        assert_eq!(s.transparent_count(), 16);
        let mask = s.mask().unwrap();
        assert_eq!(mask.alpha(0, 0), 0);
        assert_eq!(mask.alpha(3, 3), 0);
        assert_eq!(mask.alpha(4, 4), 255);
    }

    #[test]
    fn test_transparent_brush_pixels_do_not_erase() {
        let rect = DisplayRect::new(Vec2::ZERO, Vec2::splat(16.0));
        let mut s = ErasureSurface::new(
            rect,
            Texture::solid(4, 4, [0, 0, 0, 0]),
            ScratchSettings::default(),
        );
        s.set_texture(&Texture::solid(16, 16, OPAQUE));
        s.apply_brush(Vec2::ZERO);
        assert_eq!(s.transparent_count(), 0);
    }

    #[test]
    fn test_round_brush_erases_less_than_square() {
        let rect = DisplayRect::new(Vec2::ZERO, Vec2::splat(64.0));
        let mut s = ErasureSurface::new(rect, Texture::round_brush(16), ScratchSettings::default());
        s.set_texture(&Texture::solid(64, 64, OPAQUE));
        s.apply_brush(Vec2::ZERO);
        let erased = s.transparent_count();
        assert!(erased > 0 && erased < 16 * 16, "erased {}", erased);
    }

    #[test]
    fn test_completion_fires_once_per_cycle() {
        let mut s = surface(4, 4, 0.9);
        let fired = Rc::new(Cell::new(0));
        let f = Rc::clone(&fired);
        let _sub = s.on_completed(move |_| f.set(f.get() + 1));

        assert!(s.apply_brush(Vec2::ZERO));
        assert!(!s.apply_brush(Vec2::ZERO));
        assert!(!s.apply_brush(Vec2::new(1.0, 1.0)));
        assert_eq!(fired.get(), 1);

        s.reset_texture();
        assert_eq!(s.transparent_count(), 0);
        assert!(s.apply_brush(Vec2::ZERO));
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_threshold_crossed_gradually() {
        // 10x10 cover, 5x5 brush: four stamps cover everything
        let mut s = surface(10, 5, 0.8);
        assert!(!s.apply_brush(Vec2::new(-3.0, -3.0)));
        assert!(!s.apply_brush(Vec2::new(3.0, -3.0)));
        assert!(!s.apply_brush(Vec2::new(-3.0, 3.0)));
        assert_eq!(s.transparent_count(), 75);
        assert!(s.apply_brush(Vec2::new(3.0, 3.0)));
        assert!(s.is_completed());
    }

    #[test]
    fn test_reset_before_initialization_is_noop() {
        let rect = DisplayRect::new(Vec2::ZERO, Vec2::splat(8.0));
        let mut s = ErasureSurface::new(rect, Texture::solid(2, 2, OPAQUE), ScratchSettings::default());
        s.reset_texture();
        assert!(!s.is_initialized());
        assert!(!s.apply_brush(Vec2::ZERO));
        assert_eq!(s.transparent_count(), 0);
    }

    #[test]
    fn test_poll_requires_active_held_and_inside() {
        let mut s = surface(10, 2, 0.9);
        let center = Vec2::ZERO;
        assert!(!s.poll(center, true));
        assert_eq!(s.transparent_count(), 0);

        s.set_active(true);
        s.poll(center, false);
        assert_eq!(s.transparent_count(), 0);

        s.poll(Vec2::new(50.0, 0.0), true);
        assert_eq!(s.transparent_count(), 0);

        s.poll(center, true);
        assert_eq!(s.transparent_count(), 4);
    }

    #[test]
    fn test_screen_to_pixel_mapping() {
        let rect = DisplayRect::new(Vec2::new(100.0, 50.0), Vec2::new(200.0, 100.0));
        let local = rect.screen_to_local(Vec2::new(100.0, 50.0));
        let p = rect.local_to_pixel(local, 400, 200);
        assert_eq!(p, Vec2::new(200.0, 100.0));
        let corner = rect.local_to_pixel(Vec2::new(-100.0, -50.0), 400, 200);
        assert_eq!(corner, Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_count_matches_mask_and_reset_clears(
            points in proptest::collection::vec((-12.0f32..12.0, -12.0f32..12.0), 1..40),
        ) {
            let mut s = surface(24, 3, 1.1);
            for (x, y) in points {
                let before = s.transparent_count();
                s.apply_brush(Vec2::new(x, y));
                prop_assert!(s.transparent_count() >= before);
            }
            let mask = s.mask().unwrap();
            let zero_alpha = mask.pixels().iter().filter(|p| p[3] == 0).count();
            prop_assert_eq!(zero_alpha, s.transparent_count());

            s.reset_texture();
            prop_assert_eq!(s.transparent_count(), 0);
            prop_assert!(s.mask().unwrap().pixels().iter().all(|p| p[3] == 255));
        }
    }
}
