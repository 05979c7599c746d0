use std::collections::HashMap;

use image::{GenericImageView, Pixel};
use log::debug;
use palette::Srgb;
use serde::Serialize;

use crate::color::ColorEntry;

pub const DEFAULT_MAX_COLORS: usize = 20;
pub const DEFAULT_GRID_DIVISOR: u32 = 50;

/// Read access to decoded image data: dimensions plus the RGB triple at a coordinate.
pub trait PixelBuffer {
    fn dimensions(&self) -> (u32, u32);

    /// Caller guarantees `x < width` and `y < height`.
    fn rgb_at(&self, x: u32, y: u32) -> Srgb<u8>;
}

impl<I> PixelBuffer for I
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn rgb_at(&self, x: u32, y: u32) -> Srgb<u8> {
        let [r, g, b] = self.get_pixel(x, y).to_rgb().0;
        Srgb::new(r, g, b)
    }
}

/// Ranked result of one extraction.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Palette {
    colors: Vec<ColorEntry>,
    sample_step: u32,
    samples: u64,
}

impl Palette {
    pub fn colors(&self) -> &[ColorEntry] {
        &self.colors
    }

    pub fn into_colors(self) -> Vec<ColorEntry> {
        self.colors
    }

    pub fn sample_step(&self) -> u32 {
        self.sample_step
    }

    /// Number of grid points read, including those whose color was cut from the top N.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn most_common(&self) -> Option<&ColorEntry> {
        self.colors.first()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Sampler {
    max_colors: usize,
    grid_divisor: u32,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            grid_divisor: DEFAULT_GRID_DIVISOR,
        }
    }
}

impl Sampler {
    pub fn max_colors(self, max_colors: usize) -> Self {
        Self {
            max_colors: max_colors.max(1),
            ..self
        }
    }

    /// The shorter image side is divided by this to get the sampling stride.
    pub fn grid_divisor(self, grid_divisor: u32) -> Self {
        Self {
            grid_divisor: grid_divisor.max(1),
            ..self
        }
    }

    pub fn sample_step(&self, width: u32, height: u32) -> u32 {
        (width.min(height) / self.grid_divisor).max(1)
    }

    /// Walk the sample grid (x outer, y inner), tally colors in first-seen
    /// order, then stable-sort by count and keep the top `max_colors`.
    pub fn extract<B: PixelBuffer + ?Sized>(&self, buffer: &B) -> Palette {
        let (width, height) = buffer.dimensions();
        let step = self.sample_step(width, height);

        let mut tally = Tally::default();
        for x in (0..width).step_by(step as usize) {
            for y in (0..height).step_by(step as usize) {
                tally.record(buffer.rgb_at(x, y));
            }
        }

        let Tally { mut entries, samples, .. } = tally;
        debug!(
            "sampled {width}x{height} image every {step}px: {samples} samples, {} distinct colors",
            entries.len()
        );

        // sort_by is stable, so equal counts keep scan order
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(self.max_colors);

        Palette {
            colors: entries,
            sample_step: step,
            samples,
        }
    }
}

/// Per-color counts in first-seen order.
#[derive(Default)]
struct Tally {
    index: HashMap<[u8; 3], usize>,
    entries: Vec<ColorEntry>,
    samples: u64,
}

impl Tally {
    fn record(&mut self, rgb: Srgb<u8>) {
        self.samples += 1;
        match self.index.get(&[rgb.red, rgb.green, rgb.blue]) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert([rgb.red, rgb.green, rgb.blue], self.entries.len());
                self.entries.push(ColorEntry::first_seen(rgb));
            }
        }
    }
}

/// Top 20 colors using the default sampling grid.
pub fn extract_palette<B: PixelBuffer + ?Sized>(buffer: &B) -> Palette {
    Sampler::default().extract(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{hex_code, parse_hex};
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn hexes(p: &Palette) -> Vec<&str> {
        p.colors().iter().map(|c| c.hex.as_str()).collect()
    }

    #[test]
    fn single_pixel() {
        let img = RgbImage::from_pixel(1, 1, Rgb([1, 2, 3]));
        let p = extract_palette(&img);
        assert_eq!(p.len(), 1);
        assert_eq!(p.colors()[0].count, 1);
        assert_eq!(p.colors()[0].hex, "#010203");
    }

    #[test]
    fn solid_color_counts_every_sample() {
        // 230x170: step = 170 / 50 = 3
        let img = RgbImage::from_pixel(230, 170, Rgb([18, 52, 86]));
        let p = extract_palette(&img);
        assert_eq!(p.sample_step(), 3);
        assert_eq!(hexes(&p), vec!["#123456"]);
        let expected = 230u64.div_ceil(3) * 170u64.div_ceil(3);
        assert_eq!(p.colors()[0].count, expected);
        assert_eq!(p.samples(), expected);
    }

    #[test]
    fn step_is_at_least_one() {
        let sampler = Sampler::default();
        assert_eq!(sampler.sample_step(10, 4000), 1);
        assert_eq!(sampler.sample_step(49, 49), 1);
        assert_eq!(sampler.sample_step(100, 100), 2);
        assert_eq!(sampler.sample_step(1920, 1080), 21);
    }

    #[test]
    fn many_colors_truncate_to_twenty_sorted() {
        // 300x1, step 1: color i appears i+1 times along x
        let mut img = RgbImage::new(300, 1);
        let mut x = 0;
        for i in 0..24u8 {
            for _ in 0..=i {
                if x < 300 {
                    img.put_pixel(x, 0, Rgb([i * 10, 0, 0]));
                    x += 1;
                }
            }
        }
        let p = extract_palette(&img);
        assert_eq!(p.len(), DEFAULT_MAX_COLORS);
        assert!(p.colors().windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        // x-major scan: column 0 is read top to bottom before column 1
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([0, 0, 1]));
        img.put_pixel(0, 1, Rgb([0, 0, 2]));
        img.put_pixel(1, 0, Rgb([0, 0, 2]));
        img.put_pixel(1, 1, Rgb([0, 0, 1]));
        let p = extract_palette(&img);
        assert_eq!(hexes(&p), vec!["#000001", "#000002"]);

        // row-major reading would have put (1, 0) before (0, 1)
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([9, 9, 9]));
        img.put_pixel(0, 1, Rgb([0, 0, 2]));
        img.put_pixel(1, 0, Rgb([0, 0, 3]));
        img.put_pixel(1, 1, Rgb([9, 9, 9]));
        let p = extract_palette(&img);
        assert_eq!(hexes(&p), vec!["#090909", "#000002", "#000003"]);
    }

    #[test]
    fn quadrants() {
        let img = RgbImage::from_fn(100, 100, |x, y| match (x < 50, y < 50) {
            (true, true) => Rgb([255, 0, 0]),
            (true, false) => Rgb([0, 255, 0]),
            (false, true) => Rgb([0, 0, 255]),
            (false, false) => Rgb([255, 255, 255]),
        });
        let p = extract_palette(&img);
        assert_eq!(hexes(&p), vec!["#FF0000", "#00FF00", "#0000FF", "#FFFFFF"]);
        assert!(p.colors().iter().all(|c| c.count == 625));
    }

    #[test]
    fn repeated_extraction_is_identical() {
        let img =
            RgbImage::from_fn(137, 91, |x, y| Rgb([(x % 7) as u8 * 30, (y % 5) as u8 * 40, 7]));
        assert_eq!(extract_palette(&img), extract_palette(&img));
    }

    #[test]
    fn sampled_hex_round_trips() {
        let img = RgbImage::from_fn(64, 64, |x, y| Rgb([x as u8 * 4, y as u8 * 4, (x ^ y) as u8]));
        let p = Sampler::default().max_colors(usize::MAX).extract(&img);
        for entry in p.colors() {
            assert_eq!(parse_hex(&entry.hex).unwrap(), entry.rgb);
            assert_eq!(hex_code(entry.rgb), entry.hex);
        }
    }

    #[test]
    fn hex_codes_are_unique() {
        let img = RgbImage::from_fn(120, 80, |x, y| Rgb([(x / 10) as u8, (y / 10) as u8, 0]));
        let p = extract_palette(&img);
        let mut seen = std::collections::HashSet::new();
        assert!(p.colors().iter().all(|c| seen.insert(c.hex.clone())));
    }

    #[test]
    fn alpha_is_ignored() {
        let img = RgbaImage::from_fn(3, 1, |x, _| Rgba([200, 100, 50, (x * 100) as u8]));
        let p = extract_palette(&img);
        assert_eq!(hexes(&p), vec!["#C86432"]);
        assert_eq!(p.colors()[0].count, 3);
    }

    #[test]
    fn zero_area_gives_empty_palette() {
        let img = RgbImage::new(0, 10);
        assert!(extract_palette(&img).is_empty());
    }

    #[test]
    fn builder_overrides() {
        let img = RgbImage::from_fn(100, 100, |x, _| Rgb([x as u8, 0, 0]));
        let p = Sampler::default().grid_divisor(10).max_colors(3).extract(&img);
        assert_eq!(p.sample_step(), 10);
        assert_eq!(hexes(&p), vec!["#000000", "#0A0000", "#140000"]);
        assert!(p.colors().iter().all(|c| c.count == 10));

        let clamped = Sampler::default().grid_divisor(0).max_colors(0);
        assert_eq!(clamped.sample_step(7, 7), 7);
        assert_eq!(clamped.extract(&img).len(), 1);
    }

    #[test]
    fn counts_run_past_u32() {
        let mut tally = Tally::default();
        let teal = Srgb::new(0, 128, 128);
        tally.record(teal);
        tally.entries[0].count = u64::from(u32::MAX);
        tally.samples = u64::from(u32::MAX);
        tally.record(teal);
        assert_eq!(tally.entries[0].count, u64::from(u32::MAX) + 1);
        assert_eq!(tally.samples, u64::from(u32::MAX) + 1);
        assert_eq!(tally.entries.len(), 1);
    }
}
