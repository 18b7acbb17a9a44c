use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::color_matcher::ColorMatcher;
use crate::common::{PixelBuffer, Rect};

/// One horizontal run of name-colored pixels on a single scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineOfNpcName {
    pub x_start: i32,
    pub x_end: i32,
    pub y: i32,
    pub in_group: bool,
}

impl LineOfNpcName {
    pub fn new(x_start: i32, x_end: i32, y: i32) -> Self {
        Self {
            x_start,
            x_end,
            y,
            in_group: false,
        }
    }

    /// Horizontal center, the anchor stacked lines must straddle.
    pub fn center_x(&self) -> i32 {
        self.x_start + (self.x_end - self.x_start) / 2
    }

    pub fn length(&self) -> i32 {
        self.x_end - self.x_start
    }
}

/// Sweeps the scan area row by row and emits runs long enough to be name text.
///
/// Thresholds are already scaled to the capture resolution.
#[derive(Debug, Clone, Copy)]
pub struct NameLineScanner {
    area: Rect,
    min_length: f32,
    min_end_length: f32,
    inc_x: usize,
    inc_y: usize,
}

impl NameLineScanner {
    pub fn new(area: Rect, min_length: f32, length_diff: f32, inc_x: u32, inc_y: u32) -> Self {
        Self {
            area,
            min_length,
            min_end_length: min_length - length_diff,
            inc_x: inc_x.max(1) as usize,
            inc_y: inc_y.max(1) as usize,
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn min_length(&self) -> f32 {
        self.min_length
    }

    /// Scan every row of the area in parallel.
    ///
    /// Output order follows the rows but callers must not rely on it. Returns `None`
    /// when `cancel` fired during the pass; partial results are dropped.
    pub fn scan(
        &self,
        buffer: &PixelBuffer<'_>,
        matcher: &ColorMatcher,
        cancel: &CancellationToken,
    ) -> Option<Vec<LineOfNpcName>> {
        if cancel.is_cancelled() {
            return None;
        }
        if matcher.is_no_match() {
            return Some(Vec::new());
        }

        let left = self.area.left().max(0);
        let right = self.area.right().min(buffer.width() as i32);
        let top = self.area.top().max(0);
        let bottom = self.area.bottom().min(buffer.height() as i32);
        if left >= right || top >= bottom {
            return Some(Vec::new());
        }

        let rows = (bottom - top) as usize;
        let row_count = rows.div_ceil(self.inc_y);
        let bytes_per_pixel = buffer.bytes_per_pixel();

        let lines: Vec<LineOfNpcName> = (0..row_count)
            .into_par_iter()
            .map(|i| top + (i * self.inc_y) as i32)
            .flat_map_iter(|y| {
                let mut found = Vec::new();
                if cancel.is_cancelled() {
                    return found;
                }
                if let Some(row) = buffer.row(y as u32) {
                    self.scan_row(row, y, left, right, bytes_per_pixel, matcher, &mut found);
                }
                found
            })
            .collect();

        if cancel.is_cancelled() {
            return None;
        }
        Some(lines)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_row(
        &self,
        row: &[u8],
        y: i32,
        left: i32,
        right: i32,
        bytes_per_pixel: usize,
        matcher: &ColorMatcher,
        found: &mut Vec<LineOfNpcName>,
    ) {
        let mut run: Option<(i32, i32)> = None;

        for x in (left..right).step_by(self.inc_x) {
            let i = x as usize * bytes_per_pixel;
            let Some(px) = row.get(i..i + 3) else {
                break;
            };
            // B G R
            if !matcher.matches(px[2], px[1], px[0]) {
                continue;
            }

            run = match run {
                Some((start, end)) if ((x - end) as f32) < self.min_length => Some((start, x)),
                Some((start, end)) => {
                    self.emit(start, end, y, found);
                    Some((x, x))
                }
                None => Some((x, x)),
            };
        }

        if let Some((start, end)) = run {
            self.emit(start, end, y, found);
        }
    }

    fn emit(&self, start: i32, end: i32, y: i32, found: &mut Vec<LineOfNpcName>) {
        if (end - start) as f32 > self.min_end_length {
            found.push(LineOfNpcName::new(start, end, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{ColorThresholds, FuzzyMetric, NpcNames, SearchMode};

    const WIDTH: u32 = 200;
    const HEIGHT: u32 = 60;

    fn blank() -> Vec<u8> {
        vec![0u8; (WIDTH * HEIGHT * 4) as usize]
    }

    fn paint(data: &mut [u8], xs: std::ops::Range<u32>, y: u32, (r, g, b): (u8, u8, u8)) {
        for x in xs {
            let i = ((y * WIDTH + x) * 4) as usize;
            data[i..i + 4].copy_from_slice(&[b, g, r, 255]);
        }
    }

    fn enemy_matcher() -> ColorMatcher {
        ColorMatcher::new(
            NpcNames::ENEMY,
            SearchMode::Simple,
            FuzzyMetric::Legacy,
            15.0,
            ColorThresholds::default(),
        )
    }

    fn scanner() -> NameLineScanner {
        NameLineScanner::new(Rect::new(0, 0, WIDTH as i32, HEIGHT as i32), 22.0, 4.0, 1, 1)
    }

    fn scan(data: &[u8]) -> Option<Vec<LineOfNpcName>> {
        let buffer = PixelBuffer::new(data, WIDTH, HEIGHT, (WIDTH * 4) as usize, 4).unwrap();
        scanner().scan(&buffer, &enemy_matcher(), &CancellationToken::new())
    }

    #[test]
    fn no_matching_pixels_yield_no_lines() {
        assert_eq!(scan(&blank()), Some(Vec::new()));
    }

    #[test]
    fn long_run_yields_one_segment() {
        let mut data = blank();
        paint(&mut data, 40..70, 10, (255, 0, 0));
        let lines = scan(&data).unwrap();
        assert_eq!(lines, vec![LineOfNpcName::new(40, 69, 10)]);
    }

    #[test]
    fn short_run_is_noise() {
        let mut data = blank();
        paint(&mut data, 40..50, 10, (255, 0, 0));
        assert!(scan(&data).unwrap().is_empty());
    }

    #[test]
    fn small_gaps_are_bridged() {
        let mut data = blank();
        paint(&mut data, 10..25, 5, (255, 0, 0));
        paint(&mut data, 30..45, 5, (255, 0, 0));
        let lines = scan(&data).unwrap();
        assert_eq!(lines, vec![LineOfNpcName::new(10, 44, 5)]);
    }

    #[test]
    fn distant_runs_split_into_separate_segments() {
        let mut data = blank();
        paint(&mut data, 10..40, 5, (255, 0, 0));
        paint(&mut data, 100..130, 5, (255, 0, 0));
        let lines = scan(&data).unwrap();
        assert_eq!(
            lines,
            vec![LineOfNpcName::new(10, 39, 5), LineOfNpcName::new(100, 129, 5)]
        );
    }

    #[test]
    fn rows_outside_the_area_are_ignored() {
        let mut data = blank();
        paint(&mut data, 10..60, 2, (255, 0, 0));
        paint(&mut data, 10..60, 20, (255, 0, 0));
        let buffer = PixelBuffer::new(&data, WIDTH, HEIGHT, (WIDTH * 4) as usize, 4).unwrap();
        let scanner = NameLineScanner::new(Rect::new(0, 10, WIDTH as i32, 40), 22.0, 4.0, 1, 1);
        let lines = scanner
            .scan(&buffer, &enemy_matcher(), &CancellationToken::new())
            .unwrap();
        assert_eq!(lines, vec![LineOfNpcName::new(10, 59, 20)]);
    }

    #[test]
    fn cancelled_scan_returns_nothing() {
        let mut data = blank();
        paint(&mut data, 40..70, 10, (255, 0, 0));
        let buffer = PixelBuffer::new(&data, WIDTH, HEIGHT, (WIDTH * 4) as usize, 4).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(scanner().scan(&buffer, &enemy_matcher(), &cancel).is_none());
    }
}
