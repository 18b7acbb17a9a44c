use super::line_scanner::LineOfNpcName;
use crate::common::{Point, Rect};

/// Clusters stacked name lines into bounding boxes.
///
/// All distances are scaled to the capture resolution.
#[derive(Debug, Clone, Copy)]
pub struct NameGrouper {
    /// Max vertical distance from the seed line.
    offset1: f32,
    /// Max vertical distance from the last line added to the group.
    offset2: f32,
    max_width: f32,
    merge_dx: f32,
    merge_dy: f32,
}

impl NameGrouper {
    pub fn new(offset1: f32, offset2: f32, max_width: f32, merge_dx: f32, merge_dy: f32) -> Self {
        Self {
            offset1,
            offset2,
            max_width,
            merge_dx,
            merge_dy,
        }
    }

    /// Group an unordered set of lines. The result does not depend on input order.
    pub fn group(&self, lines: &mut [LineOfNpcName]) -> Vec<Rect> {
        lines.sort_unstable_by_key(|l| (l.y, l.x_start, l.x_end));
        for line in lines.iter_mut() {
            line.in_group = false;
        }

        let boxes = self
            .collect_groups(lines)
            .into_iter()
            .filter(|b| self.fits_name_width(b))
            .collect();

        // a union of two narrow boxes can still be too wide for a name
        let mut merged: Vec<Rect> = self
            .merge(boxes)
            .into_iter()
            .filter(|b| self.fits_name_width(b))
            .collect();
        merged.sort_unstable_by_key(|b| (b.y, b.x, b.width, b.height));
        merged
    }

    fn fits_name_width(&self, rect: &Rect) -> bool {
        (rect.width as f32) < self.max_width
    }

    fn collect_groups(&self, lines: &mut [LineOfNpcName]) -> Vec<Rect> {
        let mut groups = Vec::new();

        for i in 0..lines.len() {
            if lines[i].in_group {
                continue;
            }
            lines[i].in_group = true;

            let seed = lines[i];
            let center = seed.center_x();
            let mut last_y = seed.y;
            let mut min = Point::new(seed.x_start, seed.y);
            let mut max = Point::new(seed.x_end, seed.y);

            for later in lines[i + 1..].iter_mut() {
                if later.y as f32 > seed.y as f32 + self.offset1 {
                    break;
                }
                if later.y as f32 > last_y as f32 + self.offset2 {
                    break;
                }
                if later.in_group {
                    continue;
                }

                if later.x_start <= center && later.x_end >= center && later.y > last_y {
                    later.in_group = true;
                    last_y = later.y;
                    min.x = min.x.min(later.x_start);
                    max.x = max.x.max(later.x_end);
                    max.y = later.y;
                }
            }

            groups.push(Rect::from_corners(min, max));
        }

        groups
    }

    /// Union boxes that touch or sit close together until nothing changes.
    fn merge(&self, mut boxes: Vec<Rect>) -> Vec<Rect> {
        loop {
            let Some((i, j)) = self.find_mergeable(&boxes) else {
                return boxes;
            };
            boxes[i] = boxes[i].union(&boxes[j]);
            boxes.swap_remove(j);
        }
    }

    fn find_mergeable(&self, boxes: &[Rect]) -> Option<(usize, usize)> {
        for i in 0..boxes.len() {
            for j in i + 1..boxes.len() {
                if self.should_merge(&boxes[i], &boxes[j]) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    fn should_merge(&self, a: &Rect, b: &Rect) -> bool {
        if a.intersects(b) {
            return true;
        }
        let (ca, cb) = (a.center(), b.center());
        ((ca.x - cb.x).abs() as f32) <= self.merge_dx && ((ca.y - cb.y).abs() as f32) <= self.merge_dy
    }
}
