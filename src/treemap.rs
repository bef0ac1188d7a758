use crate::document::Document;
use crate::metrics::DerivedMetrics;

/// Gap between sibling rectangles, in pixels.
pub const PADDING: f32 = 2.0;

/// Stand-in weight for zero, negative or non-finite sizes.
const MIN_WEIGHT: f64 = 1e-6;

/// Target aspect ratio of the squarify pass.
const PHI: f64 = 1.618_033_988_749_895;

/// Rectangle structure for treemap layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn x1(&self) -> f32 {
        self.x + self.width
    }

    pub fn y1(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Shrink by `amount` on every side. An axis that would invert collapses to its midpoint.
    pub fn inset(&self, amount: f32) -> Self {
        let (mut x0, mut x1) = (self.x + amount, self.x1() - amount);
        let (mut y0, mut y1) = (self.y + amount, self.y1() - amount);
        if x1 < x0 {
            x0 = (x0 + x1) / 2.0;
            x1 = x0;
        }
        if y1 < y0 {
            y0 = (y0 + y1) / 2.0;
            y1 = y0;
        }
        Self::from_corners(x0, y0, x1, y1)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x1() && y >= self.y && y <= self.y1()
    }

    /// True when the interiors intersect; shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x1() && other.x < self.x1() && self.y < other.y1() && other.y < self.y1()
    }
}

/// Item to be laid out in the treemap
#[derive(Debug, Clone)]
pub struct TreemapItem {
    pub size: f64,
    pub index: usize,
}

/// Result of the treemap layout calculation
#[derive(Debug, Clone)]
pub struct LayoutRect {
    pub rect: Rect,
    pub index: usize,
}

/// Squarified Treemap Algorithm (Bruls, Huizing, van Wijk), golden-ratio variant
pub struct SquarifiedTreemap;

impl SquarifiedTreemap {
    /// Tile `container` exactly. Output is ordered by size descending; equal sizes keep
    /// their input order.
    pub fn layout(items: &[TreemapItem], container: Rect) -> Vec<LayoutRect> {
        if items.is_empty() {
            return vec![];
        }

        let mut weighted: Vec<(usize, f64)> = items
            .iter()
            .map(|item| (item.index, Self::sanitize(item.size)))
            .collect();

        // stable sort
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut result = Vec::with_capacity(items.len());
        Self::squarify(&weighted, container, &mut result);
        result
    }

    fn sanitize(size: f64) -> f64 {
        if size.is_finite() && size > 0.0 {
            size
        } else {
            log::warn!("Treemap weight {} replaced by {}", size, MIN_WEIGHT);
            MIN_WEIGHT
        }
    }

    fn squarify(items: &[(usize, f64)], container: Rect, result: &mut Vec<LayoutRect>) {
        let mut x0 = container.x as f64;
        let mut y0 = container.y as f64;
        let x1 = container.x1() as f64;
        let y1 = container.y1() as f64;
        let mut remaining: f64 = items.iter().map(|(_, size)| size).sum();

        let mut i0 = 0;
        while i0 < items.len() {
            let dx = x1 - x0;
            let dy = y1 - y0;

            // Grow the row while the worst aspect ratio keeps improving
            let mut i1 = i0 + 1;
            let mut row_sum = items[i0].1;
            let mut min_size = row_sum;
            let mut max_size = row_sum;
            let alpha = (dy / dx).max(dx / dy) / (remaining * PHI);
            let beta = row_sum * row_sum * alpha;
            let mut min_ratio = (max_size / beta).max(beta / min_size);

            while i1 < items.len() {
                let size = items[i1].1;
                let sum = row_sum + size;
                let lo = min_size.min(size);
                let hi = max_size.max(size);
                let beta = sum * sum * alpha;
                let ratio = (hi / beta).max(beta / lo);
                if ratio > min_ratio {
                    break;
                }
                row_sum = sum;
                min_size = lo;
                max_size = hi;
                min_ratio = ratio;
                i1 += 1;
            }

            let last_row = i1 == items.len();
            let row = &items[i0..i1];
            if dx < dy {
                let y2 = if last_row || remaining <= 0.0 {
                    y1
                } else {
                    y0 + dy * row_sum / remaining
                };
                Self::dice(row, row_sum, (x0, y0, x1, y2), result);
                y0 = y2;
            } else {
                let x2 = if last_row || remaining <= 0.0 {
                    x1
                } else {
                    x0 + dx * row_sum / remaining
                };
                Self::slice(row, row_sum, (x0, y0, x2, y1), result);
                x0 = x2;
            }

            remaining -= row_sum;
            i0 = i1;
        }
    }

    /// Lay a row out left to right across the full width of the band.
    fn dice(
        row: &[(usize, f64)],
        row_sum: f64,
        (x0, y0, x1, y1): (f64, f64, f64, f64),
        result: &mut Vec<LayoutRect>,
    ) {
        let k = if row_sum > 0.0 { (x1 - x0) / row_sum } else { 0.0 };
        let mut x = x0;
        for (i, &(index, size)) in row.iter().enumerate() {
            let next = if i + 1 == row.len() { x1 } else { x + size * k };
            result.push(LayoutRect {
                rect: Rect::from_corners(x as f32, y0 as f32, next as f32, y1 as f32),
                index,
            });
            x = next;
        }
    }

    /// Lay a row out top to bottom across the full height of the band.
    fn slice(
        row: &[(usize, f64)],
        row_sum: f64,
        (x0, y0, x1, y1): (f64, f64, f64, f64),
        result: &mut Vec<LayoutRect>,
    ) {
        let k = if row_sum > 0.0 { (y1 - y0) / row_sum } else { 0.0 };
        let mut y = y0;
        for (i, &(index, size)) in row.iter().enumerate() {
            let next = if i + 1 == row.len() { y1 } else { y + size * k };
            result.push(LayoutRect {
                rect: Rect::from_corners(x0 as f32, y as f32, x1 as f32, next as f32),
                index,
            });
            y = next;
        }
    }
}

/// A document's resolved rectangle. Borrows its source document.
#[derive(Debug, Clone, Copy)]
pub struct LayoutNode<'a> {
    /// Position of the document in the input slice.
    pub index: usize,
    pub document: &'a Document,
    pub metrics: &'a DerivedMetrics,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl LayoutNode<'_> {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Partition `[0, width] x [0, height]` among the documents by adjusted media count.
///
/// Tiles cover the target inset by half the padding; each leaf is its tile inset by
/// another half, leaving `PADDING` between siblings and to the border.
pub fn layout_documents<'a>(
    documents: &'a [Document],
    metrics: &'a [DerivedMetrics],
    width: f32,
    height: f32,
) -> Vec<LayoutNode<'a>> {
    let half = PADDING / 2.0;
    let tiled = Rect::new(0.0, 0.0, width, height).inset(half);

    let items: Vec<TreemapItem> = documents
        .iter()
        .zip(metrics)
        .enumerate()
        .map(|(index, (_, m))| TreemapItem {
            size: m.media_count_adjusted,
            index,
        })
        .collect();

    SquarifiedTreemap::layout(&items, tiled)
        .into_iter()
        .map(|tile| {
            let leaf = tile.rect.inset(half);
            LayoutNode {
                index: tile.index,
                document: &documents[tile.index],
                metrics: &metrics[tile.index],
                x0: leaf.x,
                y0: leaf.y,
                x1: leaf.x1(),
                y1: leaf.y1(),
            }
        })
        .collect()
}
