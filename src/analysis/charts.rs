//! 3×3 grid of summary charts rendered straight into an RGB buffer.
//!
//! Panels, row-major: revenue by category, revenue by region, age histogram,
//! gender split, payment methods, monthly trend, quantity vs unit price,
//! missing-value map, revenue box plot per category. Only marks and axes are
//! drawn; titles are listed in the text report.

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};

use super::stats;

pub const PANEL_TITLES: [&str; 9] = [
    "Revenue by Product Category",
    "Revenue by Region",
    "Customer Age Distribution",
    "Gender Distribution",
    "Payment Method Preferences",
    "Monthly Sales Trend",
    "Quantity vs Unit Price",
    "Missing Values Heatmap",
    "Revenue Distribution by Category",
];

const AGE_BINS: usize = 15;

const BACKGROUND: Rgb<u8> = Rgb([234, 234, 242]);
const PANEL_BG: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const EDGE: Rgb<u8> = Rgb([0, 0, 0]);
const SKYBLUE: Rgb<u8> = Rgb([135, 206, 235]);
const LIGHTCORAL: Rgb<u8> = Rgb([240, 128, 128]);
const LIGHTGREEN: Rgb<u8> = Rgb([144, 238, 144]);
const GOLD: Rgb<u8> = Rgb([255, 215, 0]);
const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);
const TEAL: Rgb<u8> = Rgb([0, 128, 128]);
const PIE: [Rgb<u8>; 2] = [Rgb([255, 153, 153]), Rgb([102, 179, 255])];
const PRESENT: Rgb<u8> = Rgb([68, 1, 84]);
const MISSING: Rgb<u8> = Rgb([253, 231, 37]);
const BOX: Rgb<u8> = Rgb([31, 119, 180]);
const MEDIAN: Rgb<u8> = Rgb([44, 160, 44]);

/// Everything the nine panels plot, already aggregated.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub category_revenue: Vec<(String, f64)>,
    pub region_revenue: Vec<(String, f64)>,
    pub ages: Vec<f64>,
    pub gender_counts: Vec<(String, usize)>,
    pub payment_counts: Vec<(String, usize)>,
    pub monthly: Vec<(String, f64)>,
    /// (unit price, quantity)
    pub price_quantity: Vec<(f64, f64)>,
    /// rows × columns, true where the cell is missing
    pub missing_mask: Vec<Vec<bool>>,
    /// category → revenues, in category-revenue order
    pub revenue_by_category: Vec<(String, Vec<f64>)>,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

impl Rect {
    fn inset(&self, d: i64) -> Rect {
        Rect {
            x: self.x + d,
            y: self.y + d,
            w: (self.w - 2 * d).max(1),
            h: (self.h - 2 * d).max(1),
        }
    }

    fn bottom(&self) -> i64 {
        self.y + self.h - 1
    }

    fn right(&self) -> i64 {
        self.x + self.w - 1
    }

    /// Pixel row for `v` on a min..=max scale (bottom = min).
    fn y_for(&self, v: f64, min: f64, max: f64) -> i64 {
        let span = if max > min { max - min } else { 1.0 };
        self.bottom() - (((v - min) / span) * (self.h - 1) as f64).round() as i64
    }

    fn x_for(&self, v: f64, min: f64, max: f64) -> i64 {
        let span = if max > min { max - min } else { 1.0 };
        self.x + (((v - min) / span) * (self.w - 1) as f64).round() as i64
    }
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    fn put(&mut self, x: i64, y: i64, c: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, c);
        }
    }

    fn fill(&mut self, r: Rect, c: Rgb<u8>) {
        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                self.put(x, y, c);
            }
        }
    }

    fn outline(&mut self, r: Rect, c: Rgb<u8>) {
        self.line(r.x, r.y, r.right(), r.y, c);
        self.line(r.x, r.bottom(), r.right(), r.bottom(), c);
        self.line(r.x, r.y, r.x, r.bottom(), c);
        self.line(r.right(), r.y, r.right(), r.bottom(), c);
    }

    /// Bresenham, clipped to the image first.
    fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, c: Rgb<u8>) {
        let bounds = (self.img.width() as i64, self.img.height() as i64);
        let Some((x0, y0, x1, y1)) = clip(x0, y0, x1, y1, bounds) else {
            return;
        };
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.put(x, y, c);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn dot(&mut self, cx: i64, cy: i64, radius: i64, c: Rgb<u8>) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    self.put(cx + x, cy + y, c);
                }
            }
        }
    }

    /// Blend `c` over the existing pixel, for overlapping scatter points.
    fn blend(&mut self, x: i64, y: i64, c: Rgb<u8>, alpha: f32) {
        if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
            return;
        }
        let p = self.img.get_pixel_mut(x as u32, y as u32);
        for i in 0..3 {
            p.0[i] = (p.0[i] as f32 * (1.0 - alpha) + c.0[i] as f32 * alpha).round() as u8;
        }
    }

    fn axes(&mut self, r: Rect) {
        self.line(r.x, r.y, r.x, r.bottom(), AXIS);
        self.line(r.x, r.bottom(), r.right(), r.bottom(), AXIS);
    }
}

/// Liang-Barsky clip of a segment to `0..w` × `0..h`.
fn clip(x0: i64, y0: i64, x1: i64, y1: i64, (w, h): (i64, i64)) -> Option<(i64, i64, i64, i64)> {
    let (fx, fy) = (x0 as f64, y0 as f64);
    let (dx, dy) = (x1 as f64 - fx, y1 as f64 - fy);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, fx),
        (dx, (w - 1) as f64 - fx),
        (-dy, fy),
        (dy, (h - 1) as f64 - fy),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    let at = |t: f64| ((fx + t * dx).round() as i64, (fy + t * dy).round() as i64);
    let ((ax, ay), (bx, by)) = (at(t0), at(t1));
    Some((ax, ay, bx, by))
}

/// Value range that always includes zero, so bars have a baseline.
fn zero_span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((0.0, 0.0), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Render the chart grid into an in-memory image.
pub fn render(data: &ChartData, width: u32, height: u32) -> RgbImage {
    let mut canvas = Canvas::new(width.max(90), height.max(90));
    let (pw, ph) = (canvas.img.width() as i64 / 3, canvas.img.height() as i64 / 3);
    let panel = |i: i64| Rect {
        x: (i % 3) * pw,
        y: (i / 3) * ph,
        w: pw,
        h: ph,
    };
    let margin = (pw.min(ph) / 12).max(4);

    for i in 0..9 {
        let frame = panel(i).inset(margin / 2);
        canvas.fill(frame, PANEL_BG);
        canvas.outline(frame, AXIS);
    }
    let plot = |i: i64| panel(i).inset(margin);

    draw_bars(&mut canvas, plot(0), &totals(&data.category_revenue), SKYBLUE);
    draw_bars(&mut canvas, plot(1), &totals(&data.region_revenue), LIGHTCORAL);
    draw_bars(&mut canvas, plot(2), &histogram(&data.ages, AGE_BINS), LIGHTGREEN);
    draw_pie(&mut canvas, plot(3), &counts(&data.gender_counts));
    draw_bars(&mut canvas, plot(4), &counts(&data.payment_counts), GOLD);
    draw_line(&mut canvas, plot(5), &totals(&data.monthly), PURPLE);
    draw_scatter(&mut canvas, plot(6), &data.price_quantity, TEAL);
    draw_mask(&mut canvas, plot(7), &data.missing_mask);
    draw_boxes(&mut canvas, plot(8), &data.revenue_by_category);

    canvas.img
}

pub fn save(data: &ChartData, width: u32, height: u32, path: &Path) -> Result<()> {
    render(data, width, height)
        .save(path)
        .with_context(|| format!("Failed to write chart {}", path.display()))
}

fn totals(groups: &[(String, f64)]) -> Vec<f64> {
    groups.iter().map(|(_, v)| *v).collect()
}

fn counts(groups: &[(String, usize)]) -> Vec<f64> {
    groups.iter().map(|(_, n)| *n as f64).collect()
}

/// Bin counts over [min, max]; the max value lands in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<f64> {
    let mut out = vec![0.0; bins];
    if values.is_empty() || bins == 0 {
        return out;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    for v in values {
        let i = (((v - min) / width) as usize).min(bins - 1);
        out[i] += 1.0;
    }
    out
}

fn draw_bars(c: &mut Canvas, r: Rect, values: &[f64], color: Rgb<u8>) {
    c.axes(r);
    if values.is_empty() {
        return;
    }
    let (min, max) = zero_span(values.iter().copied());
    let base = r.y_for(0.0, min, max);
    let slot = (r.w - 2) / values.len() as i64;
    let gap = (slot / 5).max(if slot > 2 { 1 } else { 0 });
    for (i, v) in values.iter().enumerate() {
        let end = r.y_for(*v, min, max);
        let bar = Rect {
            x: r.x + 1 + i as i64 * slot + gap / 2,
            y: end.min(base),
            w: (slot - gap).max(1),
            h: (end - base).abs(),
        };
        if bar.h > 0 {
            c.fill(bar, color);
            c.outline(bar, EDGE);
        }
    }
}

fn draw_line(c: &mut Canvas, r: Rect, values: &[f64], color: Rgb<u8>) {
    c.axes(r);
    if values.is_empty() {
        return;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // leave headroom so markers at the extremes stay inside the frame
    let pad = ((max - min) * 0.1).max(1.0);
    let (lo, hi) = (min - pad, max + pad);
    let last = (values.len().max(2) - 1) as f64;
    let inner = r.inset(4);
    let points: Vec<(i64, i64)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (inner.x_for(i as f64, 0.0, last), inner.y_for(*v, lo, hi)))
        .collect();
    for w in points.windows(2) {
        c.line(w[0].0, w[0].1, w[1].0, w[1].1, color);
    }
    for (x, y) in points {
        c.dot(x, y, 3, color);
    }
}

fn draw_scatter(c: &mut Canvas, r: Rect, points: &[(f64, f64)], color: Rgb<u8>) {
    c.axes(r);
    if points.is_empty() {
        return;
    }
    let (x_min, x_max) = zero_span(points.iter().map(|(x, _)| *x));
    let (y_min, y_max) = zero_span(points.iter().map(|(_, y)| *y));
    let inner = r.inset(4);
    for (x, y) in points {
        let (px, py) = (inner.x_for(*x, x_min, x_max), inner.y_for(*y, y_min, y_max));
        for dy in -2..=2 {
            for dx in -2..=2 {
                if dx * dx + dy * dy <= 4 {
                    c.blend(px + dx, py + dy, color, 0.5);
                }
            }
        }
    }
}

fn draw_pie(c: &mut Canvas, r: Rect, counts: &[f64]) {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return;
    }
    let radius = (r.w.min(r.h) / 2 - 2).max(1);
    let (cx, cy) = (r.x + r.w / 2, r.y + r.h / 2);
    // cumulative slice boundaries as fractions of a turn
    let mut bounds = Vec::with_capacity(counts.len());
    let mut acc = 0.0;
    for n in counts {
        acc += n / total;
        bounds.push(acc);
    }
    for y in -radius..=radius {
        for x in -radius..=radius {
            if x * x + y * y > radius * radius {
                continue;
            }
            // counter-clockwise from 12 o'clock
            let turn = ((-x as f64).atan2(-y as f64) / std::f64::consts::TAU).rem_euclid(1.0);
            let slice = bounds.iter().position(|b| turn < *b).unwrap_or(counts.len() - 1);
            c.put(cx + x, cy + y, PIE[slice % PIE.len()]);
        }
    }
}

fn draw_mask(c: &mut Canvas, r: Rect, mask: &[Vec<bool>]) {
    let cols = mask.iter().map(Vec::len).max().unwrap_or(0);
    if mask.is_empty() || cols == 0 {
        return;
    }
    for (row_i, row) in mask.iter().enumerate() {
        let y0 = r.y + (row_i as i64 * r.h) / mask.len() as i64;
        let y1 = r.y + ((row_i as i64 + 1) * r.h) / mask.len() as i64;
        for (col_i, missing) in row.iter().enumerate() {
            let x0 = r.x + (col_i as i64 * r.w) / cols as i64;
            let x1 = r.x + ((col_i as i64 + 1) * r.w) / cols as i64;
            let cell = Rect {
                x: x0,
                y: y0,
                w: (x1 - x0).max(1),
                h: (y1 - y0).max(1),
            };
            c.fill(cell, if *missing { MISSING } else { PRESENT });
        }
    }
}

fn draw_boxes(c: &mut Canvas, r: Rect, groups: &[(String, Vec<f64>)]) {
    c.axes(r);
    let (min, max) = zero_span(groups.iter().flat_map(|(_, v)| v.iter().copied()));
    if groups.is_empty() || max <= min {
        return;
    }
    let slot = (r.w - 2) / groups.len() as i64;
    let inner = Rect { y: r.y + 4, h: r.h - 4, ..r };
    for (i, (_, values)) in groups.iter().enumerate() {
        let Some(d) = stats::describe(values) else { continue };
        let Some(f) = stats::iqr_fences(values) else { continue };
        let cx = r.x + 1 + i as i64 * slot + slot / 2;
        let half = (slot / 4).max(1);
        let y = |v: f64| inner.y_for(v, min, max);

        // whiskers reach the furthest values inside the fences
        let lo = values.iter().copied().filter(|v| *v >= f.lower).fold(d.q1, f64::min);
        let hi = values.iter().copied().filter(|v| *v <= f.upper).fold(d.q3, f64::max);
        c.line(cx, y(lo), cx, y(d.q1), AXIS);
        c.line(cx, y(d.q3), cx, y(hi), AXIS);
        c.line(cx - half / 2, y(lo), cx + half / 2, y(lo), AXIS);
        c.line(cx - half / 2, y(hi), cx + half / 2, y(hi), AXIS);

        c.outline(
            Rect {
                x: cx - half,
                y: y(d.q3),
                w: 2 * half + 1,
                h: (y(d.q1) - y(d.q3)).max(0) + 1,
            },
            BOX,
        );
        c.line(cx - half, y(d.median), cx + half, y(d.median), MEDIAN);

        for v in values.iter().filter(|v| **v < f.lower || **v > f.upper) {
            c.dot(cx, y(*v), 2, EDGE);
        }
    }
}

// ── Tests ──
