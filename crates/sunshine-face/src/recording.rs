//! Headless canvas that records draw calls.
//!
//! Text is measured as fixed-advance glyphs of half the text size.

use crate::graphics::{Bitmap, Canvas, Paint, Rect};

const GLYPH_ADVANCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Color(u32),
    Bitmap {
        width: u32,
        height: u32,
        grayscale: bool,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        anti_alias: bool,
    },
    Line {
        start_x: f32,
        start_y: f32,
        stop_x: f32,
        stop_y: f32,
    },
    Rect {
        rect: Rect,
        color: u32,
    },
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    frames: Vec<Vec<DrawOp>>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> &[DrawOp] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Text drawn in the last frame, in draw order
    pub fn last_texts(&self) -> Vec<&str> {
        self.last_frame()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, op: DrawOp) {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push(op);
        }
    }
}

impl Canvas for RecordingCanvas {
    fn begin_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    fn draw_color(&mut self, color: u32) {
        self.push(DrawOp::Color(color));
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, _left: f32, _top: f32, _paint: &Paint) {
        self.push(DrawOp::Bitmap {
            width: bitmap.width(),
            height: bitmap.height(),
            grayscale: bitmap.is_grayscale(),
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &Paint) {
        self.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size: paint.text_size,
            anti_alias: paint.anti_alias,
        });
    }

    fn draw_line(&mut self, start_x: f32, start_y: f32, stop_x: f32, stop_y: f32, _paint: &Paint) {
        self.push(DrawOp::Line {
            start_x,
            start_y,
            stop_x,
            stop_y,
        });
    }

    fn draw_rect(&mut self, rect: &Rect, paint: &Paint) {
        self.push(DrawOp::Rect {
            rect: *rect,
            color: paint.color,
        });
    }

    fn measure_text(&self, text: &str, paint: &Paint) -> f32 {
        text.chars().count() as f32 * paint.text_size * GLYPH_ADVANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_separated() {
        let mut canvas = RecordingCanvas::new();
        canvas.begin_frame();
        canvas.draw_color(1);
        canvas.begin_frame();
        canvas.draw_color(2);
        canvas.draw_text("12:00", 0.0, 0.0, &Paint::text(0, 10.0));

        assert_eq!(canvas.frame_count(), 2);
        assert_eq!(canvas.last_frame().len(), 2);
        assert_eq!(canvas.last_texts(), vec!["12:00"]);
    }

    #[test]
    fn test_measure_counts_chars_not_bytes() {
        let canvas = RecordingCanvas::new();
        let paint = Paint::text(0, 20.0);
        assert_eq!(canvas.measure_text("72°", &paint), 30.0);
    }
}
