use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;
use tiny_skia::{
    Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke, Transform,
};

use crate::drawing::normalize::{CanvasSize, PixelPoint};
use crate::error::SketchroomError;
use crate::websocket::message::RelayEvent;

/// Drawing tool. The eraser is not transparency: it paints a wide
/// stroke in the background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

impl Tool {
    pub fn from_eraser_flag(eraser: bool) -> Self {
        if eraser {
            Tool::Eraser
        } else {
            Tool::Pen
        }
    }

    fn width(self) -> f32 {
        match self {
            Tool::Pen => 3.0,
            Tool::Eraser => 16.0,
        }
    }

    fn color(self) -> Color {
        match self {
            Tool::Pen => Color::from_rgba8(0x11, 0x11, 0x11, 0xff),
            Tool::Eraser => Color::WHITE,
        }
    }
}

/// The open stroke replayed from another participant. It remembers the
/// tool announced when the stroke began, independent of the local tool.
#[derive(Debug, Clone, Copy)]
struct RemoteStroke {
    last: PixelPoint,
    tool: Tool,
}

/// Paints the local participant's strokes and replays relayed events
/// from the rest of the room into one pixel buffer.
///
/// The local pointer path and the remote replay path are independent:
/// each keeps its own open stroke, and remote strokes carry their own
/// tool choice. Interleaved local and remote traffic therefore paints
/// exactly what each participant drew.
pub struct StrokeRenderer {
    pixmap: Pixmap,
    size: CanvasSize,
    tool: Tool,
    local: Option<PixelPoint>,
    remote: Option<RemoteStroke>,
}

impl StrokeRenderer {
    pub fn new(size: CanvasSize) -> Result<Self, SketchroomError> {
        let mut pixmap = Pixmap::new(size.width, size.height)
            .ok_or(SketchroomError::InvalidCanvasSize(size.width, size.height))?;

        // Fill with white background
        pixmap.fill(Color::WHITE);

        Ok(Self {
            pixmap,
            size,
            tool: Tool::Pen,
            local: None,
            remote: None,
        })
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// The local participant's currently selected tool
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Select the tool for local strokes
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Begin a local stroke at a pixel position
    pub fn pointer_down(&mut self, point: PixelPoint) {
        self.local = Some(point);
    }

    /// Extend the open local stroke to a new position. Moves with no
    /// stroke open (hover) paint nothing.
    pub fn pointer_move(&mut self, point: PixelPoint) {
        if let Some(last) = self.local {
            self.paint_segment(last, point, self.tool);
            self.local = Some(point);
        }
    }

    /// Finish the local stroke, if one is open
    pub fn pointer_up(&mut self) {
        self.local = None;
    }

    /// Replay one relayed event from another participant
    pub fn apply(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::Begin { point, eraser } => {
                self.remote = Some(RemoteStroke {
                    last: self.size.denormalize(*point),
                    tool: Tool::from_eraser_flag(*eraser),
                });
            }
            RelayEvent::Draw { point } => {
                // A draw with no stroke open (sender joined mid-stroke,
                // or a clear raced in) is dropped
                if let Some(stroke) = self.remote {
                    let next = self.size.denormalize(*point);
                    self.paint_segment(stroke.last, next, stroke.tool);
                    self.remote = Some(RemoteStroke { last: next, ..stroke });
                }
            }
            RelayEvent::End => {
                self.remote = None;
            }
            RelayEvent::Clear => self.clear(),
        }
    }

    /// Wipe to the white background and forget any open strokes
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::WHITE);
        self.local = None;
        self.remote = None;
    }

    fn paint_segment(&mut self, from: PixelPoint, to: PixelPoint, tool: Tool) {
        let mut paint = Paint::default();
        paint.set_color(tool.color());
        paint.anti_alias = true;

        let stroke = Stroke {
            width: tool.width(),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };

        let mut pb = PathBuilder::new();
        if (from.x - to.x).abs() < f64::EPSILON && (from.y - to.y).abs() < f64::EPSILON {
            // Zero length segment still leaves a dot
            pb.push_circle(from.x as f32, from.y as f32, 0.5);
        } else {
            pb.move_to(from.x as f32, from.y as f32);
            pb.line_to(to.x as f32, to.y as f32);
        }

        if let Some(path) = pb.finish() {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Color of one pixel, for inspection
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Export the picture as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>, SketchroomError> {
        let data = self.pixmap.data();

        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::new(self.size.width, self.size.height);

        for (i, pixel) in img.pixels_mut().enumerate() {
            let offset = i * 4;
            // tiny-skia stores premultiplied RGBA, need to unpremultiply
            let a = data[offset + 3] as f32 / 255.0;
            if a > 0.0 {
                *pixel = Rgba([
                    (data[offset] as f32 / a).min(255.0) as u8,
                    (data[offset + 1] as f32 / a).min(255.0) as u8,
                    (data[offset + 2] as f32 / a).min(255.0) as u8,
                    data[offset + 3],
                ]);
            } else {
                *pixel = Rgba([255, 255, 255, 255]);
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}
