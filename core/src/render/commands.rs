use crate::math::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 1.0)
    }

    pub const fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Backend-neutral drawing primitive.
///
/// Arc angles use sweep degrees: 0 points right, 90 straight up, 180 left.
/// A filled arc is a pie sector closed through `center`.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Arc {
        center: Point,
        radius: f32,
        start_deg: f32,
        end_deg: f32,
        stroke: Option<StrokeStyle>,
        fill: Option<Color>,
    },
    Line {
        from: Point,
        to: Point,
        stroke: StrokeStyle,
    },
    Circle {
        center: Point,
        radius: f32,
        stroke: Option<StrokeStyle>,
        fill: Option<Color>,
    },
    Rect {
        origin: Point,
        width: f32,
        height: f32,
        stroke: Option<StrokeStyle>,
        fill: Option<Color>,
    },
    Text {
        position: Point,
        content: String,
        size: f32,
        color: Color,
        align: TextAlign,
    },
}

/// Anything that can consume draw commands in order.
pub trait Surface {
    fn draw(&mut self, command: DrawCommand);
}

impl Surface for Vec<DrawCommand> {
    fn draw(&mut self, command: DrawCommand) {
        self.push(command);
    }
}
