use iced::{
    alignment, mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};
use sweepcore::math::Point as SweepPoint;
use sweepcore::render::{Color as SweepColor, DrawCommand, StrokeStyle, TextAlign};

/// Arc tessellation step.
const ARC_STEP_DEG: f32 = 2.0;

/// Replays one frame of renderer output onto an iced canvas.
pub struct SweepCanvas<'a> {
    pub commands: &'a [DrawCommand],
}

impl<Message> canvas::Program<Message> for SweepCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::BLACK);
        for command in self.commands {
            paint(&mut frame, command);
        }
        vec![frame.into_geometry()]
    }
}

fn color(c: SweepColor) -> Color {
    Color::from_rgba(c.r, c.g, c.b, c.a)
}

fn point(p: SweepPoint) -> Point {
    Point::new(p.x, p.y)
}

fn horizontal(align: TextAlign) -> alignment::Horizontal {
    match align {
        TextAlign::Left => alignment::Horizontal::Left,
        TextAlign::Center => alignment::Horizontal::Center,
    }
}

fn stroke(style: StrokeStyle) -> Stroke<'static> {
    Stroke::default()
        .with_width(style.width)
        .with_color(color(style.color))
}

/// Screen points along an arc given in sweep degrees (counter-clockwise, y up).
pub fn arc_points(center: SweepPoint, radius: f32, start_deg: f32, end_deg: f32) -> Vec<Point> {
    let span = end_deg - start_deg;
    let steps = ((span.abs() / ARC_STEP_DEG).ceil() as usize).max(1);
    (0..=steps)
        .map(|i| {
            let deg = start_deg + span * i as f32 / steps as f32;
            let rad = deg.to_radians();
            Point::new(center.x + radius * rad.cos(), center.y - radius * rad.sin())
        })
        .collect()
}

fn paint(frame: &mut Frame, command: &DrawCommand) {
    match command {
        DrawCommand::Arc {
            center,
            radius,
            start_deg,
            end_deg,
            stroke: outline,
            fill,
        } => {
            let points = arc_points(*center, *radius, *start_deg, *end_deg);
            if let Some(fill) = fill {
                let sector = Path::new(|builder| {
                    builder.move_to(point(*center));
                    for p in &points {
                        builder.line_to(*p);
                    }
                    builder.close();
                });
                frame.fill(&sector, color(*fill));
            }
            if let Some(outline) = outline {
                let edge = Path::new(|builder| {
                    if let Some((first, rest)) = points.split_first() {
                        builder.move_to(*first);
                        for p in rest {
                            builder.line_to(*p);
                        }
                    }
                });
                frame.stroke(&edge, stroke(*outline));
            }
        }
        DrawCommand::Line { from, to, stroke: s } => {
            frame.stroke(&Path::line(point(*from), point(*to)), stroke(*s));
        }
        DrawCommand::Circle {
            center,
            radius,
            stroke: outline,
            fill,
        } => {
            let circle = Path::circle(point(*center), *radius);
            if let Some(fill) = fill {
                frame.fill(&circle, color(*fill));
            }
            if let Some(outline) = outline {
                frame.stroke(&circle, stroke(*outline));
            }
        }
        DrawCommand::Rect {
            origin,
            width,
            height,
            stroke: outline,
            fill,
        } => {
            let rect = Path::rectangle(point(*origin), Size::new(*width, *height));
            if let Some(fill) = fill {
                frame.fill(&rect, color(*fill));
            }
            if let Some(outline) = outline {
                frame.stroke(&rect, stroke(*outline));
            }
        }
        DrawCommand::Text {
            position,
            content,
            size,
            color: c,
            align,
        } => {
            frame.fill_text(canvas::Text {
                content: content.clone(),
                position: point(*position),
                color: color(*c),
                size: Pixels(*size),
                align_x: horizontal(*align).into(),
                align_y: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_disc_arc_runs_right_to_left_above_center() {
        let center = SweepPoint::new(100.0, 100.0);
        let points = arc_points(center, 50.0, 0.0, 180.0);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert!((first.x - 150.0).abs() < 1e-3);
        assert!((last.x - 50.0).abs() < 1e-3);
        assert!(points.iter().all(|p| p.y <= 100.0 + 1e-3));
        assert_eq!(points.len(), 91);
    }

    #[test]
    fn renderer_alignment_maps_onto_canvas_anchors() {
        assert_eq!(horizontal(TextAlign::Center), alignment::Horizontal::Center);
        assert_eq!(horizontal(TextAlign::Left), alignment::Horizontal::Left);
    }

    #[test]
    fn zero_span_arc_still_yields_a_point_pair() {
        let points = arc_points(SweepPoint::new(0.0, 0.0), 10.0, 45.0, 45.0);
        assert_eq!(points.len(), 2);
    }
}
