//! Pure rendering of a [`RenderState`] into draw commands.

use crate::math::{Point, PolarProjector};
use crate::protocol::Mode;
use crate::render::commands::{Color, DrawCommand, StrokeStyle, Surface, TextAlign};
use crate::render::config::{RenderConfig, Viewport};
use crate::sync::{DetectionView, RenderState};

const BACKGROUND: Color = Color::rgba8(0, 20, 40, 0.7);
const BORDER: Color = Color::rgba8(0, 255, 255, 0.5);
const RING: Color = Color::rgba8(0, 255, 255, 0.2);
const LABEL: Color = Color::rgba8(0, 255, 255, 0.7);
const GREEN: Color = Color::rgb8(0x62, 0xff, 0x00);
const BRIGHT_GREEN: Color = Color::rgb8(0x98, 0xf5, 0x3c);
const HIGHLIGHT_GREEN: Color = Color::rgb8(0x5e, 0xff, 0x5e);
const SWEEP: Color = Color::rgb8(0x00, 0xff, 0x00);
const LIMIT: Color = Color::rgb8(0xff, 0xff, 0x00);
const RED: Color = Color::rgb8(0xff, 0x0a, 0x0a);
const ALERT: Color = Color::rgb8(0xff, 0x00, 0x00);
const ORANGE: Color = Color::rgb8(0xff, 0x99, 0x00);
const POPUP_FILL: Color = Color::rgba8(255, 50, 0, 0.8);
const POPUP_BORDER: Color = Color::rgb8(0xff, 0x6a, 0x00);
const WHITE: Color = Color::rgb8(0xff, 0xff, 0xff);

/// What a frame ended up showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub commands: usize,
    pub waiting: bool,
    pub popup: bool,
    pub marker: bool,
}

struct Counting<'a, S: Surface + ?Sized> {
    inner: &'a mut S,
    count: usize,
}

impl<S: Surface + ?Sized> Counting<'_, S> {
    fn draw(&mut self, command: DrawCommand) {
        self.count += 1;
        self.inner.draw(command);
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        self.draw(DrawCommand::Line {
            from,
            to,
            stroke: StrokeStyle::new(color, width),
        });
    }

    fn text(&mut self, position: Point, content: String, size: f32, color: Color, align: TextAlign) {
        self.draw(DrawCommand::Text {
            position,
            content,
            size,
            color,
            align,
        });
    }
}

/// Draws one frame. Later commands occlude earlier ones.
pub fn render_frame<S: Surface + ?Sized>(
    state: &RenderState,
    viewport: &Viewport,
    config: &RenderConfig,
    surface: &mut S,
) -> FrameSummary {
    let mut out = Counting {
        inner: surface,
        count: 0,
    };
    let projector = viewport.projector(config.max_range_cm);
    let mut summary = FrameSummary::default();

    draw_background(&mut out, &projector);
    draw_references(&mut out, state, &projector, config);
    if !state.display_frozen {
        draw_trail(&mut out, state, &projector);
    }
    summary.waiting = draw_sweep(&mut out, state, &projector);

    if let Some(detection) = state.detection {
        draw_popup(&mut out, state, &detection, &projector);
        summary.popup = true;
    } else {
        summary.marker = draw_range_marker(&mut out, state, &projector);
    }

    summary.commands = out.count;
    summary
}

fn draw_background<S: Surface + ?Sized>(out: &mut Counting<'_, S>, projector: &PolarProjector) {
    out.draw(DrawCommand::Arc {
        center: projector.center,
        radius: projector.radius,
        start_deg: 0.0,
        end_deg: 180.0,
        stroke: None,
        fill: Some(BACKGROUND),
    });
    out.draw(DrawCommand::Arc {
        center: projector.center,
        radius: projector.radius,
        start_deg: 0.0,
        end_deg: 180.0,
        stroke: Some(StrokeStyle::new(BORDER, 2.0)),
        fill: None,
    });
}

fn draw_references<S: Surface + ?Sized>(
    out: &mut Counting<'_, S>,
    state: &RenderState,
    projector: &PolarProjector,
    config: &RenderConfig,
) {
    let rings = config.range_rings.max(1);
    for ring in 1..=rings {
        let fraction = ring as f32 / rings as f32;
        let radius = projector.radius * fraction;
        out.draw(DrawCommand::Arc {
            center: projector.center,
            radius,
            start_deg: 0.0,
            end_deg: 180.0,
            stroke: Some(StrokeStyle::new(RING, 1.0)),
            fill: None,
        });
        out.text(
            Point::new(projector.center.x, projector.center.y - radius + 14.0),
            format!("{:.0}cm", config.max_range_cm * fraction),
            12.0,
            LABEL,
            TextAlign::Center,
        );
    }

    out.line(
        Point::new(projector.center.x - projector.radius, projector.center.y),
        Point::new(projector.center.x + projector.radius, projector.center.y),
        GREEN,
        2.0,
    );

    let near = |reference: f32| (state.angle - reference).abs() < config.highlight_within_deg;

    for limit in [state.min_angle, state.max_angle] {
        let highlighted = near(limit);
        out.line(
            projector.center,
            projector.edge(limit),
            if highlighted { LIMIT } else { LIMIT.with_alpha(0.7) },
            if highlighted { 3.0 } else { 1.0 },
        );
    }

    for &reference in &config.reference_angles {
        let highlighted = near(reference);
        out.line(
            projector.center,
            projector.edge(reference),
            if highlighted { HIGHLIGHT_GREEN } else { GREEN },
            if highlighted { 3.0 } else { 1.0 },
        );
        out.text(
            projector.at(reference, projector.radius + 16.0),
            format!("{:.0}°", reference),
            14.0,
            if highlighted { WHITE } else { BRIGHT_GREEN },
            TextAlign::Center,
        );
    }
}

fn draw_trail<S: Surface + ?Sized>(
    out: &mut Counting<'_, S>,
    state: &RenderState,
    projector: &PolarProjector,
) {
    if state.mode != Mode::Scanning || !state.has_live_data {
        return;
    }
    for glow in &state.trail {
        let opacity = 0.8 * (1.0 - glow.age_fraction);
        let width = 3.0 - 2.0 * glow.age_fraction;
        out.line(
            projector.center,
            projector.edge(glow.angle),
            SWEEP.with_alpha(opacity),
            width,
        );
    }
}

/// Returns true when the waiting placard was drawn.
fn draw_sweep<S: Surface + ?Sized>(
    out: &mut Counting<'_, S>,
    state: &RenderState,
    projector: &PolarProjector,
) -> bool {
    let edge = projector.edge(state.angle);
    let placard = Point::new(projector.center.x, projector.center.y - projector.radius / 2.0);

    if !state.has_live_data {
        out.line(projector.center, edge, SWEEP.with_alpha(0.25), 2.0);
        out.text(
            placard,
            "Waiting for radar data...".to_string(),
            18.0,
            WHITE.with_alpha(0.8),
            TextAlign::Center,
        );
        out.text(
            Point::new(placard.x, placard.y + 22.0),
            format!("Last position {:.0}°", state.angle),
            13.0,
            WHITE.with_alpha(0.6),
            TextAlign::Center,
        );
        return true;
    }

    if state.display_frozen {
        out.line(projector.center, edge, SWEEP.with_alpha(0.35), 2.0);
        out.text(
            placard,
            "DISPLAY FROZEN".to_string(),
            18.0,
            WHITE.with_alpha(0.8),
            TextAlign::Center,
        );
        return false;
    }

    match state.mode {
        Mode::Scanning => {
            let color = if state.simulated {
                SWEEP.with_alpha(0.6)
            } else {
                SWEEP
            };
            out.line(projector.center, edge, color, 4.0);
        }
        Mode::Tracking => out.line(projector.center, edge, LIMIT, 3.0),
    }
    false
}

fn draw_popup<S: Surface + ?Sized>(
    out: &mut Counting<'_, S>,
    state: &RenderState,
    detection: &DetectionView,
    projector: &PolarProjector,
) {
    let object = projector.range_point(detection.angle, detection.distance);
    out.line(projector.center, object, ORANGE, 3.0);

    let pulse_fraction = if state.pulse_max > 0.0 {
        (state.pulse / state.pulse_max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    out.draw(DrawCommand::Circle {
        center: object,
        radius: 8.0 + state.pulse,
        stroke: Some(StrokeStyle::new(ORANGE.with_alpha(1.0 - pulse_fraction), 3.0)),
        fill: None,
    });
    out.draw(DrawCommand::Circle {
        center: object,
        radius: 10.0,
        stroke: None,
        fill: Some(Color::rgb8(0xff, 0x33, 0x00)),
    });

    let box_width = 320.0f32.min(projector.radius * 2.0);
    let box_height = 100.0;
    let origin = Point::new(
        projector.center.x - box_width / 2.0,
        projector.center.y - projector.radius * 0.55 - box_height / 2.0,
    );
    out.draw(DrawCommand::Rect {
        origin,
        width: box_width,
        height: box_height,
        stroke: Some(StrokeStyle::new(POPUP_BORDER, 2.0)),
        fill: Some(POPUP_FILL),
    });
    let text_x = projector.center.x;
    out.text(
        Point::new(text_x, origin.y + 28.0),
        "OBJECT DETECTED!".to_string(),
        16.0,
        WHITE,
        TextAlign::Center,
    );
    out.text(
        Point::new(text_x, origin.y + 56.0),
        format!("Position: {:.0}°", detection.angle),
        14.0,
        WHITE,
        TextAlign::Center,
    );
    out.text(
        Point::new(text_x, origin.y + 80.0),
        format!("Distance: {:.0} cm", detection.distance),
        14.0,
        WHITE,
        TextAlign::Center,
    );
}

/// Live range marker on the sweep line. Returns true when drawn.
fn draw_range_marker<S: Surface + ?Sized>(
    out: &mut Counting<'_, S>,
    state: &RenderState,
    projector: &PolarProjector,
) -> bool {
    if state.mode != Mode::Scanning || !state.has_live_data || state.display_frozen {
        return false;
    }
    if state.distance >= projector.max_range && !state.proximity_alert {
        return false;
    }
    let object = projector.range_point(state.angle, state.distance);
    let edge = projector.edge(state.angle);

    if state.proximity_alert {
        out.line(object, edge, ALERT, 4.0);
        out.draw(DrawCommand::Circle {
            center: object,
            radius: 7.0,
            stroke: None,
            fill: Some(ALERT),
        });
        let pulse_fraction = if state.pulse_max > 0.0 {
            state.pulse / state.pulse_max
        } else {
            0.0
        };
        out.draw(DrawCommand::Circle {
            center: object,
            radius: 10.0 + pulse_fraction * 10.0,
            stroke: Some(StrokeStyle::new(ALERT.with_alpha(0.7), 2.0)),
            fill: None,
        });
    } else {
        out.line(object, edge, RED, 2.0);
        out.draw(DrawCommand::Circle {
            center: object,
            radius: 5.0,
            stroke: None,
            fill: Some(RED),
        });
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::TrailGlow;
    use std::time::Duration;

    fn base_state() -> RenderState {
        RenderState {
            mode: Mode::Scanning,
            angle: 90.0,
            distance: 60.0,
            has_live_data: true,
            display_frozen: false,
            proximity_alert: false,
            simulated: false,
            trail: Vec::new(),
            detection: None,
            pulse: 0.0,
            pulse_max: 30.0,
            min_angle: 15.0,
            max_angle: 165.0,
        }
    }

    fn render(state: &RenderState) -> (Vec<DrawCommand>, FrameSummary) {
        let mut commands = Vec::new();
        let summary = render_frame(
            state,
            &Viewport::from_container(800.0, 450.0),
            &RenderConfig::default(),
            &mut commands,
        );
        (commands, summary)
    }

    fn texts(commands: &[DrawCommand]) -> Vec<String> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn background_is_drawn_first() {
        let (commands, summary) = render(&base_state());
        assert_eq!(summary.commands, commands.len());
        assert!(matches!(
            commands[0],
            DrawCommand::Arc { fill: Some(_), .. }
        ));
        assert!(summary.marker);
        assert!(!summary.waiting);
    }

    #[test]
    fn awaiting_data_draws_placard_and_no_marker() {
        let mut state = base_state();
        state.has_live_data = false;
        state.trail = vec![TrailGlow {
            angle: 80.0,
            age_fraction: 0.1,
            simulated: false,
        }];
        let (commands, summary) = render(&state);
        assert!(summary.waiting);
        assert!(!summary.marker);
        assert!(texts(&commands)
            .iter()
            .any(|t| t.starts_with("Waiting for radar data")));
        let bright_sweeps = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { stroke, .. } if stroke.color == SWEEP))
            .count();
        assert_eq!(bright_sweeps, 0);
    }

    #[test]
    fn popup_takes_precedence_over_marker() {
        let mut state = base_state();
        state.proximity_alert = true;
        state.detection = Some(DetectionView {
            angle: 45.0,
            distance: 22.0,
            age: Duration::from_millis(100),
        });
        let (commands, summary) = render(&state);
        assert!(summary.popup);
        assert!(!summary.marker);
        assert!(texts(&commands).contains(&"OBJECT DETECTED!".to_string()));
        let alert_fills = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { fill: Some(color), .. } if *color == ALERT))
            .count();
        assert_eq!(alert_fills, 0);
        // popup box is the last shape before its text
        let rect_index = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Rect { .. }))
            .unwrap();
        assert!(rect_index > commands.len() - 5);
    }

    #[test]
    fn trail_fades_to_transparent() {
        let mut state = base_state();
        state.trail = vec![
            TrailGlow {
                angle: 88.0,
                age_fraction: 0.0,
                simulated: false,
            },
            TrailGlow {
                angle: 86.0,
                age_fraction: 1.0,
                simulated: false,
            },
        ];
        let (commands, _) = render(&state);
        let trail_alphas: Vec<f32> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { stroke, .. }
                    if stroke.color.g == 1.0 && stroke.color.r == 0.0 && stroke.color.a < 1.0 =>
                {
                    Some(stroke.color.a)
                }
                _ => None,
            })
            .collect();
        assert_eq!(trail_alphas.len(), 2);
        assert!((trail_alphas[0] - 0.8).abs() < 1e-6);
        assert_eq!(trail_alphas[1], 0.0);
    }

    #[test]
    fn frozen_frame_shows_no_trail_or_marker() {
        let mut state = base_state();
        state.display_frozen = true;
        state.trail = vec![TrailGlow {
            angle: 88.0,
            age_fraction: 0.2,
            simulated: false,
        }];
        let (commands, summary) = render(&state);
        assert!(!summary.marker);
        assert!(texts(&commands).contains(&"DISPLAY FROZEN".to_string()));
    }

    #[test]
    fn sweep_near_reference_highlights_it() {
        let mut state = base_state();
        state.angle = 62.0;
        let (commands, _) = render(&state);
        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::Line { stroke, .. } if stroke.color == HIGHLIGHT_GREEN && stroke.width == 3.0
        )));
    }

    #[test]
    fn tracking_mode_draws_fixed_line() {
        let mut state = base_state();
        state.mode = Mode::Tracking;
        let (commands, summary) = render(&state);
        assert!(!summary.marker);
        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::Line { stroke, .. } if stroke.color == LIMIT && stroke.width == 3.0
        )));
    }
}
