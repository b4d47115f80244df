use bridge::ChannelBridge;
use canvas::SweepCanvas;
use iced::{
    event, time,
    widget::{button, column, row, text, Canvas, Column, Container},
    window, Alignment, Color, Element, Event, Length, Size, Subscription, Task, Theme,
};
use std::time::{Duration, Instant};
use sweepcore::channel::{ChannelHandle, ChannelNotice, ReconnectPolicy};
use sweepcore::dispatch::CommandDispatcher;
use sweepcore::protocol::{Mode, TrackingType};
use sweepcore::reflect::{StatusLevel, UiReflector};
use sweepcore::render::{DrawCommand, RenderConfig, Viewport};
use sweepcore::scheduler::{AnimationScheduler, TickOutcome};
use sweepcore::sync::{StateSynchronizer, SyncConfig};

mod bridge;
mod canvas;

const DEFAULT_URL: &str = "ws://127.0.0.1:8000/ws";
const CANVAS_WIDTH: f32 = 820.0;
const CANVAS_HEIGHT: f32 = 460.0;
const MIN_CANVAS: Size = Size::new(320.0, 180.0);
const PADDING: f32 = 20.0;
const SIDE_WIDTH: f32 = 260.0;
const SIDE_SPACING: f32 = 16.0;
/// Header, controls, status and debug rows stacked around the canvas.
const CHROME_HEIGHT: f32 = 190.0;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Sweep Radar".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    Subscription::batch([
        time::every(FRAME_INTERVAL).map(|_| Message::Frame),
        event::listen_with(window_message),
    ])
}

fn window_message(event: Event, _status: event::Status, _id: window::Id) -> Option<Message> {
    match event {
        Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
        Event::Window(window::Event::Focused) => Some(Message::WindowVisible(true)),
        Event::Window(window::Event::Unfocused) => Some(Message::WindowVisible(false)),
        _ => None,
    }
}

/// Canvas area left once the side panel and surrounding rows are laid out.
fn canvas_size(window: Size) -> Size {
    Size::new(
        (window.width - 2.0 * PADDING - SIDE_WIDTH - SIDE_SPACING).max(MIN_CANVAS.width),
        (window.height - 2.0 * PADDING - CHROME_HEIGHT).max(MIN_CANVAS.height),
    )
}

/// A minimized window reports a zero-sized surface.
fn is_minimized(window: Size) -> bool {
    window.width <= 0.0 || window.height <= 0.0
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug, Clone)]
enum Message {
    Frame,
    SwitchMode(Mode),
    SetTracking(TrackingType),
    Shoot,
    ToggleFreeze,
    Reconnect,
    WindowResized(Size),
    WindowVisible(bool),
}

struct Visualizer {
    sync: StateSynchronizer,
    scheduler: AnimationScheduler,
    reflector: UiReflector,
    dispatcher: CommandDispatcher<ChannelHandle>,
    bridge: ChannelBridge,
    frame: Vec<DrawCommand>,
    canvas: Size,
    visible: bool,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let url = std::env::var("SWEEP_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        log::info!("visualizer connecting to {}", url);
        let bridge = ChannelBridge::spawn(url, ReconnectPolicy::default());
        (
            Visualizer {
                sync: StateSynchronizer::new(SyncConfig::default()),
                scheduler: AnimationScheduler::new(
                    RenderConfig::default(),
                    Viewport::from_container(CANVAS_WIDTH, CANVAS_HEIGHT),
                ),
                reflector: UiReflector::new(),
                dispatcher: CommandDispatcher::new(bridge.handle.clone()),
                bridge,
                frame: Vec::new(),
                canvas: Size::new(CANVAS_WIDTH, CANVAS_HEIGHT),
                visible: true,
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Frame => state.step(Instant::now()),
            Message::SwitchMode(mode) => {
                let current = state.sync.state().mode;
                let result = state.dispatcher.switch_mode(current, mode);
                state.reflector.on_command("switch mode", &result);
            }
            Message::SetTracking(kind) => {
                let result = state.dispatcher.set_tracking_type(kind);
                state.reflector.on_command("change tracking type", &result);
            }
            Message::Shoot => {
                let result = state.dispatcher.trigger_action();
                state.reflector.on_command("shoot", &result);
            }
            Message::ToggleFreeze => {
                state.sync.toggle_freeze();
            }
            Message::Reconnect => state.bridge.handle.reconnect(),
            Message::WindowResized(size) => {
                state.set_visible(!is_minimized(size));
                if !is_minimized(size) {
                    state.canvas = canvas_size(size);
                    state.scheduler.resize(state.canvas.width, state.canvas.height);
                }
            }
            Message::WindowVisible(visible) => state.set_visible(visible),
        }
        Task::none()
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            log::debug!("window visible: {}", visible);
            self.visible = visible;
            self.bridge.handle.set_visible(visible);
        }
    }

    /// One display refresh: apply what arrived, then let the scheduler draw.
    fn step(&mut self, now: Instant) {
        for notice in self.bridge.drain() {
            self.reflector.on_notice(&notice);
            if let ChannelNotice::Event(event) = &notice {
                let outcome = self.sync.apply(event, now);
                self.reflector.on_event(event, &outcome);
            }
        }
        let mut surface = Vec::new();
        if let TickOutcome::Rendered(_) = self.scheduler.tick(&mut self.sync, &mut surface, now) {
            self.frame = surface;
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let summary = state
            .reflector
            .summary(state.sync.state(), state.scheduler.fps(), Instant::now());
        let mode = state.sync.state().mode;
        let tracking = state.dispatcher.tracking_type();

        let header = row![
            text(summary.mode_label).size(24),
            text(summary.connection.to_string()).size(16),
            text(if summary.servo_moving { "Servo moving" } else { "Servo idle" }).size(14),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let sweep = Canvas::new(SweepCanvas {
            commands: &state.frame,
        })
        .width(Length::Fixed(state.canvas.width))
        .height(Length::Fixed(state.canvas.height));

        let (mode_label, target) = match mode {
            Mode::Scanning => ("Switch to tracking", Mode::Tracking),
            Mode::Tracking => ("Switch to radar", Mode::Scanning),
        };
        let mode_button = button(mode_label)
            .on_press(Message::SwitchMode(target))
            .padding(10);

        let mut controls = row![
            mode_button,
            button(if summary.display_frozen { "Unfreeze" } else { "Freeze" })
                .on_press(Message::ToggleFreeze)
                .padding(10),
            button("Reconnect")
                .on_press(Message::Reconnect)
                .padding(10),
        ]
        .spacing(10);
        if mode == Mode::Tracking {
            let other = match tracking {
                TrackingType::Face => TrackingType::Hand,
                TrackingType::Hand => TrackingType::Face,
            };
            controls = controls
                .push(
                    button(text(format!("Use {}", other.label())))
                        .on_press(Message::SetTracking(other))
                        .padding(10),
                )
                .push(button("Shoot").on_press(Message::Shoot).padding(10));
        }

        let status = match &summary.status {
            Some(line) => text(line.message.clone())
                .size(14)
                .color(status_color(line.level)),
            None => text("Waiting for radar data...").size(14),
        };

        let mut side = Column::new().spacing(6).width(Length::Fixed(SIDE_WIDTH));
        side = side.push(text(tracking.label()).size(16));
        if let Some(point) = &summary.tracking_point {
            side = side.push(text(format!("Target at ({:.0}, {:.0})", point.x, point.y)).size(14));
        }
        if let Some(camera) = state.reflector.camera() {
            side = side.push(text(format!("Camera frame: {} bytes", camera.image.len())).size(12));
        }
        if !summary.missing_libraries.is_empty() {
            side = side.push(
                text(format!("Missing: {}", summary.missing_libraries.join(", ")))
                    .size(12)
                    .color(status_color(StatusLevel::Warning)),
            );
        }

        let layout = column![
            header,
            row![sweep, side].spacing(SIDE_SPACING),
            controls,
            status,
            text(summary.debug).size(12),
        ]
        .spacing(12)
        .padding(PADDING);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        self.scheduler.cancel();
        self.bridge.handle.close();
    }
}

fn status_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::from_rgb(0.0, 0.85, 0.85),
        StatusLevel::Success => Color::from_rgb(0.38, 1.0, 0.0),
        StatusLevel::Warning => Color::from_rgb(1.0, 0.6, 0.0),
        StatusLevel::Error => Color::from_rgb(1.0, 0.25, 0.25),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_takes_what_the_side_panel_leaves() {
        let size = canvas_size(Size::new(1200.0, 800.0));
        assert_eq!(size.width, 1200.0 - 40.0 - SIDE_WIDTH - SIDE_SPACING);
        assert_eq!(size.height, 800.0 - 40.0 - CHROME_HEIGHT);
    }

    #[test]
    fn tiny_window_keeps_a_usable_canvas() {
        assert_eq!(canvas_size(Size::new(100.0, 100.0)), MIN_CANVAS);
    }

    #[test]
    fn zero_sized_window_counts_as_minimized() {
        assert!(is_minimized(Size::new(0.0, 0.0)));
        assert!(!is_minimized(Size::new(640.0, 480.0)));
    }

    #[test]
    fn only_window_events_become_messages() {
        let resized = window_message(
            Event::Window(window::Event::Resized(Size::new(900.0, 700.0))),
            event::Status::Ignored,
            window::Id::unique(),
        );
        assert!(matches!(resized, Some(Message::WindowResized(_))));
        let unfocused = window_message(
            Event::Window(window::Event::Unfocused),
            event::Status::Ignored,
            window::Id::unique(),
        );
        assert!(matches!(unfocused, Some(Message::WindowVisible(false))));
    }
}
