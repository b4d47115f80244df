pub mod commands;
pub mod config;
pub mod frame;

pub use commands::{Color, DrawCommand, StrokeStyle, Surface, TextAlign};
pub use config::{RenderConfig, Viewport};
pub use frame::{render_frame, FrameSummary};
