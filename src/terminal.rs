// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front-end
//!
//! Device list, one slider per image parameter, the live preview rendered
//! with Unicode half-block characters, and the raw capability/settings dumps.
//! The UI only reads [`Snapshot`]s and dispatches [`Message`]s.

use crate::app::{Message, Snapshot, Synchronizer, SynchronizerOptions};
use crate::backends::camera::{
    CameraFrame, DeviceInventory, FrameReceiver, Parameter, PixelFormat, StreamProvider,
};
use crate::config::Config;
use crate::constants::ui::{COARSE_STEPS, POLL_INTERVAL};
use crate::errors::{AppError, AppResult};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Gauge, List, ListItem, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::{debug, info};

/// Run the terminal UI until the user quits
pub fn run(
    inventory: Arc<dyn DeviceInventory>,
    provider: Arc<dyn StreamProvider>,
    config: &Config,
) -> AppResult<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Other(format!("failed to start runtime: {}", e)))?;
    let _guard = rt.enter();

    let mut sync = Synchronizer::new(inventory, provider, SynchronizerOptions::from(config));
    sync.start();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut sync, config.preview);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    sync: &mut Synchronizer,
    preview_enabled: bool,
) -> AppResult<()> {
    let mut ui = UiState::default();
    let mut frame_widget = FrameWidget::new(preview_enabled);
    let mut preview: Option<FrameReceiver> = None;
    let mut stream_id: Option<String> = None;

    loop {
        sync.pump();

        // A new stream brings its own preview channel
        let current_stream = sync.active_stream_id();
        if current_stream != stream_id {
            debug!(stream = ?current_stream, "Preview source changed");
            stream_id = current_stream;
            preview = sync.take_preview();
            frame_widget.clear();
        }

        // Drain all available frames to get the latest
        if let Some(receiver) = preview.as_mut() {
            while let Ok(frame) = receiver.try_recv() {
                frame_widget.update_frame(frame);
            }
        }

        let snapshot = sync.snapshot();
        ui.clamp_cursor(&snapshot);
        let status = status_message(&snapshot, sync.active_track_label().as_deref());

        terminal.draw(|f| draw(f, &ui, &snapshot, &frame_widget, &status))?;

        // Handle input with timeout for frame updates
        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match ui.handle_key(key, &snapshot) {
                KeyAction::Quit => break,
                KeyAction::Dispatch(message) => sync.dispatch(message),
                KeyAction::None => {}
            }
        }
    }

    info!("Terminal UI closed");
    Ok(())
}

/// What a key press asks for
#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    None,
    Quit,
    Dispatch(Message),
}

/// Cursor positions; everything else comes from the snapshot
#[derive(Debug, Default)]
struct UiState {
    device_cursor: usize,
    slider: usize,
}

impl UiState {
    fn parameter(&self) -> Parameter {
        Parameter::ALL[self.slider % Parameter::ALL.len()]
    }

    fn clamp_cursor(&mut self, snapshot: &Snapshot) {
        self.device_cursor = self
            .device_cursor
            .min(snapshot.devices.len().saturating_sub(1));
    }

    fn handle_key(&mut self, key: KeyEvent, snapshot: &Snapshot) -> KeyAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Char('q') => KeyAction::Quit,
            KeyCode::Char('r') => KeyAction::Dispatch(Message::RefreshDevices),
            KeyCode::Up => {
                self.device_cursor = self.device_cursor.saturating_sub(1);
                KeyAction::None
            }
            KeyCode::Down => {
                if self.device_cursor + 1 < snapshot.devices.len() {
                    self.device_cursor += 1;
                }
                KeyAction::None
            }
            KeyCode::Enter => match snapshot.devices.get(self.device_cursor) {
                Some(device) => KeyAction::Dispatch(Message::SelectDevice(device.id.clone())),
                None => KeyAction::None,
            },
            KeyCode::Tab => {
                self.slider = (self.slider + 1) % Parameter::ALL.len();
                KeyAction::None
            }
            KeyCode::BackTab => {
                self.slider = (self.slider + Parameter::ALL.len() - 1) % Parameter::ALL.len();
                KeyAction::None
            }
            KeyCode::Left => self.nudge(snapshot, -1.0),
            KeyCode::Right => self.nudge(snapshot, 1.0),
            KeyCode::PageDown => self.nudge(snapshot, -COARSE_STEPS),
            KeyCode::PageUp => self.nudge(snapshot, COARSE_STEPS),
            _ => KeyAction::None,
        }
    }

    fn nudge(&self, snapshot: &Snapshot, steps: f64) -> KeyAction {
        let parameter = self.parameter();
        let control = snapshot.control(parameter);
        if !control.provided {
            return KeyAction::None;
        }
        let current = snapshot.value(parameter);
        let next = control.nudge(current, steps);
        if next == current {
            return KeyAction::None;
        }
        KeyAction::Dispatch(Message::ValueChanged(parameter, next))
    }
}

fn draw(
    f: &mut Frame,
    ui: &UiState,
    snapshot: &Snapshot,
    frame_widget: &FrameWidget,
    status: &str,
) {
    let [body, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(f.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(body);

    let device_rows = snapshot.devices.len().clamp(1, 6) as u16;
    let [devices_area, controls_area, preview_area] = Layout::vertical([
        Constraint::Length(device_rows + 2),
        Constraint::Length(Parameter::ALL.len() as u16 + 2),
        Constraint::Min(0),
    ])
    .areas(left);
    let [capabilities_area, settings_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(right);

    f.render_widget(device_list(ui, snapshot), devices_area);
    draw_sliders(f, ui, snapshot, controls_area);

    let preview_block = Block::bordered().title("Preview");
    let preview_inner = preview_block.inner(preview_area);
    f.render_widget(preview_block, preview_area);
    f.render_widget(frame_widget, preview_inner);

    f.render_widget(dump_pane("Capabilities", &snapshot.capabilities_json), capabilities_area);
    f.render_widget(dump_pane("Settings", &snapshot.settings_json), settings_area);

    f.render_widget(StatusBar { message: status }, status_area);
}

fn device_list<'a>(ui: &UiState, snapshot: &'a Snapshot) -> List<'a> {
    let selected = snapshot.selected_index();
    let items: Vec<ListItem> = snapshot
        .devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let marker = if Some(index) == selected { "● " } else { "  " };
            let label = if device.is_placeholder() {
                "(camera, permission pending)".to_string()
            } else if device.label.is_empty() {
                device.id.clone()
            } else {
                format!("{} ({})", device.label, device.id)
            };
            let mut style = Style::default();
            if index == ui.device_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(vec![Span::raw(marker), Span::raw(label)])).style(style)
        })
        .collect();

    let items = if items.is_empty() {
        vec![ListItem::new("No cameras found").style(Style::default().fg(Color::DarkGray))]
    } else {
        items
    };

    List::new(items).block(Block::bordered().title("Devices"))
}

fn draw_sliders(f: &mut Frame, ui: &UiState, snapshot: &Snapshot, area: Rect) {
    let block = Block::bordered().title("Controls");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Length(1); 4]).split(inner);
    for (parameter, row) in Parameter::ALL.into_iter().zip(rows.iter()) {
        let [name_area, gauge_area, value_area] = Layout::horizontal([
            Constraint::Length(12),
            Constraint::Min(0),
            Constraint::Length(8),
        ])
        .areas(*row);

        let control = snapshot.control(parameter);
        let value = snapshot.value(parameter);
        let focused = ui.parameter() == parameter;

        let name_style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let pointer = if focused { ">" } else { " " };
        f.render_widget(
            Paragraph::new(format!("{}{}", pointer, parameter.display_name())).style(name_style),
            name_area,
        );

        let (gauge, value_text) = if control.provided {
            let color = if focused { Color::Cyan } else { Color::Blue };
            (
                Gauge::default()
                    .ratio(control.ratio(value))
                    .label("")
                    .gauge_style(Style::default().fg(color).bg(Color::Black)),
                format!("{:>7}", value),
            )
        } else {
            (
                Gauge::default()
                    .ratio(0.0)
                    .label("n/a")
                    .gauge_style(Style::default().fg(Color::DarkGray).bg(Color::Black)),
                format!("{:>7}", "-"),
            )
        };
        f.render_widget(gauge, gauge_area);
        f.render_widget(Paragraph::new(value_text), value_area);
    }
}

fn dump_pane<'a>(title: &'a str, json: &'a str) -> Paragraph<'a> {
    Paragraph::new(json)
        .wrap(Wrap { trim: false })
        .block(Block::bordered().title(title))
}

/// Status line naming the streaming device, or the pending selection
fn status_message(snapshot: &Snapshot, track_label: Option<&str>) -> String {
    let device = track_label
        .filter(|label| !label.is_empty())
        .or(snapshot.selected_device_id.as_deref().filter(|id| !id.is_empty()))
        .unwrap_or("no stream");
    format!(
        "{} | ↑↓ Enter: select | Tab: control | ←→ PgUp/PgDn: adjust | r: refresh | q: quit",
        device
    )
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    enabled: bool,
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            frame: None,
        }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        if self.enabled {
            self.frame = Some(frame);
        }
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_ref().filter(|f| f.width > 0 && f.height > 0) else {
            let msg = if self.enabled {
                "Waiting for camera..."
            } else {
                "Preview disabled"
            };
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top_color = sample_pixel(frame, src_x, src_y_top);
                let bottom_color = sample_pixel(frame, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let (r, g, b) = sample_pixel_rgb(frame, x, y);
    Color::Rgb(r, g, b)
}

fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    let x = x.min(frame.width.saturating_sub(1));
    let y = y.min(frame.height.saturating_sub(1));
    let data = &frame.data[..];

    match frame.format {
        PixelFormat::Rgb24 => {
            let idx = (y * frame.stride + x * 3) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            match data.get(idx) {
                Some(&v) => (v, v, v),
                None => (0, 0, 0),
            }
        }
        PixelFormat::Yuyv => {
            // Y0 U Y1 V: two pixels share chroma
            let pair_x = (x & !1) as usize;
            let base = (y as usize) * (frame.stride as usize) + pair_x * 2;
            if base + 3 >= data.len() {
                return (0, 0, 0);
            }
            let luma = if x & 1 == 0 {
                data[base]
            } else {
                data[base + 2]
            };
            yuv_to_rgb(luma, data[base + 1], data[base + 3])
        }
    }
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        // Truncate on a char boundary; the message holds arrows
        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Control;
    use crate::backends::camera::{CameraDevice, DeviceKind};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot_with_brightness() -> Snapshot {
        let mut snapshot = Snapshot {
            devices: vec![
                CameraDevice::new("/dev/video0", "Front", DeviceKind::VideoInput),
                CameraDevice::new("/dev/video2", "Back", DeviceKind::VideoInput),
            ],
            ..Default::default()
        };
        snapshot.controls[Parameter::Brightness.index()] = Control {
            provided: true,
            min: 0.0,
            max: 100.0,
            step: 5.0,
        };
        snapshot.values[Parameter::Brightness.index()] = 50.0;
        snapshot
    }

    #[test]
    fn test_arrows_nudge_focused_slider_by_step() {
        let snapshot = snapshot_with_brightness();
        let mut ui = UiState::default();

        assert_eq!(
            ui.handle_key(key(KeyCode::Right), &snapshot),
            KeyAction::Dispatch(Message::ValueChanged(Parameter::Brightness, 55.0))
        );
        assert_eq!(
            ui.handle_key(key(KeyCode::PageDown), &snapshot),
            KeyAction::Dispatch(Message::ValueChanged(Parameter::Brightness, 0.0))
        );
    }

    #[test]
    fn test_inert_slider_ignores_input() {
        let snapshot = snapshot_with_brightness();
        let mut ui = UiState::default();
        ui.handle_key(key(KeyCode::Tab), &snapshot);

        assert_eq!(ui.parameter(), Parameter::Contrast);
        assert_eq!(ui.handle_key(key(KeyCode::Right), &snapshot), KeyAction::None);
    }

    #[test]
    fn test_enter_selects_device_under_cursor() {
        let snapshot = snapshot_with_brightness();
        let mut ui = UiState::default();
        ui.handle_key(key(KeyCode::Down), &snapshot);
        ui.handle_key(key(KeyCode::Down), &snapshot);

        assert_eq!(
            ui.handle_key(key(KeyCode::Enter), &snapshot),
            KeyAction::Dispatch(Message::SelectDevice("/dev/video2".into()))
        );
    }

    #[test]
    fn test_quit_keys() {
        let snapshot = Snapshot::default();
        let mut ui = UiState::default();
        assert_eq!(ui.handle_key(key(KeyCode::Char('q')), &snapshot), KeyAction::Quit);
        assert_eq!(
            ui.handle_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &snapshot
            ),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_status_prefers_track_label() {
        let snapshot = Snapshot {
            selected_device_id: Some("/dev/video0".into()),
            ..Default::default()
        };
        assert!(status_message(&snapshot, Some("Front")).starts_with("Front |"));
        assert!(status_message(&snapshot, None).starts_with("/dev/video0 |"));
        assert!(status_message(&Snapshot::default(), None).starts_with("no stream |"));
    }

    #[test]
    fn test_yuyv_sampling_uses_shared_chroma() {
        let frame = CameraFrame {
            width: 2,
            height: 1,
            stride: 4,
            format: PixelFormat::Yuyv,
            data: Arc::from(vec![200u8, 128, 50, 128]),
        };
        assert_eq!(sample_pixel_rgb(&frame, 0, 0), (200, 200, 200));
        assert_eq!(sample_pixel_rgb(&frame, 1, 0), (50, 50, 50));
    }

    #[test]
    fn test_out_of_range_sample_is_black() {
        let frame = CameraFrame {
            width: 4,
            height: 4,
            stride: 12,
            format: PixelFormat::Rgb24,
            data: Arc::from(vec![255u8; 3]),
        };
        assert_eq!(sample_pixel_rgb(&frame, 0, 0), (255, 255, 255));
        assert_eq!(sample_pixel_rgb(&frame, 3, 3), (0, 0, 0));
    }
}
