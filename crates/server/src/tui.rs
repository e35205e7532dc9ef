use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use nmea_sim::{ClientId, ServerEvent, VesselState};

const MAX_LOG_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: Instant,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ClientRow {
    pub client_id: ClientId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

pub struct TuiState {
    started: Instant,
    listening: Option<SocketAddr>,
    max_clients: usize,
    tick: u64,
    vessel: Option<Box<VesselState>>,
    clients: Vec<ClientRow>,
    selected: usize,
    log: VecDeque<LogEntry>,
}

impl TuiState {
    pub fn new(max_clients: usize) -> Self {
        Self {
            started: Instant::now(),
            listening: None,
            max_clients,
            tick: 0,
            vessel: None,
            clients: Vec::new(),
            selected: 0,
            log: VecDeque::new(),
        }
    }

    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Listening { addr } => {
                self.listening = Some(addr);
                self.log_info(format!("Listening on {}", addr));
            }
            ServerEvent::ClientConnected { client_id, addr } => {
                self.clients.push(ClientRow {
                    client_id,
                    addr,
                    connected_at: Instant::now(),
                });
                self.log_info(format!("Client {} connected from {}", client_id, addr));
            }
            ServerEvent::ClientDisconnected {
                client_id,
                addr,
                reason,
            } => {
                self.clients.retain(|c| c.client_id != client_id);
                self.selected = self.selected.min(self.clients.len().saturating_sub(1));
                self.log_info(format!("Client {} ({}) {}", client_id, addr, reason.as_str()));
            }
            ServerEvent::ConnectionDenied { addr, reason } => {
                self.log_warn(format!("Connection denied to {}: {}", addr, reason));
            }
            ServerEvent::Tick { tick, state } => {
                self.tick = tick;
                if state.steering.arrived
                    && !self.vessel.as_ref().is_some_and(|v| v.steering.arrived)
                {
                    self.log_info(format!("Arrived at {}", state.steering.destination_id));
                }
                self.vessel = Some(state);
            }
            ServerEvent::Error { message } => self.log_error(message),
        }
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Info, message.into());
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Warn, message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Error, message.into());
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(LogEntry {
            at: Instant::now(),
            level,
            message,
        });
    }

    pub fn select_next(&mut self) {
        if !self.clients.is_empty() {
            self.selected = (self.selected + 1) % self.clients.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.clients.is_empty() {
            self.selected = (self.selected + self.clients.len() - 1) % self.clients.len();
        }
    }

    pub fn selected_client(&self) -> Option<ClientId> {
        self.clients.get(self.selected).map(|c| c.client_id)
    }
}

pub fn render(frame: &mut Frame, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    render_header(frame, chunks[0], state);
    render_status(frame, chunks[1], state);
    render_vessel(frame, chunks[2], state);
    render_connections(frame, middle[0], state);
    render_log(frame, middle[1], state);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, state: &TuiState) {
    let uptime = format_duration(state.started.elapsed().as_secs());
    let title = format!(" NMEA Simulator - Uptime: {} ", uptime);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let listening = state
        .listening
        .map_or_else(|| String::from("-"), |addr| addr.to_string());
    let text = format!(
        "Listening: {}  |  Tick: {}  |  Clients: {}",
        listening,
        state.tick,
        state.clients.len()
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Clients ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let max = state.max_clients.max(1);
    let ratio = state.clients.len() as f64 / max as f64;
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.min(1.0))
        .label(format!("{}/{} clients", state.clients.len(), max));

    frame.render_widget(gauge, area);
}

fn field<'a>(label: &'a str, value: String) -> Vec<Span<'a>> {
    vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
        Span::raw("   "),
    ]
}

fn render_vessel(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Vessel ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let Some(v) = &state.vessel else {
        let waiting = Paragraph::new("Waiting for first tick...")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(waiting, area);
        return;
    };

    let st = &v.steering;
    let lines = vec![
        Line::from(field("Time: ", v.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string())),
        Line::from(field("Position: ", v.position.to_string())),
        Line::from(
            [
                field("SOG: ", format!("{:.1} kn", v.speed_over_ground)),
                field("COG: ", format!("{:.1}°", v.course_over_ground)),
                field("HDG: ", format!("{:.1}°T", v.heading_true)),
                field("STW: ", format!("{:.1} kn", v.water_speed)),
            ]
            .concat(),
        ),
        Line::from(
            [
                field("Depth: ", format!("{:.1} m", v.depth_below_transducer)),
                field("Water: ", format!("{:.1} °C", v.water_temperature)),
                field("Air: ", format!("{:.1} °C", v.air_temperature)),
            ]
            .concat(),
        ),
        Line::from(
            [
                field(
                    "Wind: ",
                    format!("{:.0}° {:.1} kn", v.wind.true_direction, v.wind.true_speed),
                ),
                field(
                    "Apparent: ",
                    format!("{:.0}° {:.1} kn", v.wind.apparent_angle, v.wind.apparent_speed),
                ),
            ]
            .concat(),
        ),
        Line::from(
            [
                field("RPM: ", format!("{:.0}", v.engine.rpm)),
                field("Pitch: ", format!("{:.1}%", v.engine.pitch)),
                field("Sats: ", v.fix.satellites.to_string()),
                field("HDOP: ", format!("{:.1}", v.fix.hdop)),
            ]
            .concat(),
        ),
        Line::from(
            [
                field("Next: ", st.destination_id.clone()),
                field("Range: ", format!("{:.3} nm", st.range_nm)),
                field("BRG: ", format!("{:.1}°", st.bearing_to_destination)),
                field("XTE: ", format!("{:.3} nm", st.cross_track_nm)),
            ]
            .concat(),
        ),
        Line::from(if st.arrived {
            Span::styled("Arrived", Style::default().fg(Color::Green))
        } else {
            Span::raw("")
        }),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_connections(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Connections ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let lines: Vec<Line> = state
        .clients
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let style = if i == state.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::styled(
                format!(
                    "#{:<4} {:<22} {}",
                    c.client_id,
                    c.addr,
                    format_duration(c.connected_at.elapsed().as_secs())
                ),
                style,
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.log.len().saturating_sub(visible);
    let lines: Vec<Line> = state
        .log
        .iter()
        .skip(skip)
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::White,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!(
                        "[{}] ",
                        format_duration(entry.at.duration_since(state.started).as_secs())
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/ESC quit  |  Up/Down select client  |  k kick selected")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
