//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::{ByteRegister, Register};
use super::app::{DebuggerApp, MEM_ROW_BYTES};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, microinstructions and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_program(frame, left_chunks[0], app);
    draw_microinstructions(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: registers, memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Min(6),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_memory(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw the program listing around IP.
fn draw_program(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let listing = app.get_listing((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = listing
        .iter()
        .map(|(index, line, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let is_bp = app.breakpoints.contains(&(*index as u32));
            let bp = if is_bp { "●" } else { " " };
            let text = format!("{}{:03X}: {}", prefix, index, line);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if is_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the microinstructions of the last step.
fn draw_microinstructions(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let mut lines = vec![Line::from(vec![
        Span::raw("Last: "),
        Span::styled(
            app.cpu.current_instruction().unwrap_or("-").to_string(),
            Style::default().fg(Color::Yellow),
        ),
    ])];

    lines.extend(app.cpu.last_microinstructions().iter().map(|micro| {
        let style = if micro.is_placeholder() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(Span::styled(format!("  -> {}", micro), style))
    }));

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Microinstructions ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// Draw registers and flags.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;
    let reg_spans = |names: &[Register]| -> Line<'static> {
        let spans: Vec<Span> = names
            .iter()
            .flat_map(|reg| {
                [
                    Span::raw(format!("{}: ", reg)),
                    Span::styled(format!("{:04X}  ", regs.get(*reg)), Style::default().fg(Color::White)),
                ]
            })
            .collect();
        Line::from(spans)
    };

    let flag_spans: Vec<Span> = regs
        .flags
        .entries()
        .iter()
        .map(|(name, set)| {
            let style = if *set {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!("{} ", name), style)
        })
        .collect();

    let byte_spans: Vec<Span> = ByteRegister::ALL
        .iter()
        .map(|reg| Span::raw(format!("{}={:02X} ", reg.name(), regs.get_byte(*reg))))
        .collect();

    let content = vec![
        reg_spans(&[Register::Ax, Register::Bx, Register::Cx, Register::Dx]),
        Line::from(byte_spans),
        reg_spans(&[Register::Si, Register::Di, Register::Sp, Register::Bp]),
        reg_spans(&[Register::Cs, Register::Ds, Register::Es, Register::Ss]),
        Line::from(flag_spans),
        Line::from(vec![
            Span::raw("IP: "),
            Span::styled(format!("{:03X}", regs.ip()), Style::default().fg(Color::Yellow)),
            Span::raw("   Steps: "),
            Span::styled(format!("{}", app.cpu.steps), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", app.cpu.state),
                if app.cpu.is_halted() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Green)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw a hex dump of memory.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll;

    let items: Vec<ListItem> = (start..start + visible_rows)
        .map(|row| {
            let addr = row * MEM_ROW_BYTES;
            let bytes = app.cpu.mem.slice(addr, MEM_ROW_BYTES);
            let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();

            let style = if bytes.iter().any(|b| *b != 0) {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{:05X}: {}", addr, hex.join(" "))).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓/PgUp/PgDn: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
