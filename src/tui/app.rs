//! Debugger application state and logic.

use crate::asm::listing::format_line;
use crate::Cpu;
use std::collections::HashSet;

/// Bytes shown per memory row.
pub const MEM_ROW_BYTES: usize = 16;

/// Highest memory row the view scrolls to (first 64 KiB).
pub const MEM_MAX_ROW: usize = 0x1_0000 / MEM_ROW_BYTES - 1;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Program source, reloaded on reset.
    pub source: String,
    /// Breakpoints (by instruction index).
    pub breakpoints: HashSet<u32>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(source: String) -> Self {
        let mut cpu = Cpu::new();
        cpu.load(&source);

        Self {
            cpu,
            source,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        let ip = self.cpu.regs.ip();
        match self.cpu.step() {
            Ok(true) => {
                let line = self.cpu.current_instruction().unwrap_or_default();
                self.status = format_line(ip as usize, line);
            }
            Ok(false) => {
                self.status = format!("Halted after {} steps", self.cpu.steps);
                self.running = false;
            }
            Err(e) => {
                self.status = format!("Error at IP={:03X}: {}", ip, e);
                self.running = false;
            }
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Pause continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.cpu.stop();
        self.status = "Paused.".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if self.cpu.is_halted() {
            self.running = false;
            self.status = format!("Halted after {} steps", self.cpu.steps);
            return;
        }

        // Check for breakpoint
        let ip = self.cpu.regs.ip();
        if self.breakpoints.contains(&ip) {
            self.running = false;
            self.status = format!("Breakpoint at IP={:03X}", ip);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current IP.
    pub fn toggle_breakpoint(&mut self) {
        let ip = self.cpu.regs.ip();
        if self.breakpoints.remove(&ip) {
            self.status = format!("Removed breakpoint at IP={:03X}", ip);
        } else {
            self.breakpoints.insert(ip);
            self.status = format!("Set breakpoint at IP={:03X}", ip);
        }
    }

    /// Reset the machine and reload the program.
    pub fn reset(&mut self) {
        self.cpu.load(&self.source);
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_memory(&mut self, delta: isize) {
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(MEM_MAX_ROW);
    }

    /// Get program lines around the current IP as (index, text, is_current).
    pub fn get_listing(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let program = self.cpu.program();
        let ip = self.cpu.regs.ip() as usize;
        let start = ip.saturating_sub(lines / 2);

        program
            .lines()
            .iter()
            .enumerate()
            .skip(start)
            .take(lines)
            .map(|(index, line)| {
                let labels = program.labels_at(index);
                let text = if labels.is_empty() {
                    line.clone()
                } else {
                    format!("{}: {}", labels.join(", "), line)
                };
                (index, text, index == ip)
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(source: String) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(source);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(-1),
                        KeyCode::Down => app.scroll_memory(1),
                        KeyCode::PageUp => app.scroll_memory(-16),
                        KeyCode::PageDown => app.scroll_memory(16),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
