//! microsim86 - CLI Entry Point
//!
//! Commands:
//! - `microsim86 run <program>` - Run a program until it halts
//! - `microsim86 decode <program>` - Show the microinstructions for each line
//! - `microsim86 debug <program>` - Interactive debugger
//! - `microsim86 serve` - Answer JSON requests on stdin/stdout
//! - `microsim86 report <file>` - Summarize a saved report

use clap::{Parser, Subcommand};
use microsim::{Cpu, Flags, Register};

#[derive(Parser)]
#[command(name = "microsim86")]
#[command(version = "0.1.0")]
#[command(about = "An educational 8086 subset simulator with microinstruction tracing")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the assembly source
        program: String,
        /// Maximum number of instructions to execute (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_steps: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Write a JSON report of the final state to this file
        #[arg(short, long)]
        report: Option<String>,
    },
    /// Show the microinstructions each line lowers to
    Decode {
        /// Path to the assembly source
        program: String,
    },
    /// Interactive debugger
    Debug {
        /// Path to the assembly source
        program: String,
    },
    /// Answer newline-delimited JSON requests on stdin
    Serve {
        /// Maximum instructions per `run` request (default: unbounded)
        #[arg(long)]
        step_budget: Option<u64>,
    },
    /// Summarize a saved report
    Report {
        /// Path to the report file
        file: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_steps, trace, report }) => {
            run_program(&program, max_steps, trace, report.as_deref());
        }
        Some(Commands::Decode { program }) => {
            decode_program(&program);
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Serve { step_budget }) => {
            serve(step_budget);
        }
        Some(Commands::Report { file }) => {
            show_report(&file);
        }
        None => {
            println!("microsim86 v0.1.0");
            println!("An 8086 subset simulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    }
}

fn format_flags(flags: &Flags) -> String {
    flags
        .entries()
        .iter()
        .map(|(name, set)| format!("{}={}", name, u8::from(*set)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_state(cpu: &Cpu) {
    let r = |reg| cpu.regs.get(reg);
    println!("State: {:?}", cpu.state);
    println!(
        "AX={:04X} BX={:04X} CX={:04X} DX={:04X}",
        r(Register::Ax), r(Register::Bx), r(Register::Cx), r(Register::Dx)
    );
    println!(
        "SI={:04X} DI={:04X} SP={:04X} BP={:04X}",
        r(Register::Si), r(Register::Di), r(Register::Sp), r(Register::Bp)
    );
    println!(
        "CS={:04X} DS={:04X} ES={:04X} SS={:04X} IP={:04X}",
        r(Register::Cs), r(Register::Ds), r(Register::Es), r(Register::Ss), cpu.regs.ip()
    );
    println!("{}", format_flags(&cpu.regs.flags));
}

fn run_program(path: &str, max_steps: u64, trace: bool, report: Option<&str>) {
    use microsim::asm::listing::format_line;
    use microsim::{Report, save_report};

    println!("🔧 Running: {}", path);

    let source = read_source(path);
    let mut cpu = Cpu::new();
    cpu.load(&source);

    if cpu.program().is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }
    println!("📝 Loaded {} instructions", cpu.program().len());

    println!();
    println!("━━━ Execution ━━━");

    let mut steps = 0u64;
    let mut fault = None;
    while steps < max_steps {
        let ip = cpu.regs.ip();

        match cpu.step() {
            Ok(true) => {
                if trace {
                    let line = cpu.current_instruction().unwrap_or_default();
                    println!(
                        "{:<24} AX={:04X} BX={:04X} CX={:04X} DX={:04X} ZF={} CF={}",
                        format_line(ip as usize, line),
                        cpu.regs.get(Register::Ax),
                        cpu.regs.get(Register::Bx),
                        cpu.regs.get(Register::Cx),
                        cpu.regs.get(Register::Dx),
                        u8::from(cpu.regs.flags.zf),
                        u8::from(cpu.regs.flags.cf),
                    );
                    for micro in cpu.last_microinstructions() {
                        println!("       -> {}", micro);
                    }
                }
                steps += 1;
            }
            Ok(false) => break,
            Err(e) => {
                eprintln!("❌ CPU error at IP={:03X}: {}", ip, e);
                fault = Some(e);
                break;
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", steps);
    print_state(&cpu);

    if fault.is_none() && !cpu.at_end() {
        println!();
        println!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", max_steps);
    }

    if let Some(out_path) = report {
        let snapshot = Report::capture(&cpu, &source);
        match save_report(out_path, &snapshot) {
            Ok(()) => println!("✓ Saved report to {}", out_path),
            Err(e) => {
                eprintln!("❌ Failed to save report: {}", e);
                std::process::exit(1);
            }
        }
    }

    if fault.is_some() {
        std::process::exit(1);
    }
}

fn decode_program(path: &str) {
    use microsim::{Program, decode_listing};

    println!("📖 Decoding: {}", path);
    println!();

    let program = Program::parse(&read_source(path));
    println!("{}", decode_listing(&program));
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use microsim::tui::run_debugger;

    println!("🔍 Loading: {}", path);
    let source = read_source(path);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(source) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    eprintln!("❌ This build has no debugger; rebuild with the `tui` feature");
    std::process::exit(1);
}

fn serve(step_budget: Option<u64>) {
    use microsim::{Session, SessionConfig};

    let session = Session::new(SessionConfig { step_budget });
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    if let Err(e) = session.serve(stdin.lock(), stdout.lock()) {
        eprintln!("❌ Session error: {}", e);
        std::process::exit(1);
    }
}

fn show_report(path: &str) {
    use microsim::load_report;

    let report = match load_report(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to load report: {}", e);
            std::process::exit(1);
        }
    };

    println!("📂 Report: {}", path);
    println!();
    println!("━━━ Code ━━━");
    println!("{}", report.code.trim_end());
    println!();
    println!("━━━ State after {} steps ━━━", report.steps);

    let state = &report.state;
    let regs = &state.registers;
    println!("Status: {:?}", state.status);
    println!(
        "AX={:04X} BX={:04X} CX={:04X} DX={:04X} SI={:04X} DI={:04X} SP={:04X} BP={:04X} IP={:04X}",
        regs.ax, regs.bx, regs.cx, regs.dx, regs.si, regs.di, regs.sp, regs.bp, regs.ip
    );
    println!("{}", format_flags(&state.flags));
    if let Some(line) = &state.current_instruction {
        println!("Last instruction: {}", line);
        for micro in &state.microinstructions {
            println!("       -> {}", micro);
        }
    }
}
