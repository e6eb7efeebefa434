//! APEX 6502 user-mode emulator.
//!
//! Loads an APEX executable (SAV, BIN, or raw binary), wires the standard
//! device complement (console on units 0/1, printer on 2, byte file on 3,
//! null on 7), and runs the program to completion.
//!
//! Exit codes: 0 for a normal program exit through an APEX vector, 1 for
//! argument or load errors, 3 when the CPU or the personality halts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use cpu_6502::{InstructionSet, Sets};
use machine_apex::{
    ApexMachine, CharacterDevice, Console, ExecutableFormat, FileByte, Halt, NullDevice,
    Printer, MEMORY_SIZE,
};

// Raw binaries have no header to carry these.
const RAW_LOAD_ADDRESS: u16 = 0x0000;
const RAW_EXECUTION_ADDRESS: u16 = 0x0400;

#[derive(Parser, Debug)]
#[command(name = "apex-runner", version, about = "APEX 6502 user-mode emulator")]
struct Args {
    /// Emulate a CMOS R65C02 instead of the NMOS 6502
    #[arg(short, long)]
    cmos: bool,

    /// Executable is in APEX BIN (ASCII hex) format
    #[arg(short, long, conflicts_with = "raw")]
    bin: bool,

    /// Executable is a raw binary image
    #[arg(short, long)]
    raw: bool,

    /// Input file for the byte file device
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for the byte file device
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Printer output file
    #[arg(short, long)]
    printer: Option<PathBuf>,

    /// Print execution statistics on exit
    #[arg(short, long)]
    stats: bool,

    /// Trace execution
    #[arg(long)]
    trace: bool,

    /// Trace memory writes
    #[arg(long)]
    memtrace: bool,

    /// Dump memory to a file on exit
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,

    /// Print the opcode matrix
    #[arg(long)]
    hextable: bool,

    /// Print the opcode matrix with addressing-mode and cycle detail
    #[arg(long)]
    hextabledetail: bool,

    /// Print the per-mnemonic summary table
    #[arg(long)]
    summarytable: bool,

    /// Executable to run
    executable: PathBuf,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // clap's own exit code is 2; the contract here is 1
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    env_logger::init();

    match run(&args) {
        Ok(halt) => {
            if halt.is_normal_exit() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(3)
            }
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<Halt, String> {
    let sets = if args.cmos {
        Sets::CPU_R65C02
    } else {
        Sets::CPU_6502
    };

    if args.hextable || args.hextabledetail {
        let instruction_set = InstructionSet::new(sets).map_err(|e| e.to_string())?;
        println!("{}\n", instruction_set.opcode_matrix(args.hextabledetail));
    }
    if args.summarytable {
        let instruction_set = InstructionSet::new(sets).map_err(|e| e.to_string())?;
        println!("{}\n", instruction_set.summary_table());
    }

    let mut machine = ApexMachine::new(sets).map_err(|e| e.to_string())?;

    machine.install_character_device(7, CharacterDevice::Null(NullDevice));
    machine.install_character_device(0, CharacterDevice::Console(Console::new()));
    machine.install_character_device(1, CharacterDevice::Console(Console::new()));

    let mut printer = Printer::new();
    if let Some(path) = &args.printer {
        printer
            .open_output_file(path)
            .map_err(|e| format!("couldn't open printer file {}: {e}", path.display()))?;
    }
    machine.install_character_device(2, CharacterDevice::Printer(printer));

    let mut file_device = FileByte::new();
    if let Some(path) = &args.input {
        file_device
            .open_input_file(path, false)
            .map_err(|e| format!("couldn't open input file {}: {e}", path.display()))?;
    }
    if let Some(path) = &args.output {
        file_device
            .open_output_file(path, false)
            .map_err(|e| format!("couldn't open output file {}: {e}", path.display()))?;
    }
    machine.install_character_device(3, CharacterDevice::File(file_device));

    let format = if args.raw {
        ExecutableFormat::RawBinary
    } else if args.bin {
        ExecutableFormat::ApexBin
    } else {
        ExecutableFormat::ApexSav
    };

    machine.init();
    machine
        .load_executable(
            format,
            &args.executable,
            RAW_LOAD_ADDRESS,
            RAW_EXECUTION_ADDRESS,
        )
        .map_err(|e| e.to_string())?;

    machine.cpu.set_trace(args.trace);
    machine.memory.set_trace(args.memtrace);

    let started = Instant::now();
    let halt = machine.run();
    let elapsed = started.elapsed();

    eprintln!("{halt}");
    eprintln!("registers: {}", machine.cpu.regs);

    if let Some(path) = &args.dump {
        machine
            .memory
            .dump_raw_bin(path, 0, MEMORY_SIZE)
            .map_err(|e| e.to_string())?;
    }
    if args.stats {
        let seconds = elapsed.as_secs_f64();
        let instructions = machine.cpu.instruction_count();
        let cycles = machine.cpu.cycle_count();
        eprintln!("elapsed time (s): {seconds}");
        eprintln!("{instructions} instructions executed");
        eprintln!(
            "{:.0} instructions executed per second",
            instructions as f64 / seconds
        );
        eprintln!("{cycles} cycles executed");
        eprintln!("{:.0} cycles executed per second", cycles as f64 / seconds);
        eprintln!(
            "average clocks per instruction: {}",
            cycles as f64 / instructions as f64
        );
    }

    Ok(halt)
}
