//! rillc CLI - the Rill compiler driver

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use rillc::errors::print_error;
use rillc::{IrCollector, Parser, Preprocessor, SourceMap, VmAssembler, analyze};

/// Preprocess a file into a flattened source map
fn load_file(filename: &str) -> Result<SourceMap, String> {
    let mut preprocessor = Preprocessor::new();
    preprocessor
        .process(Path::new(filename))
        .map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("rillc - Rill compiler");
        println!("Version {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: rillc <command> [options]");
        println!();
        println!("Commands:");
        println!("  parse <file>                Parse and dump the translation unit");
        println!("  check <file>                Run semantic analysis");
        println!("  compile <file> [-o <out>]   Compile to stack-VM assembly");
        println!();
        return ExitCode::SUCCESS;
    }

    let command = &args[1];

    match command.as_str() {
        "parse" => {
            if args.len() < 3 {
                eprintln!("Error: missing file argument");
                return ExitCode::FAILURE;
            }

            let filename = &args[2];
            let map = match load_file(filename) {
                Ok(map) => map,
                Err(message) => {
                    eprintln!("Error in '{}': {}", filename, message);
                    return ExitCode::FAILURE;
                }
            };

            match Parser::new(map.text()).parse() {
                Ok(unit) => {
                    println!("Parsed {} functions:", unit.functions.len());
                    for function in &unit.functions {
                        println!(
                            "  def {} ({} params) -> {}",
                            function.name,
                            function.params.len(),
                            function.return_type
                        );
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_error(map.text(), filename, &e);
                    ExitCode::FAILURE
                }
            }
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Error: missing file argument");
                return ExitCode::FAILURE;
            }

            let filename = &args[2];
            let map = match load_file(filename) {
                Ok(map) => map,
                Err(message) => {
                    eprintln!("Error in '{}': {}", filename, message);
                    return ExitCode::FAILURE;
                }
            };

            let unit = match Parser::new(map.text()).parse() {
                Ok(unit) => unit,
                Err(e) => {
                    print_error(map.text(), filename, &e);
                    return ExitCode::FAILURE;
                }
            };

            let mut collector = IrCollector::new();
            match analyze(unit, &map, &mut collector) {
                Ok(()) => {
                    let functions = collector.functions();
                    println!("OK: {} functions analyzed", functions.len());
                    for function in functions {
                        println!(
                            "  {} -> {} ({} instructions, frame {} bytes)",
                            function.name,
                            function.return_type,
                            function.body.len(),
                            function.frame.size
                        );
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_error(map.text(), filename, &e);
                    ExitCode::FAILURE
                }
            }
        }
        "compile" => {
            if args.len() < 3 {
                eprintln!("Error: missing file argument");
                return ExitCode::FAILURE;
            }

            let filename = &args[2];

            let mut output = None;
            let mut i = 3;
            while i < args.len() {
                match args[i].as_str() {
                    "-o" | "--output" => {
                        if i + 1 < args.len() {
                            output = Some(args[i + 1].clone());
                            i += 2;
                        } else {
                            eprintln!("Error: -o requires an output path");
                            return ExitCode::FAILURE;
                        }
                    }
                    _ => {
                        eprintln!("Unknown option: {}", args[i]);
                        return ExitCode::FAILURE;
                    }
                }
            }

            let map = match load_file(filename) {
                Ok(map) => map,
                Err(message) => {
                    eprintln!("Error in '{}': {}", filename, message);
                    return ExitCode::FAILURE;
                }
            };

            let unit = match Parser::new(map.text()).parse() {
                Ok(unit) => unit,
                Err(e) => {
                    print_error(map.text(), filename, &e);
                    return ExitCode::FAILURE;
                }
            };

            let mut assembler = VmAssembler::new();
            if let Err(e) = analyze(unit, &map, &mut assembler) {
                print_error(map.text(), filename, &e);
                return ExitCode::FAILURE;
            }

            let listing = match assembler.finish() {
                Ok(listing) => listing,
                Err(e) => {
                    print_error(map.text(), filename, &e);
                    return ExitCode::FAILURE;
                }
            };

            let output_path = output.unwrap_or_else(|| {
                let stem = Path::new(filename)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                format!("{}.asm", stem)
            });

            match fs::write(&output_path, &listing) {
                Ok(_) => {
                    println!("Generated: {} ({} bytes)", output_path, listing.len());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error writing '{}': {}", output_path, e);
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run 'rillc' without arguments for usage information");
            ExitCode::FAILURE
        }
    }
}
