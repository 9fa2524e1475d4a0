use clap::{App, Arg, ErrorKind};
use kofta::ast::AstPrinter;
use kofta::{produce_ast, Error, Interpreter, Value};
use std::fs;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// https://rust-cli.github.io/book/in-depth/exit-code.html
const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;
const EX_IOERR: i32 = 74;

fn main() {
    let matches = App::new("kofta")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tree-walking interpreter for the Kofta scripting language")
        .arg(
            Arg::with_name("script")
                .help("Script to run; starts a REPL when omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .help("Print the parsed AST before evaluating"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug tracing"),
        )
        .get_matches_safe()
        .unwrap_or_else(|e| match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => {
                println!("{}", e.message);
                std::process::exit(0);
            }
            _ => {
                eprintln!("{}", e.message);
                std::process::exit(EX_USAGE);
            }
        });

    init_tracing(matches.is_present("verbose"));
    let show_ast = matches.is_present("ast");

    let mut interpreter = match Interpreter::with_natives() {
        Ok(interpreter) => interpreter,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EX_SOFTWARE);
        }
    };

    let code = match matches.value_of("script") {
        Some(file) => run_file(&mut interpreter, file, show_ast),
        None => run_prompt(&mut interpreter, show_ast),
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    if !verbose && std::env::var("RUST_LOG").is_err() {
        return;
    }
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run_file(interpreter: &mut Interpreter, file: &str, show_ast: bool) -> i32 {
    let contents = match fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Could not read {}: {}", file, e);
            return EX_IOERR;
        }
    };
    match run(interpreter, &contents, show_ast) {
        Ok(Value::Null) => 0,
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e) => report(&e),
    }
}

fn run_prompt(interpreter: &mut Interpreter, show_ast: bool) -> i32 {
    println!("Kofta repl v{}", env!("CARGO_PKG_VERSION"));
    let stdin = io::stdin();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return EX_IOERR;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}", e);
                return EX_IOERR;
            }
        }
        if line.contains("exit") {
            return 0;
        }
        match run(interpreter, &line, show_ast) {
            Ok(value) => println!("{}", value),
            Err(e) => {
                report(&e);
            }
        }
    }
}

fn run(interpreter: &mut Interpreter, source: &str, show_ast: bool) -> Result<Value, Error> {
    let program = produce_ast(source)?;
    if show_ast {
        println!("{}", AstPrinter {}.print(&program));
    }
    let global = interpreter.global();
    Ok(interpreter.evaluate(&program, global)?)
}

fn report(e: &Error) -> i32 {
    eprintln!("{}", e);
    match e {
        Error::Syntax(_) => EX_DATAERR,
        Error::Runtime(_) => EX_SOFTWARE,
    }
}
