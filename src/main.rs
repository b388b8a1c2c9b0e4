mod ast;
mod driver;
mod lexer;
mod parser;
mod precedence;

use std::{
    fs::File,
    io::{self, BufReader, Read},
};

use anyhow::{anyhow, Context};
use clap::{App, Arg, ArgMatches};
use driver::Driver;
use lexer::Lexer;
use parser::Parser;
use precedence::PrecedenceTable;

const PROMPT: &str = "ready> ";

fn precedence_table(matches: &ArgMatches) -> anyhow::Result<PrecedenceTable> {
    let mut table = PrecedenceTable::standard();
    if let Some(entries) = matches.values_of("precedence") {
        for entry in entries {
            let (op, precedence) = precedence::parse_entry(entry)
                .with_context(|| format!("bad --precedence value {:?}", entry))?;
            table.insert(op, precedence);
        }
    }
    Ok(table)
}

/// Report every unit on stderr and return how many failed.
fn run<R: Read>(driver: Driver<R>, show_ast: bool) -> usize {
    let mut failures = 0;
    for result in driver {
        match result {
            Ok(unit) => {
                eprintln!("parsed {}", unit.description());
                if show_ast {
                    println!("{:#?}", unit);
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                failures += 1;
            }
        }
    }
    failures
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = App::new("kaleidoscope")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("FILE")
                .help("source file to parse, stdin if omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("expr")
                .short("e")
                .long("expr")
                .takes_value(true)
                .value_name("SOURCE")
                .conflicts_with("FILE")
                .help("parse SOURCE instead of a file"),
        )
        .arg(
            Arg::with_name("precedence")
                .short("p")
                .long("precedence")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("OP=PREC")
                .help("add or override a binary operator precedence"),
        )
        .arg(
            Arg::with_name("show-ast")
                .long("show-ast")
                .help("print each parsed unit"),
        )
        .arg(
            Arg::with_name("no-prompt")
                .long("no-prompt")
                .help("don't print a prompt when reading stdin"),
        )
        .get_matches();

    let table = precedence_table(&matches)?;
    let show_ast = matches.is_present("show-ast");

    let interactive = matches.value_of("expr").is_none()
        && matches.value_of("FILE").is_none()
        && !matches.is_present("no-prompt");

    // every source is read byte by byte through the same lexer
    let input: Box<dyn Read + '_> = match (matches.value_of("expr"), matches.value_of("FILE")) {
        (Some(expr), _) => Box::new(expr.as_bytes()),
        (None, Some(path)) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path))?,
        )),
        (None, None) => Box::new(io::stdin()),
    };

    if interactive {
        eprint!("{}", PROMPT);
    }
    let mut driver = Driver::new(Parser::new(Lexer::new(input), table));
    if interactive {
        driver = driver.with_prompt(|| eprint!("{}", PROMPT));
    }
    let failures = run(driver, show_ast);

    // every failure is recoverable at the prompt
    if failures > 0 && !interactive {
        return Err(anyhow!("{} unit(s) failed to parse", failures));
    }
    Ok(())
}
