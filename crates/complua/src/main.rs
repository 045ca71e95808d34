use complua_compiler::eval::Scratch;
use complua_compiler::{compile, Options};
use std::path::PathBuf;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Err(message) = run(&args) {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Cli {
    input: PathBuf,
    output: PathBuf,
    debug: bool,
}

fn parse_cli(args: &[String]) -> Result<Cli, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut debug = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" => {
                if i + 1 >= args.len() {
                    return Err("complua: '-o' needs argument".to_string());
                }
                output = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--debug" => {
                debug = true;
                i += 1;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("complua: unrecognized option '{arg}'\n{}", usage()));
            }
            arg => {
                if input.is_some() {
                    return Err(format!("complua: too many input files\n{}", usage()));
                }
                input = Some(PathBuf::from(arg));
                i += 1;
            }
        }
    }

    let input = input.ok_or_else(usage)?;
    Ok(Cli {
        input,
        output: output.unwrap_or_else(|| PathBuf::from("out.luac")),
        debug,
    })
}

fn usage() -> String {
    "usage: complua [-o <path>] [--debug] <input>".to_string()
}

fn run(args: &[String]) -> Result<(), String> {
    let cli = parse_cli(args)?;

    let source = std::fs::read(&cli.input)
        .map_err(|e| format!("complua: cannot open {}: {e}", cli.input.display()))?;

    let scratch = Scratch::create()
        .map_err(|e| format!("complua: cannot create scratch directory: {e}"))?;

    let opts = Options {
        debug: cli.debug,
        ..Options::default()
    };

    // A failed build leaves the scratch directory behind so the generated
    // programs can be inspected.
    let program = compile(&source, &scratch, &opts).map_err(|e| {
        format!("complua: {}:{}: {}", cli.input.display(), e.line, e.message)
    })?;

    std::fs::write(&cli.output, program)
        .map_err(|e| format!("complua: cannot write {}: {e}", cli.output.display()))?;

    scratch
        .cleanup()
        .map_err(|e| format!("complua: cannot remove scratch directory: {e}"))?;
    Ok(())
}
