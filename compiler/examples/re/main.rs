use std::fs::File;
use std::io::{self, BufRead, BufReader};

use regexp_compiler::Regex;

const USAGE: &str = "re [--debug] PATTERN [FILE]";

fn main() -> Result<(), String> {
    let (debug, args) = std::env::args()
        .skip(1)
        .fold((false, vec![]), |(debug, mut args), arg| {
            if arg == "--debug" || arg == "-d" {
                (true, args)
            } else {
                args.push(arg);
                (debug, args)
            }
        });

    let (pattern, input) = match args.as_slice() {
        [pattern] => {
            let stdin: Box<dyn BufRead> = Box::new(io::stdin().lock());
            (pattern.as_str(), stdin)
        }
        [pattern, path] => {
            let file = File::open(path).map_err(|e| format!("{}: {}", path, e))?;
            let file: Box<dyn BufRead> = Box::new(BufReader::new(file));
            (pattern.as_str(), file)
        }
        _ => return Err(USAGE.to_string()),
    };

    let re = Regex::new(pattern).map_err(|e| e.to_string())?;

    if let (true, Some(program)) = (debug, re.program()) {
        println!(
            "DEBUG
--------
{}--------
",
            program
        )
    }

    for line in input.split(b'\n') {
        let line = line.map_err(|e| e.to_string())?;
        if re.is_match(&line) {
            println!("{}", String::from_utf8_lossy(&line));
        }
    }

    Ok(())
}
