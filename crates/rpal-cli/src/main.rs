use std::env;
use std::fs;
use std::process;

use rpal_ast::Node;
use rpal_cse::CseMachine;
use rpal_standardizer::standardize;

fn usage() -> ! {
    eprintln!("Usage: myrpal [-ast] [-st] [--dot] <file>");
    eprintln!();
    eprintln!("Interprets an RPAL source file and prints the result.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -ast     Print the abstract syntax tree and stop");
    eprintln!("  -st      Print the standardized tree and stop");
    eprintln!("  --dot    Also write a Graphviz rendering to <file>.dot");
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut print_ast = false;
    let mut print_st = false;
    let mut write_dot = false;
    let mut source_path: Option<String> = None;

    for arg in &args {
        match arg.as_str() {
            "-ast" => print_ast = true,
            "-st" => print_st = true,
            "--dot" => write_dot = true,
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                usage();
            }
            _ => {
                if source_path.is_some() {
                    eprintln!("Only one input file may be given.");
                    usage();
                }
                source_path = Some(arg.clone());
            }
        }
    }

    let Some(source_path) = source_path else {
        usage();
    };

    if print_ast && print_st {
        eprintln!("Error: -ast and -st cannot be used together.");
        process::exit(1);
    }

    // Read source file
    let source = match fs::read_to_string(&source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {}", source_path, e);
            process::exit(1);
        }
    };

    // Lexical analysis
    let tokens = match rpal_lexer::lex(&source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            for error in errors {
                eprintln!("{}: {}", source_path, error);
            }
            process::exit(1);
        }
    };

    // Parsing
    let ast = match rpal_parser::parse(tokens) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("{}: {}", source_path, e);
            process::exit(1);
        }
    };

    // With -st the standardized tree is the selected one for --dot;
    // otherwise (including a plain run) it is the AST, written here
    // before standardization consumes it.
    if write_dot && !print_st {
        write_dot_file(&source_path, &ast);
    }

    if print_ast {
        print!("{}", ast);
        return;
    }

    // Standardization
    let standardized = standardize(ast);
    for diagnostic in &standardized.diagnostics {
        eprintln!("{}: warning: {}", source_path, diagnostic);
    }
    let st = standardized.tree;

    if print_st {
        print!("{}", st);
        if write_dot {
            write_dot_file(&source_path, &st);
        }
        return;
    }

    // Evaluation
    let mut machine = match CseMachine::new(&st) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("{}: {}", source_path, e);
            process::exit(1);
        }
    };
    match machine.evaluate() {
        Ok(result) => {
            println!("Output of the above program is:");
            println!("{}", result);
        }
        Err(e) => {
            eprintln!("{}: {}", source_path, e);
            process::exit(1);
        }
    }
}

fn write_dot_file(source_path: &str, tree: &Node) {
    let dot_path = format!("{}.dot", source_path);
    if let Err(e) = fs::write(&dot_path, tree.to_dot()) {
        eprintln!("Error writing '{}': {}", dot_path, e);
        process::exit(1);
    }
    eprintln!("DOT written to: {}", dot_path);
}
