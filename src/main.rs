use argh::FromArgs;
use rosh::{Flow, Registry, Script};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(FromArgs)]
/// Run script commands against the built-in call catalog.
///
/// With no arguments, lists the callable commands. Otherwise the arguments
/// are joined into a single command line and executed; an unregistered first
/// word runs as an external program.
struct Cli {
    /// read and execute commands interactively
    #[argh(switch, short = 'i')]
    interactive: bool,

    /// the command line to execute
    #[argh(positional, greedy)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = argh::from_env();
    let mut script = Script::default();

    if cli.interactive {
        repl(&mut script)?;
    } else if cli.command.is_empty() {
        show_usage(script.registry());
    } else {
        script.run(&cli.command.join(" "));
    }
    Ok(())
}

/// List the exported calls, the way the script sees them.
fn show_usage(registry: &Registry) {
    println!("Usage: rosh [command]:");
    let mut found = false;
    let mut exported: Vec<_> = registry.calls().filter(|c| c.exported()).collect();
    exported.sort_by_key(|c| c.name().to_string());
    for call in exported {
        println!("    {} {}", call.name(), call.params());
        found = true;
    }
    if !found {
        println!("    No targets found!");
    }
}

/// Read-eval-print loop over the same engine, one command line at a time.
///
/// Failures are reported and the loop keeps going; variables and the
/// directory stack persist between lines.
fn repl(script: &mut Script) -> rustyline::Result<()> {
    script.set_failure_handler(|err| {
        eprintln!("FAIL: {err}");
        Flow::Continue
    });

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("rosh$ ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                script.run(&line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
    Ok(())
}
