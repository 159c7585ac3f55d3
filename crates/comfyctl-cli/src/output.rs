use atty::Stream;
use color_eyre::Result;
use comfyctl_core::{to_json_response, CommandInfo, CommandStatus, ExecutionOutcome};
use serde_json::Value;

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
    pub dry_run: bool,
}

/// Prints the outcome and returns the process exit code.
pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = outcome.status.exit_code();
    if opts.json {
        let payload = to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }
    if opts.quiet {
        return Ok(code);
    }

    let style = Style::new(opts.no_color, atty::is(Stream::Stdout));
    match outcome.status {
        CommandStatus::Ok if opts.dry_run => {
            println!("{}", style.status(outcome.status, &outcome.message));
            for (index, command) in outcome.commands().iter().enumerate() {
                println!("{}", style.step(index + 1, command));
            }
        }
        CommandStatus::Ok => {}
        CommandStatus::Failure => {
            if let Some(hint) = hint_from_details(&outcome.details) {
                eprintln!("{}", style.info(&format!("Hint: {hint}")));
            }
        }
    }
    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
