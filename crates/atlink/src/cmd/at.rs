use atlink_modem::ModemError;
use serde::Serialize;

use crate::cmd::{open_device, AtArgs, ConnectionArgs};
use crate::exit::{modem_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, print_rows, OutputFormat};

#[derive(Serialize)]
struct AtOutput<'a> {
    command: &'a str,
    lines: &'a [String],
    status: &'a str,
}

/// Lines are printed even when the module answers with an error token, so
/// the partial response is not lost.
pub fn run(args: AtArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.trim();
    if command.is_empty() {
        return Err(CliError::new(USAGE, "command must not be empty"));
    }

    let device = open_device(connection)?;
    let mut lines = Vec::new();
    let result = device.generic().modem().transact_with(command, |line| {
        lines.push(line.to_string());
        Ok(())
    });

    let status = match &result {
        Ok(()) => "ok".to_string(),
        Err(ModemError::CommandFailed { token, .. }) => token.clone(),
        Err(_) => "failed".to_string(),
    };

    match format {
        OutputFormat::Json => print_json(&AtOutput {
            command,
            lines: &lines,
            status: &status,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            let rows = lines.iter().map(|line| vec![line.clone()]).collect();
            print_rows(&lines, &["RESPONSE"], rows, format);
        }
    }

    result.map_err(|err| modem_error(command, err))?;
    Ok(SUCCESS)
}
