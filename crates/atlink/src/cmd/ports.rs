use atlink_transport::list_ports;
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_rows, OutputFormat};

#[derive(Serialize)]
struct PortOutput {
    name: String,
    description: String,
    vid: Option<String>,
    pid: Option<String>,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = list_ports().map_err(|err| transport_error("list ports failed", err))?;

    let out: Vec<PortOutput> = ports
        .into_iter()
        .map(|port| PortOutput {
            name: port.port_name,
            description: port.description,
            vid: port.usb_ids.map(|(vid, _)| format!("{vid:04x}")),
            pid: port.usb_ids.map(|(_, pid)| format!("{pid:04x}")),
        })
        .collect();

    let rows = out
        .iter()
        .map(|port| {
            let usb = match (&port.vid, &port.pid) {
                (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
                _ => "-".to_string(),
            };
            vec![port.name.clone(), port.description.clone(), usb]
        })
        .collect();

    print_rows(&out, &["PORT", "DESCRIPTION", "USB"], rows, format);
    Ok(SUCCESS)
}
