use serde::Serialize;
use tracing::warn;

use crate::cmd::{open_device, ConnectionArgs, SendArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct SendOutput {
    socket: u32,
    address: String,
    port: u16,
    bytes_sent: usize,
}

pub fn run(args: SendArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let mut device = open_device(connection)?;

    let socket = device
        .create_udp_socket(args.local_port)
        .map_err(|err| device_error("open socket failed", err))?;

    let sent = device.send_udp(socket, args.address, args.port, args.data.as_bytes());
    if let Err(err) = device.close_udp_socket(socket) {
        warn!(socket, error = %err, "failed to close socket");
    }
    let bytes_sent = sent.map_err(|err| device_error("send failed", err))?;

    let out = SendOutput {
        socket,
        address: args.address.to_string(),
        port: args.port,
        bytes_sent,
    };
    print_record(
        &out,
        &[
            ("Socket", out.socket.to_string()),
            ("Destination", format!("{}:{}", out.address, out.port)),
            ("Bytes sent", out.bytes_sent.to_string()),
        ],
        format,
    );
    Ok(SUCCESS)
}
