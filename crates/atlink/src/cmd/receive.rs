use crate::cmd::{open_device, ConnectionArgs, ReceiveArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ReceiveArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let device = open_device(connection)?;

    let data = device
        .receive_udp(args.socket, args.length)
        .map_err(|err| device_error("receive failed", err))?;

    let payload = match std::str::from_utf8(&data.data) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", data.data.len()),
    };
    print_record(
        &data,
        &[
            ("Socket", data.socket.to_string()),
            ("From", format!("{}:{}", data.ip, data.port)),
            ("Length", data.length.to_string()),
            ("Remaining", data.remaining.to_string()),
            ("Payload", payload),
        ],
        format,
    );
    Ok(SUCCESS)
}
