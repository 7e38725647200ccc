use crate::cmd::{open_device, ApnArgs, ConnectionArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ApnArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let device = open_device(connection)?;

    if let Some(name) = &args.set {
        device
            .set_apn(name)
            .map_err(|err| device_error("set APN failed", err))?;
    }

    let apn = device
        .apn()
        .map_err(|err| device_error("read APN failed", err))?;

    print_record(
        &apn,
        &[
            ("Context", apn.context_id.to_string()),
            ("PDP type", apn.pdp_type.clone()),
            ("APN", apn.name.clone()),
            ("Address", apn.address.clone()),
        ],
        format,
    );
    Ok(SUCCESS)
}
