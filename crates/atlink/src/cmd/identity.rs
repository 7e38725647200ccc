use serde::Serialize;

use crate::cmd::{open_device, ConnectionArgs, IdentityArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct IdentityOutput {
    dialect: String,
    imei: String,
    imsi: String,
    iccid: String,
}

pub fn run(_args: IdentityArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let device = open_device(connection)?;

    let out = IdentityOutput {
        dialect: device.dialect().to_string(),
        imei: device.imei().map_err(|err| device_error("read IMEI failed", err))?,
        imsi: device.imsi().map_err(|err| device_error("read IMSI failed", err))?,
        iccid: device.ccid().map_err(|err| device_error("read ICCID failed", err))?,
    };

    print_record(
        &out,
        &[
            ("Dialect", out.dialect.clone()),
            ("IMEI", out.imei.clone()),
            ("IMSI", out.imsi.clone()),
            ("ICCID", out.iccid.clone()),
        ],
        format,
    );
    Ok(SUCCESS)
}
