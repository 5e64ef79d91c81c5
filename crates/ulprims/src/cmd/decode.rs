use ulprims_codec::{parse_command, parse_measures, parse_result};

use crate::cmd::{DecodeArgs, PayloadKind};
use crate::exit::{parse_error, CliResult, SUCCESS};
use crate::output::{print_decoded, Decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let decoded = decode(args.kind, &args.payload)?;
    print_decoded(&decoded, format);
    Ok(SUCCESS)
}

fn decode(kind: PayloadKind, payload: &str) -> CliResult<Decoded> {
    let decoded = match kind {
        PayloadKind::Measures => Decoded::Measures {
            device_id: None,
            groups: parse_measures(payload).map_err(|err| parse_error("invalid measures", err))?,
        },
        PayloadKind::Command => Decoded::Command(
            parse_command(payload).map_err(|err| parse_error("invalid command", err))?,
        ),
        PayloadKind::Result => Decoded::Result(
            parse_result(payload).map_err(|err| parse_error("invalid command result", err))?,
        ),
    };
    Ok(decoded)
}
