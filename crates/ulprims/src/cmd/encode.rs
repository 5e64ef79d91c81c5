use ulprims_codec::{contains_separator, encode_command, encode_result, CommandInvocation, CommandResult};

use crate::cmd::{EncodeArgs, EncodeTarget};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (device, payload) = encode(args.target);
    print_payload("encoded", &device, &payload, format);
    Ok(SUCCESS)
}

fn encode(target: EncodeTarget) -> (String, String) {
    match target {
        EncodeTarget::Command {
            device,
            command,
            params,
        } => {
            let mut invocation = CommandInvocation::new(device, command);
            for (key, value) in params {
                invocation = invocation.with_param(key, value);
            }
            warn_on_separators(
                [invocation.device_id.as_str(), invocation.command.as_str()]
                    .into_iter()
                    .chain(invocation.params.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()])),
            );
            let payload = encode_command(&invocation);
            (invocation.device_id, payload)
        }
        EncodeTarget::Result {
            device,
            command,
            result,
        } => {
            let result = CommandResult {
                device_id: device,
                command,
                result,
            };
            warn_on_separators([
                result.device_id.as_str(),
                result.command.as_str(),
                result.result.as_str(),
            ]);
            let payload = encode_result(&result);
            (result.device_id, payload)
        }
    }
}

// UL2.0 has no escaping; a separator inside a field changes the payload's meaning.
fn warn_on_separators<'a>(fields: impl IntoIterator<Item = &'a str>) {
    for field in fields {
        if contains_separator(field) {
            tracing::warn!(field, "field contains a reserved separator; payload will not round-trip");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_command_with_sorted_params() {
        let (device, payload) = encode(EncodeTarget::Command {
            device: "dev1".to_string(),
            command: "move".to_string(),
            params: vec![
                ("y".to_string(), "2".to_string()),
                ("x".to_string(), "1".to_string()),
            ],
        });
        assert_eq!(device, "dev1");
        assert_eq!(payload, "dev1@move|x=1|y=2");
    }

    #[test]
    fn encodes_result() {
        let (_, payload) = encode(EncodeTarget::Result {
            device: "dev1".to_string(),
            command: "ping".to_string(),
            result: "OK".to_string(),
        });
        assert_eq!(payload, "dev1@ping|OK");
    }
}
