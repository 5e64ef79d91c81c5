use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use ulprims_codec::{encode_group, encode_params, CommandInvocation, CommandResult, MeasureGroup};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A decoded UL2.0 payload. JSON keys are camelCase throughout.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Decoded {
    Measures {
        #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
        device_id: Option<String>,
        groups: Vec<MeasureGroup>,
    },
    Command(CommandInvocation),
    Result(CommandResult),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodedOutput<'a> {
    schema_id: &'a str,
    #[serde(flatten)]
    decoded: &'a Decoded,
}

pub fn print_decoded(decoded: &Decoded, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DecodedOutput {
                schema_id: "https://schemas.ulprims.dev/cli/v1/decoded.schema.json",
                decoded,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => println!("{}", decoded_table(decoded)),
        OutputFormat::Pretty => match decoded {
            Decoded::Measures { device_id, groups } => {
                for (index, group) in groups.iter().enumerate() {
                    match device_id {
                        Some(device) => {
                            println!("device={device} group={index} {}", encode_group(group))
                        }
                        None => println!("group={index} {}", encode_group(group)),
                    }
                }
            }
            Decoded::Command(cmd) => println!(
                "device={} command={} params={}",
                cmd.device_id,
                cmd.command,
                encode_params(&cmd.params)
            ),
            Decoded::Result(res) => println!(
                "device={} command={} result={}",
                res.device_id, res.command, res.result
            ),
        },
    }
}

fn decoded_table(decoded: &Decoded) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    match decoded {
        Decoded::Measures { groups, .. } => {
            table.set_header(vec!["GROUP", "KEY", "VALUE"]);
            for (index, group) in groups.iter().enumerate() {
                for (key, value) in group.iter() {
                    table.add_row(vec![index.to_string(), key.to_string(), value.to_string()]);
                }
            }
        }
        Decoded::Command(cmd) => {
            table
                .set_header(vec!["DEVICE", "COMMAND", "PARAMS"])
                .add_row(vec![
                    cmd.device_id.clone(),
                    cmd.command.clone(),
                    encode_params(&cmd.params),
                ]);
        }
        Decoded::Result(res) => {
            table
                .set_header(vec!["DEVICE", "COMMAND", "RESULT"])
                .add_row(vec![
                    res.device_id.clone(),
                    res.command.clone(),
                    res.result.clone(),
                ]);
        }
    }
    table
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadOutput<'a> {
    schema_id: &'a str,
    direction: &'a str,
    device_id: &'a str,
    payload: &'a str,
}

/// Print one wire payload leaving the agent (or produced by `encode`).
pub fn print_payload(direction: &str, device_id: &str, payload: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                schema_id: "https://schemas.ulprims.dev/cli/v1/payload.schema.json",
                direction,
                device_id,
                payload,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DIRECTION", "DEVICE", "PAYLOAD"])
                .add_row(vec![direction, device_id, payload]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{direction} device={device_id} payload={payload}"),
    }
}

#[derive(Serialize)]
pub struct BindingRow {
    pub name: String,
    pub events: Vec<String>,
}

pub fn print_bindings(rows: &[BindingRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "schemaId": "https://schemas.ulprims.dev/cli/v1/bindings.schema.json",
                    "bindings": rows,
                }))
                .unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["BINDING", "EVENTS"]);
            for row in rows {
                table.add_row(vec![row.name.clone(), row.events.join(", ")]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{} events={}", row.name, row.events.join(","));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulprims_codec::parse_measures;

    #[test]
    fn decoded_measures_serialize_with_kind_tag() {
        let decoded = Decoded::Measures {
            device_id: None,
            groups: parse_measures("a=1|b=2#c=3").unwrap(),
        };
        let value = serde_json::to_value(&decoded).unwrap();
        assert_eq!(value["kind"], "measures");
        assert_eq!(value["groups"][1]["c"], "3");
        assert!(value.get("deviceId").is_none());
    }

    #[test]
    fn decoded_command_flattens_fields() {
        let decoded = Decoded::Command(CommandInvocation::new("dev1", "ping"));
        let value = serde_json::to_value(&decoded).unwrap();
        assert_eq!(value["kind"], "command");
        assert_eq!(value["deviceId"], "dev1");
    }

    #[test]
    fn every_record_uses_camel_case_device_key() {
        let measures = Decoded::Measures {
            device_id: Some("dev1".to_string()),
            groups: parse_measures("a=1").unwrap(),
        };
        let result = Decoded::Result(CommandResult {
            device_id: "dev1".to_string(),
            command: "ping".to_string(),
            result: "OK".to_string(),
        });
        for decoded in [&measures, &result] {
            let value = serde_json::to_value(decoded).unwrap();
            assert_eq!(value["deviceId"], "dev1");
            assert!(value.get("device_id").is_none());
        }

        let out = serde_json::to_value(PayloadOutput {
            schema_id: "s",
            direction: "outbound",
            device_id: "dev1",
            payload: "dev1@ping",
        })
        .unwrap();
        assert_eq!(out["deviceId"], "dev1");
        assert_eq!(out["schemaId"], "s");
    }

    #[test]
    fn measures_table_has_one_row_per_reading() {
        let decoded = Decoded::Measures {
            device_id: None,
            groups: parse_measures("a=1|b=2#c=3").unwrap(),
        };
        let rendered = decoded_table(&decoded).to_string();
        assert!(rendered.contains("GROUP"));
        assert_eq!(decoded_table(&decoded).row_iter().count(), 3);
    }
}
