use ulprims_registry::BindingCatalog;

use crate::cmd::BindingsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_bindings, BindingRow, OutputFormat};

pub fn run(_args: BindingsArgs, format: OutputFormat) -> CliResult<i32> {
    print_bindings(&rows(&BindingCatalog::builtin()), format);
    Ok(SUCCESS)
}

fn rows(catalog: &BindingCatalog) -> Vec<BindingRow> {
    catalog
        .names()
        .into_iter()
        .filter_map(|name| catalog.create(name))
        .map(|binding| BindingRow {
            name: binding.name().to_string(),
            events: binding
                .handles()
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
        })
        .collect()
}
