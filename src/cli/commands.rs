use std::cmp::Ordering;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{ListTreeBuilder, NodeId, RootPolicy, SortFn, Tree, TreeBuilder};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute_to(cli, &mut out)
}

/// Runs the selected command, writing its result to `out`.
pub fn execute_to(cli: &Cli, out: &mut dyn Write) -> CliResult<()> {
    let settings = effective_settings(cli)?;
    match &cli.command {
        Some(Commands::Tree { file, label }) => {
            _tree(&settings, file.as_deref(), label.as_deref(), out)
        }
        Some(Commands::Json {
            file,
            children_field,
            pretty,
        }) => _json(&settings, file.as_deref(), children_field.as_deref(), *pretty, out),
        Some(Commands::Ids { file }) => _ids(&settings, file.as_deref(), out),
        Some(Commands::List {
            file,
            keys,
            sort_by,
        }) => _list(&settings, file.as_deref(), keys, sort_by.as_deref(), out),
        Some(Commands::Children { file, id, keys }) => {
            _children(&settings, file.as_deref(), id.as_deref(), keys, out)
        }
        Some(Commands::Config) => _config(&settings, out),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, out);
            Ok(())
        }
        None => Err(CliError::InvalidArgs("no command given, see --help".into())),
    }
}

/// Loaded settings with command line overrides applied.
pub fn effective_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(pk) = &cli.pk {
        settings.pk = pk.clone();
    }
    if let Some(fk) = &cli.fk {
        settings.fk = fk.clone();
    }
    if cli.last_wins {
        settings.root_policy = RootPolicy::LastWins;
    }
    debug!("effective settings: {:?}", settings);
    Ok(settings)
}

/// Reads a JSON array of records from `file`, or stdin for `None` / `-`.
#[instrument(level = "debug")]
pub fn read_records(file: Option<&Path>) -> CliResult<Vec<Value>> {
    let content = match file {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).map_err(|source| CliError::Input {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| CliError::Input {
                    path: "<stdin>".into(),
                    source,
                })?;
            buf
        }
    };
    let records: Vec<Value> = serde_json::from_str(&content)?;
    debug!("read {} records", records.len());
    Ok(records)
}

fn load_tree(settings: &Settings, file: Option<&Path>) -> CliResult<Tree<Value>> {
    let records = read_records(file)?;
    let tree = ListTreeBuilder::new().build_tree(&settings.builder_config(), records)?;
    Ok(tree)
}

/// Command line ids are numeric when they parse as integers.
pub fn parse_node_id(raw: &str) -> NodeId {
    raw.parse::<i64>()
        .map(NodeId::Num)
        .unwrap_or_else(|_| NodeId::from(raw))
}

/// Sibling order for `list --sort-by`: numbers, then strings, then anything
/// else by its JSON text; records missing the field go last.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::String(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::String(_))) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn write_json(out: &mut dyn Write, value: &impl serde::Serialize, pretty: bool) -> CliResult<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{}", text).map_err(stdout_err)
}

fn stdout_err(source: io::Error) -> CliError {
    CliError::Output(source)
}

fn key_refs(keys: &[String]) -> Option<Vec<&str>> {
    if keys.is_empty() {
        None
    } else {
        Some(keys.iter().map(String::as_str).collect())
    }
}

#[instrument(level = "debug", skip(settings, out))]
fn _tree(
    settings: &Settings,
    file: Option<&Path>,
    label: Option<&str>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let tree = load_tree(settings, file)?;
    let rendered = match label {
        Some(field) => tree.to_labeled_tree(field),
        None => tree.to_tree_string(),
    };
    write!(out, "{}", rendered).map_err(stdout_err)
}

#[instrument(level = "debug", skip(settings, out))]
fn _json(
    settings: &Settings,
    file: Option<&Path>,
    children_field: Option<&str>,
    pretty: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let tree = load_tree(settings, file)?;
    let field = children_field.unwrap_or(&settings.children_field);
    write_json(out, &tree.to_json(field), pretty)
}

#[instrument(level = "debug", skip(settings, out))]
fn _ids(settings: &Settings, file: Option<&Path>, out: &mut dyn Write) -> CliResult<()> {
    let tree = load_tree(settings, file)?;
    for id in tree.to_list_id() {
        writeln!(out, "{}", id).map_err(stdout_err)?;
    }
    Ok(())
}

#[instrument(level = "debug", skip(settings, out))]
fn _list(
    settings: &Settings,
    file: Option<&Path>,
    keys: &[String],
    sort_by: Option<&str>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let tree = load_tree(settings, file)?;
    let keys = key_refs(keys);
    let list = match sort_by {
        Some(field) => {
            let cmp = |a: &Tree<Value>, b: &Tree<Value>| {
                compare_values(a.data().get(field), b.data().get(field))
            };
            let sort_fn: SortFn<'_, Value> = &cmp;
            tree.to_list(keys.as_deref(), Some(sort_fn))
        }
        None => tree.to_list(keys.as_deref(), None),
    };
    write_json(out, &list, false)
}

#[instrument(level = "debug", skip(settings, out))]
fn _children(
    settings: &Settings,
    file: Option<&Path>,
    id: Option<&str>,
    keys: &[String],
    out: &mut dyn Write,
) -> CliResult<()> {
    let tree = load_tree(settings, file)?;
    let node = match id {
        Some(raw) => {
            let id = parse_node_id(raw);
            tree.find_node(&id)
                .ok_or_else(|| CliError::InvalidArgs(format!("node {} not found", id)))?
        }
        None => tree,
    };
    if node.is_leaf() {
        output::warning(&format!("node {} has no children", node.id()));
    }
    let keys = key_refs(keys);
    write_json(out, &node.get_child_list(keys.as_deref()), false)
}

fn _config(settings: &Settings, out: &mut dyn Write) -> CliResult<()> {
    write_json(out, settings, true)
}
