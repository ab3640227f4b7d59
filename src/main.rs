use std::env;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use transitivity::{
    merge, topological_order, EdgeList, MapNavigator, Navigator, Placement, RelationConfig,
    TransitiveRelation,
};

/// Build a transitive relation from stdin and report what reaches what.
#[derive(Parser, Debug)]
#[command(name = "transitivity", version, about)]
struct Cli {
    /// How stdin is read
    #[arg(long, value_enum, default_value_t = Input::Rows)]
    input: Input,

    /// Where brackets of new elements are placed
    #[arg(long, value_enum, default_value_t = PlacementArg::Nested)]
    placement: PlacementArg,

    /// Ask whether SUBJECT reaches OBJECT (repeatable)
    #[arg(long, num_args = 2, value_names = ["SUBJECT", "OBJECT"])]
    query: Vec<String>,

    /// Print the persisted edge list as JSON instead of the report
    #[arg(long)]
    dump: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Input {
    /// JSON objects (array or one per line); keys of each row relate in order
    Rows,
    /// `[subject, object]` pairs (array or one per line)
    Edges,
    /// Output of `--dump`
    Dump,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlacementArg {
    Nested,
    Append,
}

impl From<PlacementArg> for Placement {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::Nested => Placement::Nested,
            PlacementArg::Append => Placement::Append,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRANSITIVITY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("transitivity=warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match env::var("TRANSITIVITY_LOG_FORMAT").as_deref() {
        Ok("json") => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
    }
}

fn keys_in_order(v: Value) -> Result<Vec<String>> {
    match v {
        Value::Object(map) => Ok(map.keys().cloned().collect()),
        other => bail!("row must be a JSON object, got {other}"),
    }
}

fn edge(v: Value) -> Result<(String, String)> {
    match v {
        Value::Array(pair) if pair.len() == 2 => {
            let name = |v: &Value| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Ok((name(&pair[0]), name(&pair[1])))
        }
        other => bail!("edge must be a [subject, object] pair, got {other}"),
    }
}

/// Either one JSON array whose items all satisfy `is_item`, or one value per line.
fn values(s: &str, is_item: fn(&Value) -> bool) -> Result<Vec<Value>> {
    if let Ok(Value::Array(vals)) = serde_json::from_str::<Value>(s) {
        if vals.iter().all(is_item) {
            return Ok(vals);
        }
    }
    s.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| serde_json::from_str(l).with_context(|| format!("invalid JSON on line {}", i + 1)))
        .collect()
}

fn load(input: Input, s: &str, config: RelationConfig) -> Result<TransitiveRelation<String>> {
    match input {
        Input::Rows => {
            let mut relation = TransitiveRelation::with_config(config);
            for row in values(s, Value::is_object)? {
                let keys = keys_in_order(row)?;
                for pair in keys.windows(2) {
                    relation.relate(pair[0].clone(), pair[1].clone())?;
                }
            }
            Ok(relation)
        }
        Input::Edges => {
            let navigator: MapNavigator<String> = values(s, Value::is_array)?
                .into_iter()
                .map(edge)
                .collect::<Result<_>>()?;
            let mut relation = TransitiveRelation::with_config(config);
            merge(&mut relation, &navigator)?;
            Ok(relation)
        }
        Input::Dump => {
            let edges: EdgeList<String> = serde_json::from_str(s).context("invalid edge list")?;
            Ok(TransitiveRelation::from_edge_list_with_config(edges, config)?)
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Read all stdin
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    let config = RelationConfig {
        placement: cli.placement.into(),
        ..RelationConfig::default()
    };
    let relation = load(cli.input, buf.trim(), config)?;

    if cli.dump {
        println!("{}", relation.to_json()?);
        return Ok(());
    }

    match topological_order(&relation.direct()) {
        Ok(order) => println!("Topological order: {order:?}"),
        Err(e) => println!("Topological order: none ({e})"),
    }
    println!("Direct edges:");
    for subject in relation.direct().domain() {
        let objects: Vec<_> = relation.directly_related_with(&subject).into_iter().collect();
        println!("  {subject} -> {objects:?}");
    }
    println!("Reachable:");
    for subject in relation.elements() {
        let reached: Vec<_> = relation
            .elements()
            .filter(|object| *object != subject && relation.are_related(subject, object))
            .collect();
        if !reached.is_empty() {
            println!("  {subject} => {reached:?}");
        }
    }
    if !cli.query.is_empty() {
        println!("Queries:");
        for pair in cli.query.chunks(2) {
            let (subject, object) = (&pair[0], &pair[1]);
            println!("  {subject} -> {object}: {}", relation.are_related(subject, object));
        }
    }
    Ok(())
}
