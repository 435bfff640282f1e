mod scenario;

use std::borrow::Cow;
use std::collections::HashSet;

use clap::{Parser, ValueEnum};
use depgraph::{DependencyGraph, InvalidFunctionFilter};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Scenario {
    /// Eight nodes of which three are dead weight.
    Pruning,
    /// A node feeding another both directly and through a third.
    Diamond,
    /// Three sources feeding a single root.
    Validity,
}

#[derive(Parser, Debug, Clone)]
struct Args {
    #[clap(value_enum, index = 1, default_value = "pruning")]
    scenario: Scenario,

    /// Function identifiers to treat as no longer valid.
    #[clap(long, short)]
    reject: Vec<String>,

    /// Print the topological order of the final graph.
    #[clap(long)]
    order: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Err(err) = depgraph::logging::init() {
        anyhow::bail!("failed to initialize logging: {err}");
    }

    let graph = match args.scenario {
        Scenario::Pruning => scenario::pruning()?,
        Scenario::Diamond => scenario::diamond()?,
        Scenario::Validity => scenario::validity()?,
    };

    print_graph("Input", &graph);

    let reduced = graph.reduce();
    match &reduced {
        Cow::Borrowed(_) => println!("Reduction: nothing to remove\n"),
        Cow::Owned(reduced) => print_graph("Reduced", reduced),
    }

    if args.reject.is_empty() {
        if args.order {
            print_order(&reduced);
        }
        return Ok(());
    }

    let mut missing = HashSet::new();
    let filter = InvalidFunctionFilter::new(args.reject.iter().cloned());

    match reduced.subgraph(filter, &mut missing) {
        None => println!("Filtered: every node discarded\n"),
        Some(Cow::Borrowed(_)) => println!("Filtered: every node accepted\n"),
        Some(Cow::Owned(filtered)) => {
            print_graph("Filtered", &filtered);
            if args.order {
                print_order(&filtered);
            }
        }
    }

    let mut missing: Vec<_> = missing.iter().map(ToString::to_string).collect();
    missing.sort();
    println!("Missing requirements ({}):", missing.len());
    for requirement in missing {
        println!("  {requirement}");
    }

    Ok(())
}

fn print_graph(title: &str, graph: &DependencyGraph) {
    println!(
        "{title}: {} nodes, {} roots\n{graph}",
        graph.size(),
        graph.root_count()
    );
}

fn print_order(graph: &DependencyGraph) {
    let order: Vec<_> = graph
        .topological_nodes()
        .map(|(_, node)| node.function_id())
        .collect();
    println!("Order: {}\n", order.join(" -> "));
}
