use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use fathom_analysis::{CallGraphOptions, Project};

/// Run `fathom scan` — analyze a directory and print its call graph.
pub fn run(
    path: &str,
    include: &[String],
    max_depth: Option<u32>,
    external: bool,
    json: bool,
) -> i32 {
    let project = match Project::scan_project(Path::new(path)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("fathom scan: {e}");
            return 2;
        }
    };

    for diagnostic in project.diagnostics() {
        eprintln!("fathom: warning: {diagnostic}");
    }

    let glob_set = match build_glob_set(include) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("fathom scan: invalid --include pattern: {e}");
            return 2;
        }
    };

    let options = CallGraphOptions {
        file_filter: glob_set.map(|set| {
            Box::new(move |file: &str| set.is_match(file))
                as Box<dyn Fn(&str) -> bool + Send + Sync>
        }),
        max_depth,
        include_external: external,
    };
    let graph = project.get_call_graph(&options);

    if json {
        match serde_json::to_string_pretty(&graph) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("fathom scan: failed to serialize call graph: {e}");
                return 2;
            }
        }
    } else {
        println!(
            "{} nodes, {} edges, {} top-level",
            graph.nodes.len(),
            graph.edges.len(),
            graph.top_level_nodes.len()
        );
        for (symbol, node) in &graph.nodes {
            println!("{symbol} ({} calls)", node.calls.len());
            for call in &node.calls {
                println!("  -> {} [{}]", call.symbol, call.kind);
            }
        }
    }
    0
}

fn build_glob_set(include: &[String]) -> Result<Option<GlobSet>, globset::Error> {
    if include.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in include {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}
