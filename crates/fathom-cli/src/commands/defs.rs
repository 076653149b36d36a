use std::path::Path;

use fathom_analysis::Project;

/// Run `fathom defs` — list the definitions in one file of a project.
pub fn run(path: &str, file: &str, exported: bool, json: bool) -> i32 {
    let project = match Project::scan_project(Path::new(path)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("fathom defs: {e}");
            return 2;
        }
    };

    let defs = if exported {
        project.get_exported_functions(file)
    } else {
        project.get_definitions(file)
    };

    if defs.is_empty() && !project.has_file(file) {
        eprintln!("fathom defs: no such file in project: {file}");
        return 1;
    }

    if json {
        match serde_json::to_string_pretty(&defs) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("fathom defs: failed to serialize definitions: {e}");
                return 2;
            }
        }
    } else {
        for def in &defs {
            let exported_mark = if def.is_exported { " (exported)" } else { "" };
            println!(
                "{} {} @ {}:{}{}",
                def.symbol_kind, def.symbol_id, def.range.start.row, def.range.start.column,
                exported_mark
            );
        }
    }
    0
}
