//! alva-replay：加载项目文档并回放变更脚本
//!
//! 用法：alva-replay <project.json> <script.jsonl>

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::{env, process};

use alva::replay::{load_project, replay_script};

fn main() {
    let _logging = alva::logging::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: alva-replay <project.json> <script.jsonl>");
        process::exit(2);
    }

    let mut project = match load_project(Path::new(&args[1])) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("alva-replay: {}: {e}", args[1]);
            process::exit(1);
        }
    };

    let script = match File::open(&args[2]) {
        Ok(file) => BufReader::new(file),
        Err(e) => {
            eprintln!("alva-replay: {}: {e}", args[2]);
            process::exit(1);
        }
    };

    match replay_script(&mut project, script) {
        Ok(summary) => {
            println!(
                "replayed {} records, {} commits, {} undos, {} redos ({} undoable)",
                summary.records, summary.commits, summary.undos, summary.redos, summary.history_len
            );
        }
        Err(e) => {
            eprintln!("alva-replay: {}: {e}", args[2]);
            process::exit(1);
        }
    }
}
