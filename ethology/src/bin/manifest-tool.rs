//! `manifest-tool <plugin-path>` loads a node plugin and prints each newly
//! registered node's id, category, and port list, one per line.

use std::{env, process::ExitCode};

use ethology::{plugin::load_plugin, xml_loader::Factory};

fn main() -> ExitCode {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("usage: {} <plugin-path>", args.first().map(String::as_str).unwrap_or("manifest-tool"));
        return ExitCode::FAILURE;
    }

    let mut factory = Factory::new();

    let loaded = match load_plugin(&mut factory, &args[1]) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("failed to load plugin [{}]: {e}", args[1]);
            return ExitCode::FAILURE;
        }
    };

    for id in &loaded.registered_ids {
        let manifest = match factory.node_manifest(id) {
            Some(manifest) => manifest,
            None => continue,
        };

        let mut ports: Vec<&String> = manifest.ports.keys().collect();
        ports.sort();

        let port_list = ports.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ");

        println!("{id}\t{}\t[{port_list}]", manifest.node_type);
    }

    ExitCode::SUCCESS
}
