#[macro_use]
extern crate log;

mod cli;

use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use cli::{Args, Commands};
use objgraph::*;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

fn load(path: &str) -> Result<HeapSnapshot> {
    let start = Instant::now();
    let heapdump = HeapDump::from_path(path)?;
    let heap = HeapSnapshot::from_heapdump(&heapdump)?;
    let elapsed = start.elapsed();
    info!(
        "Finish deserializing {}, {} objects ({} bytes) in {} ms",
        path,
        heapdump.objects.len(),
        heapdump.total_object_size(),
        elapsed.as_micros() as f64 / 1000f64
    );
    Ok(heap)
}

fn tabulate(header: &str, row: String) {
    println!("============================ Tabulate Statistics ============================");
    println!("{}", header);
    println!("{}", row);
    println!("-------------------------- End Tabulate Statistics --------------------------");
}

fn reified_main(heap: &HeapSnapshot, command: Commands) -> Result<()> {
    let graph = ObjectGraph::new(heap);
    let analyzer = RetainedSizeAnalyzer::new(heap);
    match command {
        Commands::Reachable => {
            let start = Instant::now();
            let reachable = graph.reachable_size();
            let elapsed = start.elapsed();
            if cfg!(debug_assertions) {
                let sanity_traced_objects = sanity_trace(heap);
                info!(
                    "Sanity trace reporting {} reachable objects",
                    sanity_traced_objects
                );
                assert_eq!(sanity_traced_objects, reachable.objects);
            }
            tabulate(
                "objects\tbytes\ttime",
                format!(
                    "{}\t{}\t{}",
                    reachable.objects,
                    reachable.bytes,
                    elapsed.as_micros() as f64 / 1000f64
                ),
            );
        }
        Commands::Retained { object } => {
            let Some(o) = heap.lookup(object) else {
                warn!("No object starts at 0x{:x}", object);
                return Ok(());
            };
            let retention = analyzer.retention_by_instance(o);
            tabulate(
                "object\tclass\tshallow\tretained_objects\tretained_bytes",
                format!(
                    "0x{:x}\t{}\t{}\t{}\t{}",
                    object,
                    heap.class_id_of(o),
                    heap.size_of(o),
                    retention.objects,
                    retention.bytes
                ),
            );
        }
        Commands::RetainedClass { class } => {
            let class_id = ClassId(class);
            let retention = analyzer.retention_by_class(class_id);
            tabulate(
                "class\tretained_objects\tretained_bytes",
                format!("{}\t{}\t{}", class_id, retention.objects, retention.bytes),
            );
        }
        Commands::Top { count } => {
            let start = Instant::now();
            let top = graph.top_retainers(count);
            info!(
                "Computed retained sizes of {} classes in {} ms",
                top.len(),
                start.elapsed().as_micros() as f64 / 1000f64
            );
            println!("class\tinstances\tshallow_bytes\tretained_objects\tretained_bytes");
            for c in top {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    c.usage.class_id,
                    c.usage.instances,
                    c.usage.shallow_bytes,
                    c.retained.objects,
                    c.retained.bytes
                );
            }
        }
        Commands::Path { object } => {
            let Some(o) = heap.lookup(object) else {
                warn!("No object starts at 0x{:x}", object);
                return Ok(());
            };
            match graph.retaining_path(o) {
                Some(path) => {
                    for (depth, o) in path.iter().enumerate() {
                        println!(
                            "{:>4} 0x{:x} class {} ({} bytes)",
                            depth,
                            heap.address_of(*o),
                            heap.class_id_of(*o),
                            heap.size_of(*o)
                        );
                    }
                }
                None => println!("0x{:x} is not reachable from the roots", object),
            }
        }
    }
    Ok(())
}

fn get_git_info() -> String {
    match (built_info::GIT_COMMIT_HASH, built_info::GIT_DIRTY) {
        (Some(hash), Some(dirty)) => format!(
            "{}{}",
            hash.split_at(7).0,
            if dirty { "-dirty" } else { "" }
        ),
        (Some(hash), None) => format!("{}{}", hash.split_at(7).0, "-?"),
        _ => "unknown-git-version".to_string(),
    }
}

pub fn main() -> Result<()> {
    env_logger::init();
    println!("objgraph {} {}", built_info::PKG_VERSION, get_git_info());
    let args = Args::parse();
    for path in &args.paths {
        let heap = load(path)?;
        reified_main(&heap, args.command)?;
    }
    Ok(())
}
