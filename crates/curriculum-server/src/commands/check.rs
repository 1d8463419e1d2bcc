//! Check command - load content once and report consistency problems.

use colored::Colorize;
use curriculum::{CachePolicy, ContentStore};

use crate::cli::ContentArgs;

pub fn run(
    content: ContentArgs,
    json_output: bool,
    strict: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = content.to_config(CachePolicy::Rebuild);
    let store = ContentStore::new(&config)?;
    let graph = store.build();
    let summary = graph.summary();

    if json_output {
        let report = serde_json::json!({
            "content_dir": config.content_dir.display().to_string(),
            "revision": graph.revision(),
            "summary": summary,
            "documents": graph.documents(),
            "dangling_references": graph.dangling_references(),
            "duplicate_ids": graph.duplicates(),
            "is_consistent": graph.is_consistent(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {}",
            "Content check for".cyan().bold(),
            config.content_dir.display().to_string().white()
        );
        println!();
        println!("  Revision:  {}", graph.revision().dimmed());
        println!("  Documents: {}", summary.documents.to_string().white().bold());
        println!("  Domains:   {}", summary.domains);
        println!("  Clusters:  {}", summary.clusters);
        println!("  Concepts:  {}", summary.concepts);
        println!("  Exercises: {}", summary.exercises);
        println!();

        if verbose {
            println!("{}", "Documents".cyan().bold());
            for doc in graph.documents() {
                println!(
                    "  {} ({} records, {} rejected)",
                    doc.name, doc.records, doc.rejected
                );
            }
            println!();
        }

        if summary.rejected_records > 0 {
            println!(
                "{} {} record(s) rejected while loading (see log output)",
                "Warning:".yellow(),
                summary.rejected_records
            );
        }

        if !graph.duplicates().is_empty() {
            println!("{}", "Duplicate ids".yellow().bold());
            for dup in graph.duplicates() {
                println!("  {} '{}' in {}", dup.kind, dup.id, dup.document);
            }
            println!();
        }

        if !graph.dangling_references().is_empty() {
            println!("{}", "Dangling references".yellow().bold());
            for r in graph.dangling_references() {
                println!(
                    "  {} '{}' {} -> {} '{}'",
                    r.source_kind,
                    r.source_id,
                    r.field.dimmed(),
                    r.target_kind,
                    r.target_id.red()
                );
            }
            println!();
        }

        if graph.is_consistent() {
            println!("{}", "No problems found".green().bold());
        }
    }

    if strict && !graph.is_consistent() {
        return Err(format!(
            "{} dangling reference(s), {} duplicate id(s), {} rejected record(s)",
            summary.dangling_references, summary.duplicate_ids, summary.rejected_records
        )
        .into());
    }

    Ok(())
}
