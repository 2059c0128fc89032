use anyhow::Context;
use colored::Colorize;
use edgeplane_config::EdgeplaneConfig;
use edgeplane_core::{
    CompilerOptions, PlacementConstraints, RuleTree, RuleTreeCompiler, parse_rules_file_with_format,
};
use std::path::Path;

fn build(config: &EdgeplaneConfig, file: &Path, lenient: bool) -> anyhow::Result<RuleTree> {
    let document = parse_rules_file_with_format(file, &config.rules.format)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let constraints =
        PlacementConstraints::default().with_root_only(config.rules.root_only.iter().cloned());
    let options = CompilerOptions {
        strict: config.rules.strict && !lenient,
    };
    tracing::debug!(
        "Compiling {} (strict: {}, root-only: {:?})",
        file.display(),
        options.strict,
        config.rules.root_only
    );

    let tree = RuleTreeCompiler::new(constraints)
        .with_options(options)
        .compile(&document)?;
    Ok(tree)
}

pub fn compile(
    config: &EdgeplaneConfig,
    file: &Path,
    lenient: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let tree = build(config, file, lenient)?;
    let json = tree.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{} {} ({} rules, format {})",
                "✓ Wrote".green(),
                path.display().to_string().cyan(),
                tree.root.count(),
                tree.rule_format
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

pub fn validate(config: &EdgeplaneConfig, file: &Path) -> anyhow::Result<()> {
    println!("{}", "Validating rule document...".blue());

    let tree = build(config, file, false)?;

    println!("{}", "✓ Rule document is valid".green().bold());
    println!();
    println!("Summary:");
    println!("  Rule format: {}", tree.rule_format.cyan());
    println!("  Rules: {}", tree.root.count());
    for child in &tree.root.children {
        println!("    - {}", child.name.cyan());
    }

    Ok(())
}
