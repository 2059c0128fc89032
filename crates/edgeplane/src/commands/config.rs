use colored::Colorize;
use edgeplane_config::EdgeplaneConfig;
use std::path::Path;

pub fn show(config: &EdgeplaneConfig, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => println!("# {}", path.display().to_string().cyan()),
        None => println!("# {}", "no config file found, showing defaults".yellow()),
    }
    print!("{}", config.to_yaml()?);
    Ok(())
}
