use clap::Parser;
use ortho_viewer::{Cli, ViewerConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ortho_viewer::run(ViewerConfig::default().with_cli(cli))
}
