use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use ortho_viewer::{AdditiveReference, Cli, ViewerConfig};

#[test]
fn defaults_match_the_stock_viewer() {
    let config = ViewerConfig::default();

    assert_eq!(config.asset, PathBuf::from("assets").join("darki006.glb"));
    assert_eq!(config.zoom_factor, 3.0);
    assert_eq!(config.frustum_size, 2.0);
    assert_eq!((config.near, config.far), (0.01, 100.0));
    assert_eq!(config.damping_factor, 0.08);
    assert!(config.enable_pan);
    assert_eq!((config.min_zoom, config.max_zoom), (0.5, 5.0));
    assert_eq!(config.alpha_cutoff, 0.5);
    assert_eq!(config.framing_margin, 1.2);
    assert_eq!(config.ambient_intensity, 3.0);
    assert_eq!(config.additive_reference, AdditiveReference::OwnFirstFrame);
}

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("ortho-viewer").chain(args.iter().copied()))
}

#[test]
fn no_arguments_keep_the_default_asset() {
    let cli = parse(&[]).expect("no arguments are fine");
    let config = ViewerConfig::default().with_cli(cli);
    assert_eq!(config.asset, ViewerConfig::default().asset);
}

#[test]
fn positional_argument_overrides_the_asset() {
    let cli = parse(&["models/fox.gltf"]).expect("one argument is fine");
    let config = ViewerConfig::default().with_cli(cli);
    assert_eq!(config.asset, PathBuf::from("models/fox.gltf"));
}

#[test]
fn extra_arguments_are_rejected() {
    let err = parse(&["a.glb", "b.glb"]).expect_err("two arguments are too many");
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    assert!(err.to_string().contains("b.glb"));
}

#[test]
fn help_and_version_flags_are_not_asset_paths() {
    let help = parse(&["--help"]).expect_err("help short-circuits parsing");
    assert_eq!(help.kind(), ErrorKind::DisplayHelp);

    let version = parse(&["-V"]).expect_err("version short-circuits parsing");
    assert_eq!(version.kind(), ErrorKind::DisplayVersion);

    let unknown = parse(&["--fullscreen"]).expect_err("unknown flags are rejected");
    assert_eq!(unknown.kind(), ErrorKind::UnknownArgument);
}

#[test]
fn paths_starting_with_a_dash_need_a_separator() {
    let cli = parse(&["--", "-scene.glb"]).expect("separator allows dashed paths");
    assert_eq!(cli.asset, Some(PathBuf::from("-scene.glb")));
}
