//! Runs a forced pad insertion on a small generated board and prints a JSON
//! report of the result.
//!
//! Usage:
//!   cargo run --bin shove_demo -- [options]
//!
//! Options:
//!   --settings <file>   Load shove settings from a JSON file
//!   --check-only        Only run the check, leave the board untouched
//!
//! Set RUST_LOG=copper_shove=debug to see why a shove fails.

use std::env;

use anyhow::Context;
use copper_shove::board::clearance_violations;
use copper_shove::shove::{calc_from_side, ShoveCheck};
use copper_shove::{
    insert_forced_pad, BoardItem, BoardOutline, ClearanceRule, PointInt, Reserved, RoutingBoard, ShoveDrillResult,
    ShoveSettings, Tile, TileBox,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct ItemReport {
    id: u64,
    kind: &'static str,
    nets: Vec<u32>,
    center: Option<PointInt>,
    corners: Option<Vec<PointInt>>,
}

impl From<&BoardItem> for ItemReport {
    fn from(item: &BoardItem) -> Self {
        Self {
            id: item.id.0,
            kind: item.kind_name(),
            nets: item.nets.clone(),
            center: item.center(),
            corners: item.polyline().map(|p| p.corners().to_vec()),
        }
    }
}

#[derive(Serialize)]
struct Report {
    check: ShoveDrillResult,
    inserted_pad: Option<u64>,
    failure: Option<String>,
    items: Vec<ItemReport>,
    violations: usize,
}

/// Trace crossing the pad area, a via of another net inside it and the
/// trace leaving that via
fn scenario_board(settings: &ShoveSettings) -> anyhow::Result<RoutingBoard> {
    let outline = BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000));
    let mut board = RoutingBoard::new(outline, 2, settings.clearance_matrix(2));
    board.add_trace(vec![PointInt::new(300, 500), PointInt::new(700, 500)], 5, 0, &[2], 1)?;
    board.add_via(PointInt::new(515, 515), 6, (0, 1), &[3], 1)?;
    board.add_trace(vec![PointInt::new(515, 515), PointInt::new(515, 800)], 5, 0, &[3], 1)?;
    Ok(board)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut settings = ShoveSettings {
        max_recursion_depth: 2,
        max_via_recursion_depth: 1,
        clearance_rules: vec![ClearanceRule {
            class_a: 1,
            class_b: 1,
            layer: None,
            value: 3,
        }],
        ..ShoveSettings::default()
    };
    let mut check_only = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" => {
                i += 1;
                let path = args.get(i).context("--settings needs a file name")?;
                settings = ShoveSettings::from_json_file(path)?;
            }
            "--check-only" => check_only = true,
            other => {
                eprintln!("Unknown option: {}", other);
                eprintln!("Usage: {} [--settings <file>] [--check-only]", args[0]);
                return Ok(());
            }
        }
        i += 1;
    }

    let mut board = scenario_board(&settings)?;
    let center = PointInt::new(500, 500);
    let shape = Tile::Box(TileBox::centered(center, 40, 40));
    let from_side = calc_from_side(&board, &shape, center, 0, 10, 1);
    let request = settings.pad_request(shape, 0, &[1], 1).with_from_side(from_side);

    let check_result = ShoveCheck::new(&board).check_forced_pad(&request, settings.budget(), &Reserved::root());
    let check = ShoveDrillResult::from_check(check_result)?;
    eprintln!("[Shove] check: {:?}", check);

    let mut inserted_pad = None;
    let mut failure = None;
    if !check_only && check.is_drillable() {
        match insert_forced_pad(&mut board, &request, &settings) {
            Ok(id) => inserted_pad = Some(id.0),
            Err(err) => failure = Some(err.to_string()),
        }
    }

    let report = Report {
        check,
        inserted_pad,
        failure,
        items: board.items().map(ItemReport::from).collect(),
        violations: clearance_violations(&board).len(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
