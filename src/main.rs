// ===========================================================================
// saxifrage CLI
// ===========================================================================
//
// Thin driver around the library: load a GeoJSON road layer, normalize it
// (multi-part explosion, id assignment, degenerate/duplicate sweep), run the
// simplification pipeline, write the simplified layer back out as GeoJSON.
// ===========================================================================

use ahash::AHashSet;
use anyhow::{Context, Result, bail};
use clap::Parser;
use geo::Coord;
use geojson::{FeatureCollection, GeoJson, Geometry, Value};
use log::warn;
use saxifrage::feature::{AttrBag, AttrValue, FeatId};
use saxifrage::pipeline::{SimplifyConfig, simplify_layer};
use saxifrage::provider::{MemoryLayer, infer_schema};
use saxifrage::snap::DEFAULT_NUMBER_DECIMALS;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input GeoJSON file with LineString / MultiLineString road features.
    input: PathBuf,

    /// Output GeoJSON path for the simplified network.
    output: PathBuf,

    /// Decimal digits kept when snapping coordinates.
    #[arg(long, default_value_t = DEFAULT_NUMBER_DECIMALS)]
    precision: u32,

    /// Build the dual graph over every shared node instead of only
    /// pass-through (degree 2) nodes.
    #[arg(long)]
    all_connections: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut layer = load_geojson(&args.input)?;
    let loaded = layer.features.len();
    println!("Loaded {} line features from {}", loaded, args.input.display());

    let degenerate: AHashSet<FeatId> = layer.find_degenerate().into_iter().collect();
    if !degenerate.is_empty() {
        warn!("dropping {} degenerate features", degenerate.len());
        layer.drop_features(&degenerate);
    }
    let duplicates: AHashSet<FeatId> = layer
        .find_duplicate_geometries(args.precision)?
        .into_iter()
        .collect();
    if !duplicates.is_empty() {
        warn!("dropping {} duplicate geometries", duplicates.len());
        layer.drop_features(&duplicates);
    }

    let config = SimplifyConfig {
        number_decimals: args.precision,
        interior_only: !args.all_connections,
    };
    let mut sink = MemoryLayer::default();
    simplify_layer(&layer, &mut sink, &config)?;

    write_geojson(&args.output, &sink)?;
    println!(
        "Simplified {} features into {}, written to {}",
        layer.features.len(),
        sink.features.len(),
        args.output.display()
    );
    Ok(())
}

fn position_to_coord(position: &[f64]) -> Result<Coord> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => bail!("position with fewer than two ordinates"),
    }
}

fn positions_to_coords(positions: &[Vec<f64>]) -> Result<Vec<Coord>> {
    positions.iter().map(|p| position_to_coord(p)).collect()
}

fn load_geojson(path: &Path) -> Result<MemoryLayer> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: GeoJson = raw.parse().context("parsing GeoJSON")?;
    let GeoJson::FeatureCollection(collection) = parsed else {
        bail!("expected a FeatureCollection of line features");
    };

    let mut layer = MemoryLayer::default();
    for feature in collection.features {
        let attrs: AttrBag = feature
            .properties
            .iter()
            .flatten()
            .map(|(name, value)| (name.clone(), AttrValue::from_json(value)))
            .collect();
        match feature.geometry.map(|g| g.value) {
            Some(Value::LineString(positions)) => {
                layer.add_feature(positions_to_coords(&positions)?, attrs);
            }
            Some(Value::MultiLineString(lines)) => {
                let parts = lines
                    .iter()
                    .map(|part| positions_to_coords(part))
                    .collect::<Result<Vec<_>>>()?;
                layer.add_multipart(parts, attrs);
            }
            Some(_) => warn!("skipping feature with non-line geometry"),
            None => warn!("skipping feature without geometry"),
        }
    }
    layer.schema = infer_schema(&layer.features);
    Ok(layer)
}

fn write_geojson(path: &Path, layer: &MemoryLayer) -> Result<()> {
    let features = layer
        .features
        .iter()
        .map(|f| geojson::Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(
                f.geometry.iter().map(|c| vec![c.x, c.y]).collect(),
            ))),
            id: None,
            properties: Some(
                f.attrs
                    .0
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            foreign_members: None,
        })
        .collect();
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    fs::write(path, GeoJson::from(collection).to_string())
        .with_context(|| format!("writing {}", path.display()))
}
