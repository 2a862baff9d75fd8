//! Command implementations for the Tessera CLI.

use std::sync::Arc;

use log::debug;

use crate::cli::args::{Command, LocateArgs, StartsArgs, TesseraArgs};
use crate::cli::output::{Resolution, StartsReport, output_result};
use crate::composite::config::CompositeViewConfig;
use crate::composite::view::CompositeView;
use crate::decorator::SegmentDecorator;
use crate::error::Result;
use crate::store::memory::store_from_sizes;
use crate::store::traits::PhysicalSegment;

type SegmentView = CompositeView<Arc<dyn PhysicalSegment>>;

/// Execute a CLI command.
pub fn execute_command(args: TesseraArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            debug!("loading view configuration from {}", path.display());
            CompositeViewConfig::from_json_file(path)?
        }
        None => CompositeViewConfig::default(),
    };

    match &args.command {
        Command::Starts(starts_args) => {
            let report = starts_report(starts_args, config)?;
            output_result(&report, &args)
        }
        Command::Locate(locate_args) => {
            let resolutions = locate(locate_args, config)?;
            output_result(&resolutions, &args)
        }
    }
}

fn open_view(sizes: &[u64], config: CompositeViewConfig) -> Result<Arc<SegmentView>> {
    let store = store_from_sizes(sizes);
    SegmentView::open(store, Arc::new(SegmentDecorator), config)
}

/// Build the boundary table for `args.sizes`.
pub fn starts_report(args: &StartsArgs, config: CompositeViewConfig) -> Result<StartsReport> {
    let view = open_view(&args.sizes, config)?;
    let report = StartsReport {
        segments: view.segment_count(),
        total_doc_count: view.total_doc_count(),
        starts: view.starts().to_vec(),
    };
    view.close()?;
    Ok(report)
}

/// Resolve every position of `args` against a view over `args.sizes`.
pub fn locate(args: &LocateArgs, config: CompositeViewConfig) -> Result<Vec<Resolution>> {
    let view = open_view(&args.sizes, config)?;
    let mut resolutions = Vec::with_capacity(args.positions.len());
    for &position in &args.positions {
        let located = view.global_position_to_segment(position);
        resolutions.push(Resolution {
            position,
            segment: located.map(|(segment, _)| segment),
            local: located.map(|(_, local)| local),
            stable_id: view.stable_id_at(position)?,
        });
    }
    view.close()?;
    Ok(resolutions)
}
